use crate::canvas::PixelCanvas;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Sub-pixels per terminal cell.
pub(crate) const DOTS_X: u32 = 2;
pub(crate) const DOTS_Y: u32 = 4;

const BRAILLE_BASE: u32 = 0x2800;
// Monochrome ink threshold on luminance.
const MONO_INK: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
}

/// Alternate-screen session. Restores the terminal on drop if [`end`] was
/// never reached.
///
/// [`end`]: Terminal::end
pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
    active: bool,
    full_redraw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        log::debug!("terminal {cols}x{rows}");

        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * DOTS_X, rows as u32 * DOTS_Y),
            active: true,
            full_redraw: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        log::info!("terminal resized {}x{} -> {c}x{r}", self.cols, self.rows);
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * DOTS_X, r as u32 * DOTS_Y);
        self.full_redraw = true;
        Ok(true)
    }

    /// Repaint every cell on the next [`present`](Terminal::present).
    pub(crate) fn force_redraw(&mut self) {
        self.full_redraw = true;
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !self.full_redraw && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            log::error!("failed to restore terminal: {e:#}");
        }
    }
}

fn braille(mask: u8) -> char {
    char::from_u32(BRAILLE_BASE + mask as u32).unwrap_or(' ')
}

fn luminance(p: [f32; 3]) -> f32 {
    0.2126 * p[0] + 0.7152 * p[1] + 0.0722 * p[2]
}

fn to_color(sum: [f32; 3], n: u32) -> Color {
    let k = 255.0 / n.max(1) as f32;
    let c = |v: f32| (v * k).round().clamp(0.0, 255.0) as u8;
    Color::Rgb {
        r: c(sum[0]),
        g: c(sum[1]),
        b: c(sum[2]),
    }
}

/// Braille dot bit for sub-pixel `[dx][dy]` of a cell.
const DOT_BITS: [[u8; DOTS_Y as usize]; DOTS_X as usize] =
    [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Fit every 2×4 block of `canvas` into one braille cell of `out`.
///
/// In colour mode the dots brighter than the block's mean luminance become
/// the glyph, drawn in their average colour over the average of the rest.
/// A flat block is a blank cell in its own colour. Without colour the dots
/// above a fixed luminance are drawn white on black.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * DOTS_X;
            let py0 = cy * DOTS_Y;

            let mut dots = [([0.0f32; 3], 0.0f32, 0u8); 8];
            let mut n = 0usize;
            for dy in 0..DOTS_Y {
                for dx in 0..DOTS_X {
                    let (x, y) = (px0 + dx, py0 + dy);
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.get(x, y);
                    dots[n] = (p, luminance(p), DOT_BITS[dx as usize][dy as usize]);
                    n += 1;
                }
            }
            let dots = &dots[..n];

            let cell = if !enable_color {
                let mask = dots
                    .iter()
                    .filter(|d| d.1 > MONO_INK)
                    .fold(0u8, |m, d| m | d.2);
                Cell {
                    ch: braille(mask),
                    fg: Color::White,
                    bg: Color::Black,
                }
            } else {
                let mean = dots.iter().map(|d| d.1).sum::<f32>() / n.max(1) as f32;
                let mut mask = 0u8;
                let (mut ink, mut paper) = ([0.0f32; 3], [0.0f32; 3]);
                let (mut n_ink, mut n_paper) = (0u32, 0u32);
                for (p, l, bit) in dots {
                    let acc = if *l > mean + 1e-4 {
                        mask |= bit;
                        n_ink += 1;
                        &mut ink
                    } else {
                        n_paper += 1;
                        &mut paper
                    };
                    for c in 0..3 {
                        acc[c] += p[c];
                    }
                }
                let bg = to_color(paper, n_paper);
                Cell {
                    ch: braille(mask),
                    fg: if n_ink > 0 { to_color(ink, n_ink) } else { bg },
                    bg,
                }
            };
            out.set(cx as u16, cy as u16, cell);
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 0x01)]
    #[case(0, 3, 0x40)]
    #[case(1, 0, 0x08)]
    #[case(1, 3, 0x80)]
    fn braille_dot_bits(#[case] dx: usize, #[case] dy: usize, #[case] want: u8) {
        assert_eq!(DOT_BITS[dx][dy], want);
    }

    #[test]
    fn all_dots_make_the_full_block() {
        let mask = DOT_BITS.iter().flatten().fold(0u8, |m, b| m | b);
        assert_eq!(mask, 0xFF);
        assert_eq!(braille(0), '\u{2800}');
        assert_eq!(braille(0xFF), '\u{28FF}');
    }

    fn two_cell_canvas() -> PixelCanvas {
        // Left cell: flat blue. Right cell: white left column on dark red.
        let mut c = PixelCanvas::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let i = c.idx(x, y);
                c.px[i] = match x {
                    0 | 1 => [0.0, 0.0, 0.5],
                    2 => [1.0, 1.0, 1.0],
                    _ => [0.4, 0.0, 0.0],
                };
            }
        }
        c
    }

    #[test]
    fn colour_cells_split_bright_dots_from_background() {
        let canvas = two_cell_canvas();
        let mut out = CellBuffer::new(2, 1);
        canvas_to_cells(&canvas, &mut out, true);

        let flat = out.get(0, 0).unwrap();
        assert_eq!(flat.ch, '\u{2800}');
        assert_eq!(flat.bg, Color::Rgb { r: 0, g: 0, b: 128 });

        let split = out.get(1, 0).unwrap();
        assert_eq!(split.ch, braille(0x01 | 0x02 | 0x04 | 0x40));
        assert_eq!(split.fg, Color::Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(split.bg, Color::Rgb { r: 102, g: 0, b: 0 });
    }

    #[test]
    fn monochrome_uses_a_fixed_threshold() {
        let canvas = two_cell_canvas();
        let mut out = CellBuffer::new(2, 1);
        canvas_to_cells(&canvas, &mut out, false);
        assert_eq!(out.get(0, 0).unwrap().ch, '\u{2800}');
        assert_eq!(out.get(1, 0).unwrap().ch, braille(0x47));
        assert_eq!(out.get(1, 0).unwrap().bg, Color::Black);
    }

    #[test]
    fn text_is_clipped_to_the_buffer() {
        let mut buf = CellBuffer::new(4, 2);
        draw_text(&mut buf, 2, 1, "abc", Color::White, Color::Black);
        assert_eq!(buf.get(2, 1).unwrap().ch, 'a');
        assert_eq!(buf.get(3, 1).unwrap().ch, 'b');
        draw_text(&mut buf, 0, 5, "zz", Color::White, Color::Black);
        assert!(buf.cells.iter().all(|c| c.ch != 'z'));
    }
}
