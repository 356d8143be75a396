use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::{map_range, Vec2};
use crate::palette::{self, Rgb, Rgba};
use rand::Rng;
use std::f32::consts::TAU;

pub(crate) const TILE_SIZE: f32 = 180.0;
pub(crate) const TILE_OVERLAP: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Motif {
    Spiral,
    Squares,
    Circles,
    Triangles,
}

/// One overlapping background tile. Colours start fully transparent and are
/// assigned by [`MosaicTile::recolor`].
#[derive(Clone, Debug)]
pub(crate) struct MosaicTile {
    pos: Vec2,
    motif: Motif,
    pub(crate) main: Rgba,
    pub(crate) accent: Rgba,
    rotation: f32,
    size: f32,
    offset: f32,
}

impl MosaicTile {
    fn new<R: Rng + ?Sized>(rng: &mut R, pos: Vec2) -> Self {
        let motif = if rng.gen::<f32>() < 0.1 {
            Motif::Spiral
        } else {
            match rng.gen_range(1..4) {
                1 => Motif::Squares,
                2 => Motif::Circles,
                _ => Motif::Triangles,
            }
        };
        Self {
            pos,
            motif,
            main: Rgb::BLACK.alpha(0.0),
            accent: Rgb::BLACK.alpha(0.0),
            rotation: rng.gen_range(0.0..TAU),
            size: TILE_SIZE * 1.5,
            offset: rng.gen_range(0.0..1000.0),
        }
    }

    /// Cover `bounds` with a one-tile apron on every side.
    pub(crate) fn grid<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Vec<MosaicTile> {
        let step = TILE_SIZE * (1.0 - TILE_OVERLAP);
        let cols = (bounds.w / step).ceil() as i32 + 2;
        let rows = (bounds.h / step).ceil() as i32 + 2;
        let mut tiles = Vec::with_capacity(((cols + 1) * (rows + 1)).max(0) as usize);
        for y in -1..rows {
            for x in -1..cols {
                tiles.push(MosaicTile::new(rng, Vec2::new(x as f32 * step, y as f32 * step)));
            }
        }
        tiles
    }

    /// Draw fresh palette colours at the opacity for visibility `level` (0..=9).
    pub(crate) fn recolor<R: Rng + ?Sized>(&mut self, rng: &mut R, level: f32) {
        let main_alpha = map_range(level, 0.0, 9.0, 0.0, 255.0);
        let accent_alpha = map_range(level, 0.0, 9.0, 0.0, 200.0);

        let base = palette::gold(rng);
        let blue_shift = rng.gen_range(-10.0..20.0);
        self.main = tint_blue(base, blue_shift).alpha(main_alpha);

        let base = palette::accent(rng);
        let blue_depth = rng.gen_range(-5.0..15.0);
        self.accent = tint_blue(base, blue_depth).alpha(accent_alpha);
    }

    fn draw_spiral(&self, p: &mut Painter<'_>) {
        let steps = 8;
        let angle_step = TAU / steps as f32;
        let radius_step = self.size / (3.0 * steps as f32);
        let pts: Vec<Vec2> = (0..=steps * 4)
            .map(|i| Vec2::from_angle(i as f32 * angle_step) * (i as f32 * radius_step))
            .collect();
        p.polyline(&pts, 2.0, self.main, false);
    }

    fn draw_squares(&self, p: &mut Painter<'_>) {
        for i in (1..=3).rev() {
            let half = self.size * i as f32 / 6.0;
            let corners = [
                Vec2::new(-half, -half),
                Vec2::new(half, -half),
                Vec2::new(half, half),
                Vec2::new(-half, half),
            ];
            p.polyline(&corners, 2.0, self.main, true);
        }
        let s = self.size;
        p.fill_rect(-s / 8.0, -s / 8.0, s / 4.0, s / 4.0, self.accent);
    }

    fn draw_circles(&self, p: &mut Painter<'_>) {
        for i in (1..=4).rev() {
            let d = self.size * i as f32 / 3.0;
            if i % 2 == 0 {
                p.fill_circle(Vec2::ZERO, d, self.main);
            } else {
                p.stroke_circle(Vec2::ZERO, d, 2.0, self.accent);
            }
        }
        p.fill_circle(Vec2::ZERO, self.size / 6.0, self.accent);
    }

    fn draw_triangles(&self, p: &mut Painter<'_>) {
        let tri = |s: f32| {
            [
                Vec2::new(0.0, -s),
                Vec2::new(s * 0.866, s / 2.0),
                Vec2::new(-s * 0.866, s / 2.0),
            ]
        };
        let [a, b, c] = tri(self.size / 2.0);
        p.fill_triangle(a, b, c, self.main);
        let [a, b, c] = tri(self.size / 4.0);
        p.fill_triangle(a, b, c, self.accent);
    }
}

fn tint_blue(c: Rgb, shift: f32) -> Rgb {
    Rgb {
        b: (c.b as f32 + shift).round().clamp(0.0, 255.0) as u8,
        ..c
    }
}

impl Entity for MosaicTile {
    fn advance(&mut self, _ctx: &mut FrameCtx<'_>) {}

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        if self.main.a <= 0.0 && self.accent.a <= 0.0 {
            return;
        }
        p.push();
        p.translate(self.pos.x, self.pos.y);
        p.rotate(self.rotation);
        let breathe = (ctx.frame * 0.01 + self.offset).sin() * 1.2;
        let k = 1.0 + breathe * 0.01;
        p.scale(k, k);
        match self.motif {
            Motif::Spiral => self.draw_spiral(p),
            Motif::Squares => self.draw_squares(p),
            Motif::Circles => self.draw_circles(p),
            Motif::Triangles => self.draw_triangles(p),
        }
        p.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    #[test]
    fn grid_overhangs_every_edge() {
        let mut rng = StdRng::seed_from_u64(4);
        let bounds = Bounds::new(1080.0, 540.0);
        let tiles = MosaicTile::grid(&mut rng, bounds);
        let step = TILE_SIZE * (1.0 - TILE_OVERLAP);
        // ceil(1080/108)+2 = 12 columns, ceil(540/108)+2 = 7 rows, both from -1.
        assert_eq!(tiles.len(), 13 * 8);
        assert_eq!(tiles[0].pos, Vec2::new(-step, -step));
        let last = tiles[tiles.len() - 1].pos;
        assert!(last.x >= bounds.w && last.y >= bounds.h);
    }

    #[test]
    fn tiles_start_invisible() {
        let mut rng = StdRng::seed_from_u64(4);
        let tiles = MosaicTile::grid(&mut rng, Bounds::new(200.0, 200.0));
        assert!(tiles.iter().all(|t| t.main.a == 0.0 && t.accent.a == 0.0));
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(9.0, 255.0, 200.0)]
    #[case(4.5, 127.5, 100.0)]
    fn recolor_sets_opacity(#[case] level: f32, #[case] main: f32, #[case] accent: f32) {
        let mut rng = StdRng::seed_from_u64(10);
        let mut t = MosaicTile::new(&mut rng, Vec2::ZERO);
        t.recolor(&mut rng, level);
        assert!((t.main.a - main).abs() < 1e-3);
        assert!((t.accent.a - accent).abs() < 1e-3);
    }

    #[test]
    fn blue_tint_saturates() {
        assert_eq!(tint_blue(Rgb::new(1, 2, 250), 20.0), Rgb::new(1, 2, 255));
        assert_eq!(tint_blue(Rgb::new(1, 2, 3), -10.0), Rgb::new(1, 2, 0));
    }
}
