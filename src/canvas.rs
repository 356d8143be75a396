use crate::geom::{Affine, Vec2};
use crate::palette::{Rgb, Rgba};

/// Pixel compositing rule applied when a shape lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlendMode {
    Normal,
    Add,
    Multiply,
    Screen,
}

impl BlendMode {
    /// Composite `src` (0..1 channels) at coverage `a` over `dst`.
    pub(crate) fn mix(self, dst: f32, src: f32, a: f32) -> f32 {
        let out = match self {
            BlendMode::Normal => src,
            BlendMode::Add => dst + src,
            BlendMode::Multiply => dst * src,
            BlendMode::Screen => 1.0 - (1.0 - dst) * (1.0 - src),
        };
        let v = match self {
            // Additive light is scaled by alpha rather than cross-faded.
            BlendMode::Add => dst + src * a,
            _ => dst + (out - dst) * a,
        };
        v.clamp(0.0, 1.0)
    }
}

/// Opaque linear RGB surface, one entry per braille sub-pixel.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<[f32; 3]>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![[0.0; 3]; (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn clear(&mut self, c: Rgb) {
        self.px.fill(unit(c));
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> [f32; 3] {
        self.px[self.idx(x, y)]
    }

    fn blend(&mut self, x: u32, y: u32, src: Rgba, mode: BlendMode) {
        let a = src.a / 255.0;
        if a <= 0.0 {
            return;
        }
        let i = self.idx(x, y);
        let d = &mut self.px[i];
        d[0] = mode.mix(d[0], src.r / 255.0, a);
        d[1] = mode.mix(d[1], src.g / 255.0, a);
        d[2] = mode.mix(d[2], src.b / 255.0, a);
    }
}

fn unit(c: Rgb) -> [f32; 3] {
    [c.r as f32 / 255.0, c.g as f32 / 255.0, c.b as f32 / 255.0]
}

/// Immediate-mode drawing on a [`PixelCanvas`] through a transform stack.
///
/// All geometry is given in the current local frame. Each primitive is
/// rasterised by mapping pixel centres back into local space, so rotated and
/// mirrored frames need no special handling.
pub(crate) struct Painter<'a> {
    canvas: &'a mut PixelCanvas,
    xf: Affine,
    mode: BlendMode,
    stack: Vec<(Affine, BlendMode)>,
}

impl<'a> Painter<'a> {
    pub(crate) fn new(canvas: &'a mut PixelCanvas, base: Affine) -> Self {
        Self {
            canvas,
            xf: base,
            mode: BlendMode::Normal,
            stack: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self) {
        self.stack.push((self.xf, self.mode));
    }

    pub(crate) fn pop(&mut self) {
        if let Some((xf, mode)) = self.stack.pop() {
            self.xf = xf;
            self.mode = mode;
        }
    }

    pub(crate) fn transform(&self) -> Affine {
        self.xf
    }

    pub(crate) fn set_transform(&mut self, xf: Affine) {
        self.xf = xf;
    }

    #[cfg(test)]
    pub(crate) fn blend(&self) -> BlendMode {
        self.mode
    }

    pub(crate) fn set_blend(&mut self, mode: BlendMode) {
        self.mode = mode;
    }

    pub(crate) fn translate(&mut self, x: f32, y: f32) {
        self.xf = self.xf.then_translate(x, y);
    }

    pub(crate) fn rotate(&mut self, angle: f32) {
        self.xf = self.xf.then_rotate(angle);
    }

    pub(crate) fn scale(&mut self, sx: f32, sy: f32) {
        self.xf = self.xf.then_scale(sx, sy);
    }

    /// Rasterise a local-space region, asking `shade` for the colour of each
    /// covered pixel centre.
    pub(crate) fn shade<F>(&mut self, min: Vec2, max: Vec2, mut shade: F)
    where
        F: FnMut(Vec2) -> Option<Rgba>,
    {
        let Some(inv) = self.xf.inverse() else {
            return;
        };
        let corners = [
            self.xf.apply(min),
            self.xf.apply(Vec2::new(max.x, min.y)),
            self.xf.apply(Vec2::new(min.x, max.y)),
            self.xf.apply(max),
        ];
        let (mut lo, mut hi) = (corners[0], corners[0]);
        for c in &corners[1..] {
            lo = Vec2::new(lo.x.min(c.x), lo.y.min(c.y));
            hi = Vec2::new(hi.x.max(c.x), hi.y.max(c.y));
        }
        if !(lo.x.is_finite() && lo.y.is_finite() && hi.x.is_finite() && hi.y.is_finite()) {
            return;
        }
        let x0 = lo.x.floor().max(0.0) as i64;
        let y0 = lo.y.floor().max(0.0) as i64;
        let x1 = (hi.x.ceil() as i64).min(self.canvas.w as i64 - 1);
        let y1 = (hi.y.ceil() as i64).min(self.canvas.h as i64 - 1);
        if x1 < x0 || y1 < y0 {
            return;
        }
        let mode = self.mode;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let local = inv.apply(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if let Some(c) = shade(local) {
                    self.canvas.blend(x as u32, y as u32, c, mode);
                }
            }
        }
    }

    /// Half a canvas pixel expressed in local units, so thin strokes never
    /// vanish between pixel centres.
    fn min_half_width(&self) -> f32 {
        let s = self.xf.scale_factor();
        if s <= 1e-6 {
            0.5
        } else {
            0.5 / s
        }
    }

    pub(crate) fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, col: Rgba) {
        let (min, max) = (Vec2::new(x, y), Vec2::new(x + w, y + h));
        self.shade(min, max, |p| {
            (p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y).then_some(col)
        });
    }

    /// Filled circle of diameter `d`.
    pub(crate) fn fill_circle(&mut self, c: Vec2, d: f32, col: Rgba) {
        self.fill_ellipse(c, d, d, col);
    }

    /// Filled ellipse with full width `w` and height `h`.
    pub(crate) fn fill_ellipse(&mut self, c: Vec2, w: f32, h: f32, col: Rgba) {
        let floor = self.min_half_width();
        let rx = (w * 0.5).abs().max(floor);
        let ry = (h * 0.5).abs().max(floor);
        let r = Vec2::new(rx, ry);
        self.shade(c - r, c + r, |p| {
            let dx = (p.x - c.x) / rx;
            let dy = (p.y - c.y) / ry;
            (dx * dx + dy * dy <= 1.0).then_some(col)
        });
    }

    /// Circle outline of diameter `d`.
    pub(crate) fn stroke_circle(&mut self, c: Vec2, d: f32, weight: f32, col: Rgba) {
        let r = d.abs() * 0.5;
        let hw = (weight * 0.5).max(self.min_half_width());
        let ext = Vec2::new(r + hw, r + hw);
        self.shade(c - ext, c + ext, |p| ((p.dist(c) - r).abs() <= hw).then_some(col));
    }

    /// Upper (or any) arc outline between `start` and `stop` radians.
    pub(crate) fn stroke_arc(
        &mut self,
        c: Vec2,
        d: f32,
        start: f32,
        stop: f32,
        weight: f32,
        col: Rgba,
    ) {
        let r = d.abs() * 0.5;
        let hw = (weight * 0.5).max(self.min_half_width());
        let ext = Vec2::new(r + hw, r + hw);
        let span = (stop - start).rem_euclid(std::f32::consts::TAU);
        self.shade(c - ext, c + ext, |p| {
            let v = p - c;
            if (v.len() - r).abs() > hw {
                return None;
            }
            let a = (v.heading() - start).rem_euclid(std::f32::consts::TAU);
            (a <= span).then_some(col)
        });
    }

    pub(crate) fn line(&mut self, a: Vec2, b: Vec2, weight: f32, col: Rgba) {
        self.line_gradient(a, b, weight, col, col);
    }

    /// Thick segment whose colour runs from `ca` at `a` to `cb` at `b`.
    pub(crate) fn line_gradient(&mut self, a: Vec2, b: Vec2, weight: f32, ca: Rgba, cb: Rgba) {
        let hw = (weight * 0.5).max(self.min_half_width());
        let ab = b - a;
        let len2 = ab.dot(ab);
        let min = Vec2::new(a.x.min(b.x) - hw, a.y.min(b.y) - hw);
        let max = Vec2::new(a.x.max(b.x) + hw, a.y.max(b.y) + hw);
        self.shade(min, max, |p| {
            let t = if len2 <= 1e-9 {
                0.0
            } else {
                ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
            };
            if p.dist(a + ab * t) > hw {
                return None;
            }
            Some(mix_rgba(ca, cb, t))
        });
    }

    pub(crate) fn polyline(&mut self, pts: &[Vec2], weight: f32, col: Rgba, closed: bool) {
        for w in pts.windows(2) {
            self.line(w[0], w[1], weight, col);
        }
        if closed && pts.len() > 2 {
            self.line(pts[pts.len() - 1], pts[0], weight, col);
        }
    }

    /// Even-odd filled polygon.
    pub(crate) fn fill_polygon(&mut self, pts: &[Vec2], col: Rgba) {
        if pts.len() < 3 {
            return;
        }
        let mut min = pts[0];
        let mut max = pts[0];
        for p in pts {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        self.shade(min, max, |p| point_in_polygon(p, pts).then_some(col));
    }

    pub(crate) fn fill_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, col: Rgba) {
        self.fill_polygon(&[a, b, c], col);
    }

    pub(crate) fn point(&mut self, p: Vec2, weight: f32, col: Rgba) {
        self.fill_circle(p, weight, col);
    }
}

fn mix_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    Rgba {
        r: a.r + (b.r - a.r) * t,
        g: a.g + (b.g - a.g) * t,
        b: a.b + (b.b - a.b) * t,
        a: a.a + (b.a - a.a) * t,
    }
}

fn point_in_polygon(p: Vec2, pts: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (a, b) = (pts[i], pts[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
