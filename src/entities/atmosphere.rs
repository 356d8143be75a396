//! Full-screen ambience: the water backdrop, light shafts, drifting motes,
//! the vignette and the sandy floor.

use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::{BlendMode, Painter};
use crate::geom::{map_range, Vec2};
use crate::noise::{jitter, Noise};
use crate::palette::Rgb;
use rand::Rng;

pub(crate) const LIGHT_RAY_COUNT: usize = 8;
pub(crate) const PARTICLE_COUNT: usize = 100;
const STREAK_COUNT: usize = 35;
const PARTICLE_WRAP: f32 = 10.0;
const GROUND_HEIGHT: f32 = 100.0;

const SUNLIGHT: Rgb = Rgb::new(255, 255, 220);
const MOTE: Rgb = Rgb::new(255, 248, 220);
const DEEP: Rgb = Rgb::new(0, 0, 20);
const SAND: Rgb = Rgb::new(210, 180, 140);

/// Piecewise-linear lookup through `(position, value)` stops sorted by position.
fn ramp(stops: &[(f32, f32)], t: f32) -> f32 {
    let Some(&(first_t, first_v)) = stops.first() else {
        return 0.0;
    };
    if t <= first_t {
        return first_v;
    }
    for w in stops.windows(2) {
        let ((t0, v0), (t1, v1)) = (w[0], w[1]);
        if t <= t1 {
            return map_range(t, t0, t1, v0, v1);
        }
    }
    stops[stops.len() - 1].1
}

/// Water colour plus the drifting white wash behind everything else.
#[derive(Clone, Debug)]
pub(crate) struct Backdrop {
    pub(crate) visibility: f32,
}

impl Backdrop {
    pub(crate) fn new(visibility: f32) -> Self {
        Self { visibility }
    }

    pub(crate) fn water(&self, frame: f32, noise: &Noise) -> Rgb {
        let t = frame * 0.001;
        let blue = map_range(self.visibility, 0.0, 9.0, 15.0, 40.0)
            + noise.get(t) * 5.0
            + noise.get(t * 0.3) * 10.0;
        Rgb::new(0, 0, blue.round().clamp(0.0, 255.0) as u8)
    }
}

impl Entity for Backdrop {
    fn advance(&mut self, _ctx: &mut FrameCtx<'_>) {}

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let Bounds { w, h } = ctx.bounds;
        let t = ctx.frame * 0.001;

        p.push();
        p.set_blend(BlendMode::Normal);
        p.fill_rect(0.0, 0.0, w, h, self.water(ctx.frame, ctx.noise).opaque());

        p.set_blend(BlendMode::Screen);
        for i in 0..STREAK_COUNT {
            let k = i as f32;
            let y = ctx.noise.get(k * 100.0 + t * 0.5) * h;
            let x = ctx.noise.get(k * 200.0 + t) * w;
            let sw = ctx.noise.get(k * 300.0) * 400.0 + 150.0;
            let sh = ctx.noise.get(k * 400.0) * 120.0 + 30.0;
            let opacity = ctx.noise.get(k * 500.0 + t * 0.3) * 35.0 + 8.0;

            let stops: &[(f32, f32)] = if i % 3 == 0 {
                &[(0.0, 0.0), (0.3, 0.5), (0.5, 1.0), (0.7, 0.5), (1.0, 0.0)]
            } else {
                &[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]
            };
            let (rx, ry) = (sw / 2.0, sh / 2.0);
            p.shade(Vec2::new(x - rx, y - ry), Vec2::new(x + rx, y + ry), |q| {
                let dx = (q.x - x) / rx;
                let dy = (q.y - y) / ry;
                if dx * dx + dy * dy > 1.0 {
                    return None;
                }
                let along = (q.x - (x - rx)) / sw;
                Some(Rgb::WHITE.alpha(opacity * ramp(stops, along)))
            });
        }
        p.pop();
    }
}

/// Slanted shaft of sunlight swaying across the whole height.
#[derive(Clone, Debug)]
pub(crate) struct LightRay {
    x: f32,
    width: f32,
    speed: f32,
    offset: f32,
}

impl LightRay {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        Self {
            x: rng.gen_range(0.0..bounds.w.max(1.0)),
            width: rng.gen_range(30.0..100.0),
            speed: rng.gen_range(0.0001..0.0003),
            offset: rng.gen_range(0.0..1000.0),
        }
    }
}

impl Entity for LightRay {
    fn advance(&mut self, _ctx: &mut FrameCtx<'_>) {}

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let h = ctx.bounds.h;
        let x = self.x + (ctx.frame * self.speed + self.offset).sin() * 50.0;
        let axis = Vec2::new(self.width, h);
        let len2 = axis.dot(axis).max(1e-6);
        let origin = Vec2::new(x, 0.0);
        let peak = 0.03 * 255.0;
        let (min, max) = (origin, Vec2::new(x + self.width, h));
        p.shade(min, max, |q| {
            if q.x < min.x || q.x > max.x || q.y < min.y || q.y > max.y {
                return None;
            }
            let t = ((q - origin).dot(axis) / len2).clamp(0.0, 1.0);
            Some(SUNLIGHT.alpha(ramp(&[(0.0, 0.0), (0.5, peak), (1.0, 0.0)], t)))
        });
    }
}

/// Mote of suspended matter drifting upward.
#[derive(Clone, Debug)]
pub(crate) struct Particle {
    pub(crate) pos: Vec2,
    size: f32,
    speed: Vec2,
    opacity: f32,
}

impl Particle {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        Self {
            pos: Vec2::new(
                rng.gen_range(0.0..bounds.w.max(1.0)),
                rng.gen_range(0.0..bounds.h.max(1.0)),
            ),
            size: rng.gen_range(2.0..6.0),
            speed: Vec2::new(rng.gen_range(-0.2..0.2), rng.gen_range(-0.3..-0.1)),
            opacity: rng.gen_range(100.0..200.0),
        }
    }
}

impl Entity for Particle {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        let Bounds { w, h } = ctx.bounds;
        self.pos += self.speed * ctx.dt;

        if self.pos.y < -PARTICLE_WRAP {
            self.pos.y = h + PARTICLE_WRAP;
            self.pos.x = ctx.rng.gen_range(0.0..w.max(1.0));
        }
        if self.pos.x < -PARTICLE_WRAP {
            self.pos.x = w + PARTICLE_WRAP;
        }
        if self.pos.x > w + PARTICLE_WRAP {
            self.pos.x = -PARTICLE_WRAP;
        }
    }

    fn render(&self, p: &mut Painter<'_>, _ctx: &RenderCtx<'_>) {
        let (c, r, opacity) = (self.pos, self.size, self.opacity);
        let ext = Vec2::new(r, r);
        p.shade(c - ext, c + ext, |q| {
            let d = q.dist(c) / r;
            (d <= 1.0).then(|| MOTE.alpha(opacity * (1.0 - d)))
        });
    }
}

/// Radial darkening toward the corners.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Vignette;

impl Entity for Vignette {
    fn advance(&mut self, _ctx: &mut FrameCtx<'_>) {}

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let Bounds { w, h } = ctx.bounds;
        let centre = Vec2::new(w / 2.0, h / 2.0);
        let radius = (w.max(h) * 1.5 / 2.0).max(1e-3);
        p.push();
        p.set_blend(BlendMode::Multiply);
        p.shade(Vec2::ZERO, Vec2::new(w, h), |q| {
            let t = (q.dist(centre) / radius).min(1.0);
            let a = ramp(&[(0.0, 0.0), (0.7, 0.1), (1.0, 0.3)], t) * 255.0;
            Some(DEEP.alpha(a))
        });
        p.pop();
    }
}

/// Sandy gradient and wave lines along the bottom strip.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SandBed;

impl Entity for SandBed {
    fn advance(&mut self, _ctx: &mut FrameCtx<'_>) {}

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let Bounds { w, h } = ctx.bounds;
        let top = h - GROUND_HEIGHT;
        p.shade(Vec2::new(0.0, top), Vec2::new(w, h), |q| {
            if q.y < top || q.y > h || q.x < 0.0 || q.x > w {
                return None;
            }
            let t = (q.y - top) / GROUND_HEIGHT;
            Some(SAND.alpha(t * 0.3 * 255.0))
        });

        let ink = SUNLIGHT.alpha(30.0);
        // Wave lines keep a per-seed layout instead of re-rolling every frame.
        for i in 0..8u32 {
            let y = h - jitter(ctx.seed, i, 0) * GROUND_HEIGHT;
            let amplitude = 5.0 + jitter(ctx.seed, i, 1) * 10.0;
            let frequency = 0.01 + jitter(ctx.seed, i, 2) * 0.02;
            let mut pts = Vec::with_capacity((w / 10.0).max(0.0) as usize + 1);
            let mut x = 0.0f32;
            while x < w {
                let dy = (x * frequency + ctx.frame * 0.01).sin() * amplitude;
                pts.push(Vec2::new(x, y + dy));
                x += 10.0;
            }
            p.polyline(&pts, 1.0, ink, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;
    use crate::entities::testing::Harness;
    use crate::geom::Affine;
    use rstest::rstest;

    #[rstest]
    #[case(-1.0, 0.0)]
    #[case(0.25, 0.5)]
    #[case(0.5, 1.0)]
    #[case(0.75, 0.5)]
    #[case(2.0, 0.0)]
    fn ramp_interpolates_stops(#[case] t: f32, #[case] want: f32) {
        let stops = [(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)];
        assert!((ramp(&stops, t) - want).abs() < 1e-6);
    }

    #[test]
    fn particles_stay_within_wrap_bounds() {
        let mut h = Harness::new(17);
        let mut motes: Vec<_> = (0..PARTICLE_COUNT)
            .map(|_| Particle::new(&mut h.rng, h.bounds))
            .collect();
        for _ in 0..6000 {
            for m in &mut motes {
                h.step(m);
                assert!(m.pos.x >= -PARTICLE_WRAP && m.pos.x <= h.bounds.w + PARTICLE_WRAP);
                assert!(m.pos.y >= -PARTICLE_WRAP && m.pos.y <= h.bounds.h + PARTICLE_WRAP);
            }
        }
    }

    #[test]
    fn brighter_visibility_means_lighter_water() {
        let noise = Noise::new(1);
        let dim = Backdrop::new(0.0).water(10.0, &noise);
        let bright = Backdrop::new(9.0).water(10.0, &noise);
        assert!(bright.b > dim.b);
        assert_eq!((dim.r, dim.g), (0, 0));
    }

    fn sand_pixels(seed: u32) -> Vec<[f32; 3]> {
        let mut canvas = PixelCanvas::new(200, 160);
        let noise = Noise::new(0);
        let ctx = RenderCtx {
            frame: 0.0,
            bounds: Bounds::new(200.0, 160.0),
            noise: &noise,
            seed,
        };
        SandBed.render(&mut Painter::new(&mut canvas, Affine::IDENTITY), &ctx);
        canvas.px
    }

    #[test]
    fn sand_waves_follow_the_seed() {
        assert_eq!(sand_pixels(5), sand_pixels(5));
        assert_ne!(sand_pixels(5), sand_pixels(6));
    }

    #[test]
    fn vignette_darkens_corners_more_than_centre() {
        let mut canvas = PixelCanvas::new(60, 40);
        canvas.clear(Rgb::WHITE);
        let noise = Noise::new(0);
        let ctx = RenderCtx {
            frame: 0.0,
            bounds: Bounds::new(60.0, 40.0),
            noise: &noise,
            seed: 0,
        };
        Vignette.render(&mut Painter::new(&mut canvas, Affine::IDENTITY), &ctx);
        assert!(canvas.get(0, 0)[0] < canvas.get(30, 20)[0]);
    }
}
