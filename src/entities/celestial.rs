use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::Vec2;
use crate::noise::jitter;
use crate::palette::{Rgb, Rgba};
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const SIZE: f32 = 80.0;
const TAIL_SPEED: f32 = 0.03;

/// Fixed anchor in the top-right corner.
pub(crate) fn anchor(bounds: Bounds) -> Vec2 {
    Vec2::new(bounds.w * 0.95, bounds.h * 0.08)
}

/// The sun-fish (AM) or moon-fish (PM) in the corner of the sky.
#[derive(Clone, Debug)]
pub(crate) struct CelestialBody {
    pub(crate) is_day: bool,
    rotation_speed: f32,
    tail_angle: f32,
    main: Rgb,
    accent: Rgb,
    ray: Rgba,
    fin: Rgb,
    glow: Rgb,
}

impl CelestialBody {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, is_day: bool) -> Self {
        let rotation_speed = rng.gen_range(0.001..0.002);
        let (main, accent, ray, fin, glow) = if is_day {
            (
                Rgb::from_hsb(45.0, 80.0, 95.0),
                Rgb::from_hsb(30.0, 90.0, 100.0),
                Rgb::from_hsb(45.0, 70.0, 100.0).alpha(150.0),
                Rgb::from_hsb(40.0, 85.0, 95.0),
                Rgb::new(255, 200, 100),
            )
        } else {
            (
                Rgb::from_hsb(230.0, 30.0, 35.0),
                Rgb::from_hsb(220.0, 40.0, 25.0),
                Rgb::from_hsb(200.0, 30.0, 40.0).alpha(100.0),
                Rgb::from_hsb(210.0, 35.0, 30.0),
                Rgb::new(200, 220, 255),
            )
        };
        Self {
            is_day,
            rotation_speed,
            tail_angle: 0.0,
            main,
            accent,
            ray,
            fin,
            glow,
        }
    }

    fn draw_rays(&self, p: &mut Painter<'_>, frame: f32) {
        let count = if self.is_day { 12 } else { 8 };
        p.push();
        p.rotate(frame * self.rotation_speed);
        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            let wave = (frame * 0.05 + i as f32).sin();
            let length = SIZE * (1.2 + wave * 0.2);
            let pts: Vec<Vec2> = (0..=10)
                .map(|k| {
                    let t = k as f32 / 10.0;
                    let r = length * (1.0 - t * 0.3);
                    let bend = (t * PI).sin() * 20.0;
                    Vec2::from_angle(angle) * r + Vec2::from_angle(angle + FRAC_PI_2) * bend
                })
                .collect();
            p.polyline(&pts, 2.0 + wave, self.ray, false);
        }
        p.pop();
    }

    fn body_outline(&self) -> Vec<Vec2> {
        (0..32)
            .map(|i| {
                let angle = TAU * i as f32 / 32.0;
                let mut r = SIZE / 2.0;
                if angle > FRAC_PI_2 && angle < 3.0 * FRAC_PI_2 {
                    r *= 0.8 + angle.cos() * 0.2;
                }
                Vec2::from_angle(angle) * r
            })
            .collect()
    }

    fn draw_fin(&self, p: &mut Painter<'_>, at: Vec2, angle: f32, b: Vec2, c: Vec2) {
        p.push();
        p.translate(at.x, at.y);
        p.rotate(angle);
        p.fill_triangle(Vec2::ZERO, b, c, self.fin.opaque());
        p.pop();
    }
}

/// Filled half disc below (`lower`) or above the centre line.
fn half_disc(p: &mut Painter<'_>, c: Vec2, d: f32, lower: bool, col: Rgba) {
    let sign = if lower { 1.0 } else { -1.0 };
    let pts: Vec<Vec2> = (0..=12)
        .map(|k| c + Vec2::from_angle(PI * k as f32 / 12.0 * sign) * (d / 2.0))
        .collect();
    p.fill_polygon(&pts, col);
}

impl Entity for CelestialBody {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        self.tail_angle = (ctx.frame * TAIL_SPEED).sin() * PI / 6.0;
    }

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let frame = ctx.frame;
        let at = anchor(ctx.bounds);
        p.push();
        p.translate(at.x, at.y);

        p.fill_circle(Vec2::ZERO, SIZE * 2.2, self.glow.alpha(25.0));
        self.draw_rays(p, frame);

        p.fill_polygon(&self.body_outline(), self.main.opaque());

        p.push();
        p.translate(-SIZE / 2.0, 0.0);
        p.rotate(self.tail_angle);
        let tail = SIZE * 0.4;
        p.fill_triangle(
            Vec2::ZERO,
            Vec2::new(-tail, -tail / 2.0),
            Vec2::new(-tail, tail / 2.0),
            self.main.opaque(),
        );
        p.pop();

        let sway = (frame * 0.05).sin() * 0.1;
        self.draw_fin(
            p,
            Vec2::new(0.0, -SIZE / 2.0),
            -PI / 4.0 + sway,
            Vec2::new(SIZE * 0.3, -SIZE * 0.3),
            Vec2::new(-SIZE * 0.1, -SIZE * 0.2),
        );
        for side in [-1.0f32, 1.0] {
            self.draw_fin(
                p,
                Vec2::new(0.0, SIZE / 4.0 * side),
                PI / 6.0 * side + sway,
                Vec2::new(SIZE * 0.2, SIZE * 0.15 * side),
                Vec2::new(-SIZE * 0.1, SIZE * 0.1 * side),
            );
        }

        let eye = Vec2::new(SIZE * 0.2, -SIZE * 0.1);
        p.fill_circle(eye, SIZE * 0.15, Rgb::WHITE.opaque());
        p.fill_circle(eye, SIZE * 0.075, Rgb::BLACK.opaque());

        if self.is_day {
            let scale = SIZE * 0.1;
            for i in 0..3 {
                for j in 0..5 {
                    let c = Vec2::new(-SIZE * 0.3 + j as f32 * scale, -SIZE * 0.2 + i as f32 * scale);
                    p.stroke_arc(c, scale, PI, TAU, 1.0, self.accent.opaque());
                }
            }
        } else {
            // Spots are fixed per seed rather than re-rolled each frame.
            for i in 0..5u32 {
                let angle = jitter(ctx.seed, i, 0) * TAU;
                let r = SIZE * (0.1 + jitter(ctx.seed, i, 1) * 0.2);
                let d = 5.0 + jitter(ctx.seed, i, 2) * 5.0;
                half_disc(p, Vec2::from_angle(angle) * r, d, true, self.accent.opaque());
            }
        }

        p.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::Harness;

    #[test]
    fn day_and_night_differ() {
        let mut h = Harness::new(1);
        let sun = CelestialBody::new(&mut h.rng, true);
        let moon = CelestialBody::new(&mut h.rng, false);
        assert!(sun.main.r > moon.main.r);
        assert_eq!(sun.ray.a, 150.0);
        assert_eq!(moon.ray.a, 100.0);
    }

    #[test]
    fn tail_swings_within_sixth_turn() {
        let mut h = Harness::new(2);
        let mut body = CelestialBody::new(&mut h.rng, true);
        for _ in 0..500 {
            h.step(&mut body);
            assert!(body.tail_angle.abs() <= PI / 6.0 + 1e-6);
        }
    }

    #[test]
    fn anchored_top_right() {
        let a = anchor(Bounds::new(1000.0, 500.0));
        assert_eq!(a, Vec2::new(950.0, 40.0));
    }
}
