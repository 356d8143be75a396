use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::Vec2;
use crate::palette::{self, Rgb};
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ornament {
    Rings,
    Pinwheel,
    Trefoil,
    Eye,
}

/// Small drifting ornament that wraps around the screen.
#[derive(Clone, Debug)]
pub(crate) struct FloatingPattern {
    pub(crate) pos: Vec2,
    pub(crate) size: f32,
    speed: Vec2,
    rotation: f32,
    rotation_speed: f32,
    ornament: Ornament,
    opacity: f32,
    color: Rgb,
    accent: Rgb,
}

impl FloatingPattern {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        Self {
            pos: Vec2::new(
                rng.gen_range(0.0..bounds.w.max(1.0)),
                rng.gen_range(0.0..bounds.h.max(1.0)),
            ),
            size: rng.gen_range(20.0..60.0),
            speed: Vec2::new(rng.gen_range(-0.2..0.2), rng.gen_range(-0.2..0.2)),
            rotation: rng.gen_range(0.0..TAU),
            rotation_speed: rng.gen_range(-0.002..0.002),
            ornament: match rng.gen_range(0..4) {
                0 => Ornament::Rings,
                1 => Ornament::Pinwheel,
                2 => Ornament::Trefoil,
                _ => Ornament::Eye,
            },
            opacity: rng.gen_range(40.0..80.0),
            color: palette::gold(rng),
            accent: palette::accent(rng),
        }
    }
}

impl Entity for FloatingPattern {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        let dt = ctx.dt;
        self.pos += self.speed * dt;
        self.rotation += self.rotation_speed * dt;

        let (w, h, s) = (ctx.bounds.w, ctx.bounds.h, self.size);
        if self.pos.x < -s {
            self.pos.x = w + s;
        }
        if self.pos.x > w + s {
            self.pos.x = -s;
        }
        if self.pos.y < -s {
            self.pos.y = h + s;
        }
        if self.pos.y > h + s {
            self.pos.y = -s;
        }
    }

    fn render(&self, p: &mut Painter<'_>, _ctx: &RenderCtx<'_>) {
        let main = self.color.alpha(self.opacity);
        let second = self.accent.alpha(self.opacity);
        let s = self.size;

        p.push();
        p.translate(self.pos.x, self.pos.y);
        p.rotate(self.rotation);
        match self.ornament {
            Ornament::Rings => {
                for i in (1..=3).rev() {
                    let col = if i % 2 == 0 { main } else { second };
                    p.fill_circle(Vec2::ZERO, s * i as f32 / 3.0, col);
                }
            }
            Ornament::Pinwheel => {
                for _ in 0..4 {
                    p.rotate(FRAC_PI_2);
                    p.fill_rect(0.0, 0.0, s / 2.0, s / 8.0, main);
                }
            }
            Ornament::Trefoil => {
                for _ in 0..3 {
                    p.rotate(TAU / 3.0);
                    p.fill_triangle(
                        Vec2::new(0.0, -s / 2.0),
                        Vec2::new(s / 4.0, s / 4.0),
                        Vec2::new(-s / 4.0, s / 4.0),
                        main,
                    );
                }
            }
            Ornament::Eye => {
                p.fill_ellipse(Vec2::ZERO, s, s * 0.6, main);
                p.fill_circle(Vec2::ZERO, s * 0.3, second);
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
    fn stays_within_wrap_bounds() {
        let mut h = Harness::new(13);
        let mut patterns: Vec<_> = (0..15)
            .map(|_| FloatingPattern::new(&mut h.rng, h.bounds))
            .collect();
        for _ in 0..20_000 {
            for f in &mut patterns {
                h.step(f);
                assert!(f.pos.x >= -f.size && f.pos.x <= h.bounds.w + f.size);
                assert!(f.pos.y >= -f.size && f.pos.y <= h.bounds.h + f.size);
            }
        }
    }

    #[test]
    fn wraps_left_edge_to_right() {
        let mut h = Harness::new(1);
        let mut f = FloatingPattern::new(&mut h.rng, h.bounds);
        f.speed = Vec2::new(-1.0, 0.0);
        f.pos = Vec2::new(-f.size + 0.5, 100.0);
        h.step(&mut f);
        assert_eq!(f.pos.x, h.bounds.w + f.size);
    }
}
