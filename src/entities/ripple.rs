use super::{Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::{map_range, Vec2};
use crate::palette::Rgb;
use rand::Rng;

/// Chance per fish per step that a ripple is left behind.
pub(crate) const SPAWN_CHANCE: f32 = 0.05;

#[derive(Clone, Debug)]
pub(crate) struct Ripple {
    pos: Vec2,
    size: f32,
    max_size: f32,
    opacity: f32,
    speed: f32,
}

impl Ripple {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, pos: Vec2) -> Self {
        Self {
            pos,
            size: 10.0,
            max_size: rng.gen_range(30.0..50.0),
            opacity: 255.0,
            speed: rng.gen_range(1.0..2.0),
        }
    }

    /// Expand one step; `false` once the ring has reached its full size.
    pub(crate) fn grow(&mut self, dt: f32) -> bool {
        self.size += self.speed * dt;
        self.opacity = map_range(self.size, 0.0, self.max_size, 255.0, 0.0).clamp(0.0, 255.0);
        self.alive()
    }

    pub(crate) fn alive(&self) -> bool {
        self.size < self.max_size
    }
}

impl Entity for Ripple {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        self.grow(ctx.dt);
    }

    fn render(&self, p: &mut Painter<'_>, _ctx: &RenderCtx<'_>) {
        p.stroke_circle(self.pos, self.size, 2.0, Rgb::WHITE.alpha(self.opacity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn reports_death_exactly_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut r = Ripple::new(&mut rng, Vec2::new(5.0, 5.0));
        let mut steps = 0;
        while r.grow(1.0) {
            steps += 1;
            assert!(r.size < r.max_size);
            assert!(steps < 100);
        }
        assert!(r.size >= r.max_size);
        assert!(r.size - r.speed < r.max_size);
    }

    #[test]
    fn fades_as_it_grows() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut r = Ripple::new(&mut rng, Vec2::ZERO);
        let mut prev = r.opacity;
        while r.grow(1.0) {
            assert!(r.opacity < prev);
            prev = r.opacity;
        }
        assert_eq!(r.opacity, 0.0);
    }
}
