use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::Vec2;
use crate::palette::Rgb;
use rand::Rng;

/// Bubbles above this line are recycled.
pub(crate) const TOP_EXIT: f32 = -10.0;

#[derive(Clone, Debug)]
pub(crate) struct Bubble {
    pub(crate) pos: Vec2,
    size: f32,
    speed: f32,
    wobble: f32,
    opacity: f32,
    glow: f32,
}

impl Bubble {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        Self {
            pos: Vec2::new(
                rng.gen_range(0.0..bounds.w.max(1.0)),
                rng.gen_range(bounds.h..bounds.h + 100.0),
            ),
            size: rng.gen_range(2.0..8.0),
            speed: rng.gen_range(0.5..1.5),
            wobble: rng.gen_range(0.0..1000.0),
            opacity: rng.gen_range(100.0..180.0),
            glow: rng.gen_range(1.0..3.0),
        }
    }
}

impl Entity for Bubble {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        let dt = ctx.dt;
        self.pos.y -= self.speed * dt;
        self.pos.x += self.wobble.sin() * 0.3 * (1.0 + ctx.noise.get(self.wobble * 0.1) * 0.5) * dt;
        self.wobble += 0.02 * dt;

        if self.pos.y < TOP_EXIT {
            *self = Bubble::new(ctx.rng, ctx.bounds);
        }
    }

    fn render(&self, p: &mut Painter<'_>, _ctx: &RenderCtx<'_>) {
        let halo = self.size + self.glow * 5.0;
        p.fill_circle(self.pos, halo, Rgb::WHITE.alpha(50.0 / self.glow.max(1.0)));
        p.stroke_circle(self.pos, self.size, 0.5, Rgb::WHITE.alpha(self.opacity));
        let glint = self.pos + Vec2::new(self.size / 4.0, -self.size / 4.0);
        p.point(glint, 1.0, Rgb::WHITE.alpha(self.opacity * 0.7));
    }
}
