//! Animated scene entities.
//!
//! Every kind implements [`Entity`]: `advance` mutates its own state once per
//! simulation step, `render` draws it through a [`Painter`] without mutating.

mod atmosphere;
mod bubble;
mod celestial;
mod coral;
mod fish;
mod mosaic;
mod pattern;
mod ripple;
mod seaweed;
mod snail;
mod starburst;

pub(crate) use atmosphere::{
    Backdrop, LightRay, Particle, SandBed, Vignette, LIGHT_RAY_COUNT, PARTICLE_COUNT,
};
pub(crate) use bubble::Bubble;
pub(crate) use celestial::CelestialBody;
pub(crate) use coral::CoralFormation;
pub(crate) use fish::Fish;
pub(crate) use mosaic::MosaicTile;
pub(crate) use pattern::FloatingPattern;
pub(crate) use ripple::{Ripple, SPAWN_CHANCE as RIPPLE_SPAWN_CHANCE};
pub(crate) use seaweed::{Seaweed, MARKER_COUNT};
pub(crate) use snail::{track_x, Snail};
pub(crate) use starburst::Starburst;

use crate::canvas::Painter;
use crate::clock::WallTime;
use crate::geom::Vec2;
use crate::noise::Noise;
use rand::rngs::StdRng;

/// Size of the drawing surface in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl Bounds {
    pub(crate) fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }
}

/// Everything an entity may read or consume while advancing one step.
pub(crate) struct FrameCtx<'a> {
    pub(crate) frame: f32,
    /// Step length in nominal frames (1.0 = one 60 Hz frame).
    pub(crate) dt: f32,
    pub(crate) bounds: Bounds,
    pub(crate) noise: &'a Noise,
    pub(crate) rng: &'a mut StdRng,
    pub(crate) clock: WallTime,
    /// Fish positions at the start of the step, indexed by fish id.
    pub(crate) school: &'a [Vec2],
}

pub(crate) struct RenderCtx<'a> {
    pub(crate) frame: f32,
    pub(crate) bounds: Bounds,
    pub(crate) noise: &'a Noise,
    /// Seed for draw-time jitter that must not touch the simulation RNG.
    pub(crate) seed: u32,
}

pub(crate) trait Entity {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>);
    fn render(&self, painter: &mut Painter<'_>, ctx: &RenderCtx<'_>);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use rand::SeedableRng;

    /// Owns the pieces a [`FrameCtx`] borrows, for driving single entities.
    pub(crate) struct Harness {
        pub(crate) rng: StdRng,
        pub(crate) noise: Noise,
        pub(crate) bounds: Bounds,
        pub(crate) clock: WallTime,
        pub(crate) frame: f32,
        pub(crate) school: Vec<Vec2>,
    }

    impl Harness {
        pub(crate) fn new(seed: u64) -> Self {
            Self {
                rng: StdRng::seed_from_u64(seed),
                noise: Noise::new(seed),
                bounds: Bounds::new(1200.0, 800.0),
                clock: WallTime::new(9, 0, 0),
                frame: 0.0,
                school: Vec::new(),
            }
        }

        pub(crate) fn step<E: Entity>(&mut self, e: &mut E) {
            self.frame += 1.0;
            let mut ctx = FrameCtx {
                frame: self.frame,
                dt: 1.0,
                bounds: self.bounds,
                noise: &self.noise,
                rng: &mut self.rng,
                clock: self.clock,
                school: &self.school,
            };
            e.advance(&mut ctx);
        }
    }
}
