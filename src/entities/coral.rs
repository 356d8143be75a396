use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::{map_range, Vec2};
use crate::palette::{self, Rgb};
use rand::Rng;
use std::f32::consts::TAU;

pub(crate) const CORAL_COUNT: usize = 12;

#[derive(Clone, Copy, Debug)]
struct Disc {
    at: Vec2,
    size: f32,
    rotation: f32,
}

#[derive(Clone, Copy, Debug)]
struct Spoke {
    angle: f32,
    length: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Growth {
    Discs,
    Spiral,
    Star,
}

#[derive(Clone, Debug)]
pub(crate) struct CoralFormation {
    pub(crate) base: Vec2,
    size: f32,
    growth: Growth,
    main: Rgb,
    accent: Rgb,
    shimmer_offset: f32,
    rotation_offset: f32,
    discs: [Disc; 5],
    spiral_density: f32,
    spokes: [Spoke; 6],
}

impl CoralFormation {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, base: Vec2) -> Self {
        let size = rng.gen_range(40.0..80.0);
        let growth = match rng.gen_range(0..3) {
            0 => Growth::Discs,
            1 => Growth::Spiral,
            _ => Growth::Star,
        };
        let main = palette::gold(rng);
        let accent = palette::accent(rng);
        let shimmer_offset = rng.gen_range(0.0..1000.0);
        let rotation_offset = rng.gen_range(0.0..TAU);
        let discs = std::array::from_fn(|_| Disc {
            at: Vec2::new(rng.gen_range(-size / 2.0..size / 2.0), rng.gen_range(-size / 2.0..0.0)),
            size: rng.gen_range(10.0..25.0),
            rotation: rng.gen_range(0.0..TAU),
        });
        let spiral_density = rng.gen_range(0.3..0.5);
        let spokes = std::array::from_fn(|_| Spoke {
            angle: rng.gen_range(0.0..TAU),
            length: rng.gen_range(0.3..1.0),
        });
        Self {
            base,
            size,
            growth,
            main,
            accent,
            shimmer_offset,
            rotation_offset,
            discs,
            spiral_density,
            spokes,
        }
    }

    /// Evenly spread formations along the floor with a little jitter.
    pub(crate) fn reef<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Vec<CoralFormation> {
        (0..CORAL_COUNT)
            .map(|i| {
                let x = map_range(
                    i as f32,
                    0.0,
                    (CORAL_COUNT - 1) as f32,
                    bounds.w * 0.05,
                    bounds.w * 0.95,
                ) + rng.gen_range(-30.0..30.0);
                CoralFormation::new(rng, Vec2::new(x, bounds.h))
            })
            .collect()
    }
}

impl Entity for CoralFormation {
    fn advance(&mut self, _ctx: &mut FrameCtx<'_>) {}

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let frame = ctx.frame;
        let shimmer = ctx.noise.get(self.shimmer_offset + frame * 0.02) * 0.3;
        let col = self.main.lerp(self.accent, shimmer).opaque();

        p.push();
        p.translate(self.base.x, self.base.y);
        p.rotate((frame * 0.02 + self.rotation_offset).sin() * 0.1);

        match self.growth {
            Growth::Discs => {
                for d in &self.discs {
                    p.push();
                    p.translate(d.at.x, d.at.y);
                    p.rotate(d.rotation + frame * 0.01);
                    p.fill_circle(Vec2::ZERO, d.size, col);
                    p.pop();
                }
            }
            Growth::Spiral => {
                let end = TAU * 2.0;
                for i in 0..3 {
                    let t = frame * 0.02 + i as f32 * TAU / 3.0;
                    let mut pts = Vec::with_capacity(128);
                    let mut a = 0.0f32;
                    while a < end {
                        let r = map_range(a, 0.0, end, 0.0, self.size / 2.0);
                        pts.push(Vec2::from_angle(a + t) * r * self.spiral_density);
                        a += 0.1;
                    }
                    p.polyline(&pts, 2.0, col, false);
                }
            }
            Growth::Star => {
                let pts: Vec<Vec2> = self
                    .spokes
                    .iter()
                    .map(|s| Vec2::from_angle(s.angle + frame * 0.02) * (self.size / 2.0 * s.length))
                    .collect();
                p.fill_polygon(&pts, col);
            }
        }
        p.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn reef_spans_the_floor() {
        let mut rng = StdRng::seed_from_u64(8);
        let bounds = Bounds::new(1000.0, 600.0);
        let reef = CoralFormation::reef(&mut rng, bounds);
        assert_eq!(reef.len(), CORAL_COUNT);
        assert!(reef[0].base.x < 100.0);
        assert!(reef[CORAL_COUNT - 1].base.x > 900.0);
        assert!(reef.iter().all(|c| c.base.y == 600.0));
        assert!(reef.iter().all(|c| (40.0..80.0).contains(&c.size)));
    }

    #[test]
    fn discs_sit_above_the_anchor() {
        let mut rng = StdRng::seed_from_u64(9);
        let c = CoralFormation::new(&mut rng, Vec2::ZERO);
        assert!(c.discs.iter().all(|d| d.at.y <= 0.0 && d.at.x.abs() <= c.size / 2.0));
    }
}
