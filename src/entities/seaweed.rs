use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::{map_range, Affine, Vec2};
use crate::palette::{self, Rgb};
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI};

const BRANCH_ANGLE: f32 = PI / 6.0;
const MAX_DEPTH: usize = 8;
/// Clock markers stand at 13 evenly spaced track positions.
pub(crate) const MARKER_COUNT: usize = 13;
pub(crate) const MARKER_MAIN: Rgb = Rgb::new(255, 50, 50);
pub(crate) const MARKER_ACCENT: Rgb = Rgb::new(200, 30, 30);

#[derive(Clone, Copy, Debug)]
struct Fork {
    left: bool,
    right: bool,
    offset: f32,
}

/// Pending segment of the branch walk.
struct Stroke {
    xf: Affine,
    depth: usize,
    length: f32,
    angle: f32,
    thickness: f32,
}

/// A branching frond anchored at its base.
#[derive(Clone, Debug)]
pub(crate) struct Seaweed {
    pub(crate) base: Vec2,
    segments: usize,
    segment_len: f32,
    noise_offset: f32,
    thickness: f32,
    pub(crate) main: Rgb,
    accent: Rgb,
    forks: Vec<Fork>,
}

impl Seaweed {
    pub(crate) fn new<R: Rng + ?Sized>(
        rng: &mut R,
        base: Vec2,
        segments: usize,
        segment_len: f32,
    ) -> Self {
        let segments = segments.min(MAX_DEPTH);
        let noise_offset = rng.gen_range(0.0..1000.0);
        let thickness = rng.gen_range(2.0..4.0);
        let main = palette::gold(rng);
        let accent = palette::accent(rng);
        let forks = (0..segments)
            .map(|i| Fork {
                left: rng.gen::<f32>() < 0.7 && i > 1,
                right: rng.gen::<f32>() < 0.7 && i > 1,
                offset: rng.gen_range(-0.1..0.1),
            })
            .collect();
        Self {
            base,
            segments,
            segment_len,
            noise_offset,
            thickness,
            main,
            accent,
            forks,
        }
    }

    /// Red frond marking one clock position.
    pub(crate) fn marker<R: Rng + ?Sized>(rng: &mut R, base: Vec2) -> Self {
        Self {
            main: MARKER_MAIN,
            accent: MARKER_ACCENT,
            ..Seaweed::new(rng, base, 5, 20.0)
        }
    }

    /// A free-standing frond somewhere along the floor.
    pub(crate) fn loose<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        let x = rng.gen_range(bounds.w * 0.05..bounds.w * 0.95 + f32::EPSILON);
        let segments = rng.gen_range(4..8);
        let len = rng.gen_range(15.0..25.0);
        Seaweed::new(rng, Vec2::new(x, bounds.h), segments, len)
    }

    /// Three to seven short fronds bunched around one spot.
    pub(crate) fn cluster<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Vec<Seaweed> {
        let x = rng.gen_range(bounds.w * 0.05..bounds.w * 0.95 + f32::EPSILON);
        let n = rng.gen_range(3..8);
        (0..n)
            .map(|_| {
                let dx = rng.gen_range(-40.0..40.0);
                let segments = rng.gen_range(3..7);
                let len = rng.gen_range(15.0..25.0);
                Seaweed::new(rng, Vec2::new(x + dx, bounds.h), segments, len)
            })
            .collect()
    }

    /// Number of line segments one render will emit.
    #[cfg(test)]
    pub(crate) fn stroke_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.segments];
        while let Some(depth) = stack.pop() {
            if depth == 0 {
                continue;
            }
            count += 1;
            if let Some(f) = self.forks.get(self.segments - depth) {
                if f.left {
                    stack.push(depth - 1);
                }
                if f.right {
                    stack.push(depth - 1);
                }
            }
            stack.push(depth - 1);
        }
        count
    }
}

impl Entity for Seaweed {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        self.noise_offset += 0.01 * ctx.dt;
    }

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let t = ctx.frame * 0.02;
        let sway = (t + self.noise_offset).sin() * 0.1;
        let main = self.main.opaque();
        let accent = self.accent.opaque();

        p.push();
        let root = p
            .transform()
            .then_translate(self.base.x, self.base.y)
            .then_rotate(sway);
        let mut stack = vec![Stroke {
            xf: root,
            depth: self.segments,
            length: self.segment_len,
            angle: -FRAC_PI_2,
            thickness: self.thickness,
        }];

        while let Some(s) = stack.pop() {
            if s.depth == 0 {
                continue;
            }
            let tip = Vec2::from_angle(s.angle) * s.length;
            p.set_transform(s.xf);
            p.line_gradient(Vec2::ZERO, tip, s.thickness, main, accent);

            let at_tip = s.xf.then_translate(tip.x, tip.y);
            let n = ctx.noise.get2(self.noise_offset + s.depth as f32 * 0.3, t);
            let angle = s.angle + map_range(n, 0.0, 1.0, -0.1, 0.1);

            if let Some(fork) = self.forks.get(self.segments - s.depth) {
                for (grow, turn) in [(fork.left, -BRANCH_ANGLE), (fork.right, BRANCH_ANGLE)] {
                    if grow {
                        stack.push(Stroke {
                            xf: at_tip.then_rotate(turn + fork.offset),
                            depth: s.depth - 1,
                            length: s.length * 0.7,
                            angle,
                            thickness: s.thickness * 0.7,
                        });
                    }
                }
            }
            stack.push(Stroke {
                xf: at_tip,
                depth: s.depth - 1,
                length: s.length * 0.9,
                angle,
                thickness: s.thickness * 0.9,
            });
        }
        p.pop();
    }
}
