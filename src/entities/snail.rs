use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::{BlendMode, Painter};
use crate::clock::{Hand, WallTime};
use crate::geom::{lerp, Vec2};
use crate::palette::{self, Rgb};
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Inset of the clock track from both screen edges.
pub(crate) const TRACK_MARGIN: f32 = 100.0;
const SHELL_TURNS: f32 = 4.0;

/// Position along the ground track for a hand angle in `[0, 1)`.
pub(crate) fn track_x(angle: f32, width: f32) -> f32 {
    TRACK_MARGIN + (width - 2.0 * TRACK_MARGIN) * angle
}

/// A clock hand drawn as a snail crawling along the sea floor.
#[derive(Clone, Debug)]
pub(crate) struct Snail {
    hand: Hand,
    pub(crate) pos: Vec2,
    size: f32,
    angle: f32,
    direction: f32,
    shell_rotation: f32,
    pattern_offset: f32,

    shell: Rgb,
    body: Rgb,
    highlight: Rgb,
    accent: Rgb,
    has_spirals: bool,
    has_gold_spots: bool,
    spot_size: f32,
    shimmer_offset: f32,
    edge_width: f32,
}

impl Snail {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, hand: Hand, bounds: Bounds) -> Self {
        let size = match hand {
            Hand::Hour => 120.0,
            Hand::Minute => 100.0,
            Hand::Second => 80.0,
        };
        let pattern_offset = rng.gen_range(0.0..TAU);
        let hue = rng.gen_range(0.0..360.0);
        let sat = rng.gen_range(70.0..90.0);
        let bright = rng.gen_range(50.0..80.0);
        let body_hue = (hue + rng.gen_range(120.0..240.0)) % 360.0;
        let highlight = Rgb::from_hsb(rng.gen_range(20.0..45.0), 80.0, rng.gen_range(50.0..70.0));

        Self {
            hand,
            pos: Vec2::new(TRACK_MARGIN, bounds.h),
            size,
            angle: 0.0,
            direction: 1.0,
            shell_rotation: 0.0,
            pattern_offset,
            shell: Rgb::from_hsb(hue, sat, bright),
            body: Rgb::from_hsb(body_hue, sat, bright),
            highlight,
            accent: palette::accent(rng),
            has_spirals: rng.gen::<f32>() < 0.8,
            has_gold_spots: rng.gen::<f32>() < 0.8,
            spot_size: rng.gen_range(5.0..12.0),
            shimmer_offset: rng.gen_range(0.0..1000.0),
            edge_width: rng.gen_range(4.0..8.0),
        }
    }

    pub(crate) fn follow(&mut self, clock: WallTime, bounds: Bounds) {
        self.angle = clock.angle(self.hand);
        self.pos = Vec2::new(track_x(self.angle, bounds.w), bounds.h);

        let dir = if self.angle < 0.5 { 1.0 } else { -1.0 };
        if dir != self.direction {
            self.shell_rotation = PI;
        }
        self.direction = dir;
    }

    fn spiral(&self, turns: f32, radius: f32, step: f32, wobble: impl Fn(f32) -> f32) -> Vec<Vec2> {
        let end = TAU * turns;
        let mut pts = Vec::new();
        let mut a = 0.0f32;
        while a < end {
            let r = radius * (1.0 - a / end) + wobble(a);
            pts.push(Vec2::from_angle(a) * r);
            a += step;
        }
        pts
    }
}

fn cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

impl Entity for Snail {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        self.follow(ctx.clock, ctx.bounds);
        self.shell_rotation = lerp(self.shell_rotation, 0.0, (0.1 * ctx.dt).min(1.0));
    }

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let s = self.size;
        p.push();
        p.translate(self.pos.x, self.pos.y);
        p.scale(self.direction, 1.0);

        let start = Vec2::new(-s * 0.4, 0.0);
        let mid = Vec2::new(s * 0.1, -s * 0.2);
        let mut body = Vec::with_capacity(24);
        for k in 0..=10 {
            let t = k as f32 / 10.0;
            body.push(cubic(
                start,
                Vec2::new(-s * 0.3, -s * 0.2),
                Vec2::new(-s * 0.1, -s * 0.25),
                mid,
                t,
            ));
        }
        for k in 1..=10 {
            let t = k as f32 / 10.0;
            body.push(cubic(
                mid,
                Vec2::new(s * 0.2, -s * 0.1),
                Vec2::new(s * 0.25, 0.0),
                Vec2::new(s * 0.3, 0.0),
                t,
            ));
        }
        p.fill_polygon(&body, self.body.opaque());

        let wave = (ctx.frame * 0.1).sin() * 0.2;
        let tips = [
            (Vec2::new(0.0, -s * 0.2), Vec2::new(-s * 0.15, -s * 0.4 + wave)),
            (Vec2::new(s * 0.1, -s * 0.2), Vec2::new(0.0, -s * 0.4 + wave)),
        ];
        for (root, tip) in tips {
            p.line(root, tip, 2.0, self.body.opaque());
            p.fill_circle(tip, 4.0, self.accent.opaque());
        }

        p.push();
        p.translate(-s * 0.2, -s * 0.3);
        p.rotate(self.shell_rotation);

        let shell = self.spiral(SHELL_TURNS, s * 0.3, 0.1, |_| 0.0);
        p.fill_polygon(&shell, self.shell.opaque());
        p.polyline(&shell, 1.5, self.accent.opaque(), false);

        if self.has_spirals {
            for i in 0..3 {
                let shrink = 1.0 - i as f32 * 0.2;
                let pts: Vec<Vec2> = self
                    .spiral(2.0, s * 0.25 * shrink, 0.2, |_| 0.0)
                    .into_iter()
                    .map(|v| Vec2::from_angle(v.heading() + self.pattern_offset) * v.len())
                    .collect();
                p.polyline(&pts, 1.0, self.highlight.opaque(), false);
            }
        }

        if self.has_gold_spots {
            for i in 0..12 {
                let k = i as f32;
                let a = TAU * k / 12.0 + (ctx.frame * 0.02 + k).sin() * 0.2;
                let r = s * 0.2 * (1.0 - k / 24.0);
                p.fill_circle(
                    Vec2::from_angle(a) * r,
                    self.spot_size * (1.0 - k / 12.0),
                    self.highlight.opaque(),
                );
            }
        }

        p.push();
        p.set_blend(BlendMode::Add);
        let t = ctx.frame * 0.05 + self.shimmer_offset;
        let edge = self.spiral(SHELL_TURNS, s * 0.3, 0.1, |a| (t + a).sin() * 2.0);
        p.polyline(&edge, self.edge_width, self.highlight.opaque(), false);
        p.pop();

        p.pop();
        p.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::Harness;
    use rstest::rstest;

    #[rstest]
    #[case(Hand::Hour, 120.0)]
    #[case(Hand::Minute, 100.0)]
    #[case(Hand::Second, 80.0)]
    fn sizes_by_hand(#[case] hand: Hand, #[case] want: f32) {
        let mut h = Harness::new(0);
        assert_eq!(Snail::new(&mut h.rng, hand, h.bounds).size, want);
    }

    #[test]
    fn sits_on_the_track_at_the_floor() {
        let mut h = Harness::new(5);
        h.clock = WallTime::new(3, 0, 0);
        let mut s = Snail::new(&mut h.rng, Hand::Hour, h.bounds);
        h.step(&mut s);
        assert_eq!(s.pos.y, h.bounds.h);
        assert!((s.pos.x - track_x(0.25, h.bounds.w)).abs() < 1e-3);
        assert_eq!(track_x(0.0, 1200.0), TRACK_MARGIN);
    }

    #[test]
    fn turns_around_past_the_midpoint() {
        let mut h = Harness::new(7);
        h.clock = WallTime::new(0, 10, 0);
        let mut s = Snail::new(&mut h.rng, Hand::Minute, h.bounds);
        h.step(&mut s);
        assert_eq!(s.direction, 1.0);
        assert_eq!(s.shell_rotation, 0.0);

        h.clock = WallTime::new(0, 40, 0);
        h.step(&mut s);
        assert_eq!(s.direction, -1.0);
        assert!(s.shell_rotation > 2.5);

        let mut prev = s.shell_rotation;
        for _ in 0..30 {
            h.step(&mut s);
            assert!(s.shell_rotation < prev);
            prev = s.shell_rotation;
        }
        assert!(prev < 0.2);
    }
}
