use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::Painter;
use crate::geom::Vec2;
use crate::palette::{self, Rgb, ACCENT};
use rand::Rng;
use std::f32::consts::TAU;

const FADE_TIME: f32 = 60.0;
const RAY_SEGMENTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StarPhase {
    Appearing,
    Steady,
    Disappearing,
    Hidden,
}

#[derive(Clone, Debug)]
pub(crate) struct Starburst {
    pos: Vec2,
    rays: usize,
    ray_color: Rgb,
    center_color: Rgb,
    inner: f32,
    outer: f32,
    opacity: f32,
    rotation: f32,
    rotation_speed: f32,
    lifespan: f32,
    age: f32,
    visible: bool,
    hide_time: f32,
    hidden_age: f32,
    pulse_offset: f32,
}

impl Starburst {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        let inner = rng.gen_range(3.0..12.0);
        Self {
            pos: Vec2::new(
                rng.gen_range(0.0..bounds.w.max(1.0)),
                rng.gen_range(0.0..bounds.h.max(1.0)),
            ),
            rays: rng.gen_range(8.0f32..16.0).floor() as usize,
            ray_color: palette::gold(rng),
            center_color: palette::gold(rng),
            inner,
            outer: inner * rng.gen_range(3.0..8.0),
            opacity: rng.gen_range(100.0..200.0),
            rotation: rng.gen_range(0.0..TAU),
            rotation_speed: rng.gen_range(-0.005..0.005),
            lifespan: rng.gen_range(300.0..600.0),
            age: 0.0,
            visible: true,
            hide_time: rng.gen_range(200.0..400.0),
            hidden_age: 0.0,
            pulse_offset: rng.gen_range(0.0..1000.0),
        }
    }

    pub(crate) fn phase(&self) -> StarPhase {
        if !self.visible {
            StarPhase::Hidden
        } else if self.age < FADE_TIME {
            StarPhase::Appearing
        } else if self.age > self.lifespan - FADE_TIME {
            StarPhase::Disappearing
        } else {
            StarPhase::Steady
        }
    }

    fn fade(&self) -> f32 {
        match self.phase() {
            StarPhase::Hidden => 0.0,
            StarPhase::Appearing => self.age / FADE_TIME,
            StarPhase::Disappearing => (self.lifespan - self.age) / FADE_TIME,
            StarPhase::Steady => 1.0,
        }
        .clamp(0.0, 1.0)
    }
}

impl Entity for Starburst {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        let dt = ctx.dt;
        if !self.visible {
            self.hidden_age += dt;
            if self.hidden_age > self.hide_time {
                *self = Starburst::new(ctx.rng, ctx.bounds);
            }
            return;
        }

        self.age += dt;
        if self.age > self.lifespan {
            self.visible = false;
            self.age = self.lifespan;
            self.hidden_age = 0.0;
            return;
        }
        self.rotation += self.rotation_speed * dt;
    }

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        if !self.visible {
            return;
        }
        let fade = self.fade();
        let pulse = 1.0 + (ctx.frame * 0.02 + self.pulse_offset).sin() * 0.1;

        p.push();
        p.translate(self.pos.x, self.pos.y);
        p.rotate(self.rotation);

        // Soft halo in place of a blurred shadow.
        p.fill_circle(
            Vec2::ZERO,
            self.outer * 2.0 * pulse,
            self.ray_color.alpha(self.opacity * 0.4 * 0.15).fade(fade),
        );

        let segs = RAY_SEGMENTS as f32;
        for i in 0..self.rays {
            let dir = Vec2::from_angle(i as f32 * TAU / self.rays as f32);
            let start = dir * self.inner * pulse;
            let end = dir * self.outer * pulse;
            for j in 0..RAY_SEGMENTS {
                let a = start.lerp(end, j as f32 / segs);
                let b = start.lerp(end, (j + 1) as f32 / segs);
                let alpha = self.opacity * (0.4 + (j % 2) as f32 * 0.6);
                let weight = 2.0 + (RAY_SEGMENTS - j) as f32 * self.inner / 15.0;
                p.line(a, b, weight, self.ray_color.alpha(alpha).fade(fade));

                if j < RAY_SEGMENTS - 1 {
                    let accent = ACCENT[j % ACCENT.len()];
                    let d = self.inner * 0.2 * (RAY_SEGMENTS - j) as f32 / segs;
                    p.fill_circle(b, d, accent.alpha(self.opacity * 0.3).fade(fade));
                }
            }
        }

        for i in 0..12 {
            let c = Vec2::from_angle(i as f32 * TAU / 12.0) * self.inner * 1.8;
            p.fill_circle(c, self.inner * 0.4, self.center_color.opaque());
        }

        p.fill_circle(
            Vec2::ZERO,
            self.inner * 2.2 * pulse,
            self.center_color.alpha(self.opacity * 0.3).fade(fade),
        );
        p.fill_circle(
            Vec2::ZERO,
            self.inner * 2.0 * pulse,
            self.center_color.alpha(self.opacity).fade(fade),
        );

        for i in 0..8 {
            let c = Vec2::from_angle(i as f32 * TAU / 8.0) * self.inner * 0.8;
            p.fill_circle(c, self.inner * 0.3, ACCENT[i % ACCENT.len()].opaque());
        }

        p.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::Harness;

    #[test]
    fn counters_stay_in_range_over_many_cycles() {
        let mut h = Harness::new(8);
        let mut s = Starburst::new(&mut h.rng, h.bounds);
        let mut hidden_seen = 0;
        let mut was_visible = true;
        for _ in 0..10_000 {
            h.step(&mut s);
            if s.visible {
                assert!(s.age >= 0.0 && s.age <= s.lifespan);
                if !was_visible {
                    assert_eq!(s.age, 0.0);
                }
            } else {
                assert!(s.hidden_age >= 0.0 && s.hidden_age <= s.hide_time);
                if was_visible {
                    assert_eq!(s.hidden_age, 0.0);
                    hidden_seen += 1;
                }
            }
            was_visible = s.visible;
        }
        assert!(hidden_seen > 5);
    }

    #[test]
    fn phases_follow_the_age() {
        let mut h = Harness::new(1);
        let mut s = Starburst::new(&mut h.rng, h.bounds);
        s.lifespan = 400.0;
        assert_eq!(s.phase(), StarPhase::Appearing);
        s.age = 200.0;
        assert_eq!(s.phase(), StarPhase::Steady);
        assert_eq!(s.fade(), 1.0);
        s.age = 370.0;
        assert_eq!(s.phase(), StarPhase::Disappearing);
        assert!((s.fade() - 0.5).abs() < 1e-6);
        s.age = 401.0;
        h.step(&mut s);
        assert_eq!(s.phase(), StarPhase::Hidden);
    }

    #[test]
    fn reappears_rerandomised() {
        let mut h = Harness::new(6);
        let mut s = Starburst::new(&mut h.rng, h.bounds);
        let before = (s.pos, s.lifespan);
        s.visible = false;
        s.hidden_age = s.hide_time;
        h.step(&mut s);
        assert_eq!(s.phase(), StarPhase::Appearing);
        assert_eq!(s.age, 0.0);
        assert_ne!((s.pos, s.lifespan), before);
    }
}
