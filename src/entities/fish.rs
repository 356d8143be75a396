use super::{Bounds, Entity, FrameCtx, RenderCtx};
use crate::canvas::{BlendMode, Painter};
use crate::geom::{lerp, map_range, Vec2};
use crate::palette::{self, Rgb, Rgba};
use rand::Rng;
use std::f32::consts::{PI, TAU};

const WRAP_MARGIN: f32 = 50.0;
pub(crate) const BOTTOM_MARGIN: f32 = 100.0;
const STEER_LIMIT: f32 = 0.15;
const ACCEL_SCALE: f32 = 0.25;
const SINK_CORRECTION: f32 = 0.03;

#[derive(Clone, Debug)]
pub(crate) struct Fish {
    pub(crate) id: usize,
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) size: f32,
    pub(crate) max_speed: f32,
    tail_speed: f32,
    tail_angle: f32,
    noise_x: f32,
    noise_y: f32,

    color: Rgb,
    pattern_color: Rgb,
    accent_color: Rgb,
    highlight: Rgb,

    fin_offset: f32,
    top_fin_offset: f32,
    pattern_offset: f32,
    shimmer_offset: f32,
    spot_size: f32,
    edge_width: f32,

    has_back_fin: bool,
    has_top_fin: bool,
    has_spirals: bool,
    has_gold_spots: bool,
    has_metallic_edge: bool,
}

/// Weight of one neighbour's push: 1 when touching, falling quadratically to
/// 0 at `desired`.
pub(crate) fn repulsion_weight(d: f32, desired: f32) -> f32 {
    let s = map_range(d, 0.0, desired, 1.0, 0.0).clamp(0.0, 1.0);
    s * s
}

impl Fish {
    pub(crate) fn new<R: Rng + ?Sized>(
        id: usize,
        rng: &mut R,
        pos: Vec2,
        size: f32,
        noise_x: f32,
        noise_y: f32,
        tail_speed: f32,
    ) -> Self {
        let by_size = |lo: f32, hi: f32| map_range(size, 60.0, 200.0, lo, hi);

        let vel = Vec2::random_unit(rng) * by_size(0.3, 0.15);
        let color = Rgb::from_hsb(
            rng.gen_range(0.0..360.0),
            rng.gen_range(70.0..100.0),
            rng.gen_range(70.0..100.0),
        );

        Self {
            id,
            pos,
            vel,
            size,
            max_speed: by_size(0.4, 0.25),
            tail_speed: tail_speed * by_size(0.5, 0.3),
            tail_angle: 0.0,
            noise_x,
            noise_y,
            color,
            fin_offset: rng.gen_range(0.0..TAU),
            has_back_fin: rng.gen::<f32>() < by_size(0.3, 0.7),
            has_top_fin: rng.gen::<f32>() < by_size(0.3, 0.7),
            top_fin_offset: rng.gen_range(0.0..TAU),
            has_spirals: rng.gen::<f32>() < by_size(0.3, 0.5),
            has_gold_spots: rng.gen::<f32>() < by_size(0.4, 0.6),
            pattern_color: palette::gold(rng),
            accent_color: palette::accent(rng),
            pattern_offset: rng.gen_range(0.0..TAU),
            spot_size: rng.gen_range(size * 0.05..size * 0.1),
            shimmer_offset: rng.gen_range(0.0..1000.0),
            highlight: palette::gold(rng),
            has_metallic_edge: rng.gen::<f32>() < by_size(0.5, 0.8),
            edge_width: rng.gen_range(size * 0.03..size * 0.06),
        }
    }

    /// Populate `n` fish on a loose three-column grid with three size classes.
    pub(crate) fn school<R: Rng + ?Sized>(n: usize, rng: &mut R, bounds: Bounds) -> Vec<Fish> {
        let rows = (n as f32 / 3.0).ceil();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let row = (i / 3) as f32;
            let col = (i % 3) as f32;
            let x = map_range(col, 0.0, 2.0, bounds.w * 0.2, bounds.w * 0.8)
                + rng.gen_range(-50.0..50.0);
            let y = map_range(row, 0.0, rows - 1.0, bounds.h * 0.2, bounds.h * 0.6)
                + rng.gen_range(-50.0..50.0);

            let class = rng.gen::<f32>();
            let size = if class < 0.3 {
                rng.gen_range(60.0..100.0)
            } else if class < 0.7 {
                rng.gen_range(100.0..160.0)
            } else {
                rng.gen_range(160.0..200.0)
            };
            let nx = rng.gen_range(0.0..1000.0);
            let ny = rng.gen_range(0.0..1000.0);
            let tail = rng.gen_range(0.02..0.04);
            out.push(Fish::new(i, rng, Vec2::new(x, y), size, nx, ny, tail));
        }
        out
    }

    pub(crate) fn desired_separation(&self) -> f32 {
        self.size * 3.0
    }

    /// Steering force away from crowding neighbours in `school`.
    pub(crate) fn separation(&self, school: &[Vec2]) -> Vec2 {
        let desired = self.desired_separation();
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;

        for (j, &other) in school.iter().enumerate() {
            if j == self.id {
                continue;
            }
            let d = self.pos.dist(other);
            if d < desired {
                sum += (self.pos - other).norm() * repulsion_weight(d, desired);
                count += 1;
            }
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        let target = (sum / count as f32).norm() * self.max_speed;
        (target - self.vel).limit(STEER_LIMIT)
    }

    fn body_outline(&self, ctx: &RenderCtx<'_>) -> Vec<Vec2> {
        let s = self.size;
        let t = ctx.frame * 0.02;
        let top = -s / 4.0 * (1.0 + ctx.noise.get(t) * 0.2);
        let bottom = s / 4.0 * (1.0 + ctx.noise.get(t + 1.0) * 0.2);
        closed_spline(
            &[
                Vec2::new(s / 2.0, 0.0),
                Vec2::new(0.0, top),
                Vec2::new(-s / 2.0, 0.0),
                Vec2::new(0.0, bottom),
            ],
            8,
        )
    }

    fn draw_fin(&self, p: &mut Painter<'_>, at: Vec2, angle: f32, tip: Vec2, back: Vec2) {
        p.push();
        p.translate(at.x, at.y);
        p.rotate(angle);
        p.fill_triangle(Vec2::ZERO, tip, back, self.color.opaque());
        let edge = Rgb::WHITE.alpha(240.0);
        p.line(Vec2::ZERO, tip, 1.0, edge);
        p.line(tip, back, 1.0, edge);
        p.pop();
    }

    fn draw_shimmer(&self, p: &mut Painter<'_>, frame: f32) {
        let s = self.size;
        p.push();
        p.set_blend(BlendMode::Screen);

        let t = frame * 0.03 + self.shimmer_offset;
        for i in 0..5 {
            let k = i as f32;
            let opacity = map_range((t + k).sin(), -1.0, 1.0, 10.0, 40.0);
            let c = Vec2::new((t + k).cos() * s * 0.2, (t + k * 0.7).sin() * s * 0.1);
            let d = s * (0.1 + (t + k).sin() * 0.05);
            p.fill_circle(c, d, self.highlight.alpha(opacity));
        }

        for i in 0..8 {
            let micro = frame * 0.05 + i as f32 + self.shimmer_offset;
            let opacity = map_range(micro.sin(), -1.0, 1.0, 5.0, 20.0);
            let c = Vec2::new((micro * 1.5).cos() * s * 0.15, (micro * 0.8).sin() * s * 0.15);
            p.fill_circle(c, s * 0.05, Rgb::WHITE.alpha(opacity));
        }

        let streak_t = frame * 0.02 + self.shimmer_offset;
        let peak = Rgb::new(255, 255, 220).alpha(map_range(streak_t.sin(), -1.0, 1.0, 10.0, 30.0));
        let clear = peak.with_alpha(0.0);
        for i in 0..3 {
            let x = map_range((streak_t + i as f32).sin(), -1.0, 1.0, -s * 0.3, s * 0.3);
            let half = s * 0.2;
            let a = Vec2::new(x - half, -s * 0.1);
            let b = Vec2::new(x + half, s * 0.1);
            let mid = a.lerp(b, 0.5);
            p.line_gradient(a, mid, 1.0, clear, peak);
            p.line_gradient(mid, b, 1.0, peak, clear);
        }
        p.pop();
    }
}

impl Entity for Fish {
    fn advance(&mut self, ctx: &mut FrameCtx<'_>) {
        let dt = ctx.dt;
        let frame = ctx.frame;

        self.tail_angle = (frame * self.tail_speed * 0.6).sin() * PI / 8.0
            * (0.8 + ctx.noise.get(frame * 0.05) * 0.4);

        let flow_angle = ctx.noise.get2(self.noise_x, self.noise_y) * TAU * 2.0;
        let flow_strength = ctx.noise.get2(self.noise_x + 1000.0, self.noise_y + 1000.0) * 0.035;
        let mut acc = Vec2::from_angle(flow_angle) * flow_strength;
        acc += self.separation(ctx.school);
        acc = acc * ACCEL_SCALE;

        self.vel = (self.vel + acc * dt).limit(self.max_speed);

        let bottom = ctx.bounds.h - BOTTOM_MARGIN;
        let mut next = self.pos + self.vel * dt;
        if next.y > bottom {
            self.vel.y -= SINK_CORRECTION * dt;
            next.y = bottom;
        }
        self.pos = next;

        self.noise_x += 0.002 * dt;
        self.noise_y += 0.002 * dt;

        let w = ctx.bounds.w;
        if self.pos.x < -WRAP_MARGIN {
            self.pos.x = w + WRAP_MARGIN;
        } else if self.pos.x > w + WRAP_MARGIN {
            self.pos.x = -WRAP_MARGIN;
        }
        if self.pos.y < -WRAP_MARGIN {
            self.pos.y = bottom;
        }
    }

    fn render(&self, p: &mut Painter<'_>, ctx: &RenderCtx<'_>) {
        let s = self.size;
        let frame = ctx.frame;

        p.push();
        p.translate(self.pos.x, self.pos.y);
        // Mirror rather than rotate so the fish stays upright.
        if self.vel.heading().abs() > PI / 2.0 {
            p.scale(-1.0, 1.0);
        }

        let outline = self.body_outline(ctx);
        let hue_shift = ctx.noise.get(frame * 0.01 + self.noise_x) * 20.0 - 10.0;
        p.fill_polygon(&outline, self.color.shifted(hue_shift).alpha(220.0));
        p.polyline(&outline, 1.5, Rgb::WHITE.alpha(100.0), true);

        if self.has_metallic_edge {
            p.push();
            p.set_blend(BlendMode::Add);
            let edge_t = frame * 0.02 + self.shimmer_offset;
            let opacity = map_range(edge_t.sin(), -1.0, 1.0, 100.0, 200.0);
            p.polyline(&outline, self.edge_width, self.highlight.alpha(opacity), true);
            p.pop();
        }

        let fin_wave = (frame * 0.1 + self.fin_offset).sin() * 0.2;
        let top_wave = (frame * 0.12 + self.top_fin_offset).sin() * 0.15;
        if self.has_top_fin {
            self.draw_fin(
                p,
                Vec2::new(0.0, -s * 0.3),
                -PI / 2.0 + top_wave + PI / 18.0,
                Vec2::new(s * 0.15, -s * 0.2),
                Vec2::new(-s * 0.1, -s * 0.15),
            );
        }
        if self.has_back_fin {
            self.draw_fin(
                p,
                Vec2::new(-s * 0.3, -s * 0.2),
                -PI / 8.0 - PI / 2.0 + fin_wave * 0.6 - PI / 12.0,
                Vec2::new(s * 0.2, -s * 0.12),
                Vec2::new(-s * 0.1, -s * 0.06),
            );
        }

        if self.has_spirals {
            let t = frame * 0.01 + self.pattern_offset;
            let mut pts = Vec::with_capacity(64);
            let mut a = 0.0f32;
            while a < TAU * 2.0 {
                let r = (1.0 + (a + t).sin()) * s * 0.06;
                pts.push(Vec2::from_angle(a) * r);
                a += 0.2;
            }
            p.polyline(&pts, 1.0, self.pattern_color.opaque(), false);
        }

        if self.has_gold_spots {
            let t = frame * 0.02 + self.pattern_offset;
            for i in 0..5 {
                let k = i as f32;
                let c = Vec2::new(lerp(-s * 0.3, s * 0.3, k / 4.0), (t + k).sin() * s * 0.1);
                let d = self.spot_size * (0.8 + (t + k * 0.5).sin() * 0.2);
                p.fill_circle(c, d, self.pattern_color.opaque());
            }
            for i in 0..3 {
                let k = i as f32;
                let c = Vec2::new(lerp(-s * 0.25, s * 0.25, k / 2.0), (t + k).cos() * s * 0.08);
                p.fill_circle(c, self.spot_size * 0.6, self.accent_color.opaque());
            }
        }

        self.draw_shimmer(p, frame);

        p.push();
        p.translate(-s / 2.0, 0.0);
        p.rotate(self.tail_angle);
        let tail = [
            Vec2::ZERO,
            Vec2::new(-s / 4.0, -s / 6.0),
            Vec2::new(-s / 4.0, s / 6.0),
        ];
        p.fill_polygon(&tail, self.color.opaque());
        p.polyline(&tail, 1.5, Rgb::WHITE.alpha(100.0), true);
        p.pop();

        let eye = Vec2::new(s / 3.0, -s / 12.0);
        p.fill_circle(eye, s / 15.0, Rgb::WHITE.opaque());
        p.fill_circle(eye, s / 30.0, Rgb::BLACK.opaque());

        let gill: Rgba = Rgb::WHITE.opaque();
        p.line(Vec2::new(s / 6.0, -s / 8.0), Vec2::new(s / 6.0, s / 8.0), 1.0, gill);
        p.line(Vec2::new(s / 4.0, -s / 10.0), Vec2::new(s / 4.0, s / 10.0), 1.0, gill);

        p.pop();
    }
}

/// Sample a closed Catmull-Rom loop through `ctrl`.
fn closed_spline(ctrl: &[Vec2], per_segment: usize) -> Vec<Vec2> {
    let n = ctrl.len();
    let mut out = Vec::with_capacity(n * per_segment);
    for i in 0..n {
        let p0 = ctrl[(i + n - 1) % n];
        let p1 = ctrl[i];
        let p2 = ctrl[(i + 1) % n];
        let p3 = ctrl[(i + 2) % n];
        for k in 0..per_segment {
            let t = k as f32 / per_segment as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let point = (p1 * 2.0
                + (p2 - p0) * t
                + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
                + (-p0 + p1 * 3.0 - p2 * 3.0 + p3) * t3)
                * 0.5;
            out.push(point);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::Harness;
    use rand::{rngs::StdRng, SeedableRng};

    fn fish_at(id: usize, pos: Vec2, size: f32) -> Fish {
        let mut rng = StdRng::seed_from_u64(id as u64 + 1);
        Fish::new(id, &mut rng, pos, size, 10.0, 20.0, 0.03)
    }

    #[test]
    fn repulsion_falls_with_distance() {
        let desired = 300.0;
        let mut prev = f32::INFINITY;
        for d in (0..300).step_by(10) {
            let w = repulsion_weight(d as f32, desired);
            assert!(w < prev, "not decreasing at {d}");
            prev = w;
        }
        assert_eq!(repulsion_weight(0.0, desired), 1.0);
        assert_eq!(repulsion_weight(desired, desired), 0.0);
    }

    #[test]
    fn coincident_pair_yields_bounded_steer() {
        let p = Vec2::new(400.0, 300.0);
        let a = fish_at(0, p, 100.0);
        let b = fish_at(1, p, 100.0);
        let school = [a.pos, b.pos];
        let steer = a.separation(&school);
        assert!(steer.x.is_finite() && steer.y.is_finite());
        assert!(steer.len() <= STEER_LIMIT + 1e-6);
    }

    #[test]
    fn lone_fish_feels_no_push() {
        let a = fish_at(0, Vec2::new(10.0, 10.0), 80.0);
        let far = Vec2::new(5000.0, 5000.0);
        assert_eq!(a.separation(&[a.pos, far]), Vec2::ZERO);
    }

    #[test]
    fn closer_neighbour_pushes_harder_before_normalising() {
        let a = fish_at(0, Vec2::new(0.0, 0.0), 100.0);
        let near = (a.pos - Vec2::new(40.0, 0.0)).norm() * repulsion_weight(40.0, 300.0);
        let far = (a.pos - Vec2::new(200.0, 0.0)).norm() * repulsion_weight(200.0, 300.0);
        assert!(near.len() > far.len());
    }

    #[test]
    fn steering_points_away_from_a_close_neighbour() {
        for gap in [2.0, 20.0] {
            let mut a = fish_at(0, Vec2::new(500.0, 400.0), 100.0);
            a.vel = Vec2::ZERO;
            let school = [a.pos, a.pos + Vec2::new(gap, 0.0)];
            let steer = a.separation(&school);
            assert!(steer.len() > 0.0, "no push at gap {gap}");
            assert!(steer.x < 0.0, "push toward neighbour at gap {gap}");
            assert!(steer.y.abs() < 1e-6);
            assert!(steer.len() <= STEER_LIMIT + 1e-6);
        }
    }

    #[test]
    fn positions_stay_inside_wrap_bounds() {
        let mut h = Harness::new(11);
        let mut school = Fish::school(16, &mut h.rng, h.bounds);
        for _ in 0..2000 {
            h.school = school.iter().map(|f| f.pos).collect();
            for f in &mut school {
                h.step(f);
            }
            for f in &school {
                assert!(f.pos.x >= -WRAP_MARGIN && f.pos.x <= h.bounds.w + WRAP_MARGIN);
                assert!(f.pos.y >= -WRAP_MARGIN && f.pos.y <= h.bounds.h - BOTTOM_MARGIN);
                assert!(f.vel.len() <= f.max_speed + 1e-3 + SINK_CORRECTION);
            }
        }
    }

    #[test]
    fn sinking_fish_is_pushed_back_up() {
        let mut h = Harness::new(3);
        let bottom = h.bounds.h - BOTTOM_MARGIN;
        let mut f = fish_at(0, Vec2::new(300.0, bottom), 120.0);
        f.vel = Vec2::new(0.0, f.max_speed);
        h.school = vec![f.pos];
        let before = f.vel.y;
        h.step(&mut f);
        assert!(f.pos.y <= bottom);
        assert!(f.vel.y < before);
    }

    #[test]
    fn school_is_reproducible_from_seed() {
        let bounds = Bounds::new(1000.0, 700.0);
        let a = Fish::school(7, &mut StdRng::seed_from_u64(5), bounds);
        let b = Fish::school(7, &mut StdRng::seed_from_u64(5), bounds);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.size, y.size);
        }
        assert!(a.iter().all(|f| (60.0..200.0).contains(&f.size)));
    }

    #[test]
    fn single_row_school_does_not_divide_by_zero() {
        let fish = Fish::school(2, &mut StdRng::seed_from_u64(1), Bounds::new(800.0, 600.0));
        assert!(fish.iter().all(|f| f.pos.y.is_finite()));
    }

    #[test]
    fn spline_passes_through_controls() {
        let ctrl = [
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ];
        let pts = closed_spline(&ctrl, 4);
        assert_eq!(pts.len(), 16);
        assert!((pts[0] - ctrl[0]).len() < 1e-5);
        assert!((pts[4] - ctrl[1]).len() < 1e-5);
    }
}
