use rand::Rng;
use std::f32::consts::TAU;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec2 {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Vec2 {
    pub(crate) const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn from_angle(a: f32) -> Self {
        Self::new(a.cos(), a.sin())
    }

    /// Unit vector in a uniformly random direction.
    pub(crate) fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_angle(rng.gen::<f32>() * TAU)
    }

    pub(crate) fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub(crate) fn dist(self, o: Vec2) -> f32 {
        (self - o).len()
    }

    pub(crate) fn dot(self, o: Vec2) -> f32 {
        self.x * o.x + self.y * o.y
    }

    pub(crate) fn heading(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub(crate) fn norm(self) -> Self {
        let l = self.len();
        if l <= 1e-6 {
            Self::ZERO
        } else {
            Self::new(self.x / l, self.y / l)
        }
    }

    pub(crate) fn limit(self, max_len: f32) -> Self {
        let l = self.len();
        if l > max_len {
            self.norm() * max_len
        } else {
            self
        }
    }

    pub(crate) fn lerp(self, o: Vec2, t: f32) -> Self {
        self + (o - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}
impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}
impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}
impl Div<f32> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}
impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Row-major 2x3 affine transform mapping local coordinates to canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Affine {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    tx: f32,
    ty: f32,
}

impl Affine {
    pub(crate) const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub(crate) fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    // Post-multiplied, so each call acts in the current local frame.
    pub(crate) fn then_translate(self, x: f32, y: f32) -> Self {
        Self {
            tx: self.a * x + self.b * y + self.tx,
            ty: self.c * x + self.d * y + self.ty,
            ..self
        }
    }

    pub(crate) fn then_rotate(self, angle: f32) -> Self {
        let (s, co) = angle.sin_cos();
        Self {
            a: self.a * co + self.b * s,
            b: -self.a * s + self.b * co,
            c: self.c * co + self.d * s,
            d: -self.c * s + self.d * co,
            ..self
        }
    }

    pub(crate) fn then_scale(self, sx: f32, sy: f32) -> Self {
        Self {
            a: self.a * sx,
            b: self.b * sy,
            c: self.c * sx,
            d: self.d * sy,
            ..self
        }
    }

    pub(crate) fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    pub(crate) fn det(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Average linear scale; used for stroke widths and point sizes.
    pub(crate) fn scale_factor(&self) -> f32 {
        self.det().abs().sqrt()
    }

    pub(crate) fn inverse(&self) -> Option<Affine> {
        let det = self.det();
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Some(Affine {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }
}

/// Linear re-map of `v` from `[a0,a1]` to `[b0,b1]`. A zero-width source
/// range maps everything to `b0`.
pub(crate) fn map_range(v: f32, a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    let span = a1 - a0;
    if span.abs() <= f32::EPSILON {
        return b0;
    }
    b0 + (v - a0) / span * (b1 - b0)
}

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).len() < 1e-4
    }

    #[test]
    fn norm_of_zero_stays_zero() {
        assert_eq!(Vec2::ZERO.norm(), Vec2::ZERO);
    }

    #[test]
    fn limit_caps_length() {
        let v = Vec2::new(3.0, 4.0).limit(1.0);
        assert!((v.len() - 1.0).abs() < 1e-5);
        assert_eq!(Vec2::new(0.1, 0.0).limit(1.0), Vec2::new(0.1, 0.0));
    }

    #[test]
    fn transforms_compose_in_local_frame() {
        let xf = Affine::IDENTITY
            .then_translate(10.0, 0.0)
            .then_rotate(FRAC_PI_2);
        // Rotated local +x points along canvas +y.
        assert!(close(xf.apply(Vec2::new(1.0, 0.0)), Vec2::new(10.0, 1.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let xf = Affine::scaling(0.25, 0.25)
            .then_translate(40.0, -3.0)
            .then_rotate(0.7)
            .then_scale(-1.0, 1.0);
        let inv = xf.inverse().expect("invertible");
        let p = Vec2::new(5.0, 9.0);
        assert!(close(inv.apply(xf.apply(p)), p));
        assert!((xf.scale_factor() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn map_range_handles_degenerate_span() {
        assert_eq!(map_range(3.0, 2.0, 2.0, 7.0, 9.0), 7.0);
        assert_eq!(map_range(4.5, 0.0, 9.0, 0.0, 255.0), 127.5);
    }
}
