use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub(crate) const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Attach an alpha on the 0..=255 scale.
    pub(crate) fn alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r as f32,
            g: self.g as f32,
            b: self.b as f32,
            a: a.clamp(0.0, 255.0),
        }
    }

    pub(crate) fn opaque(self) -> Rgba {
        self.alpha(255.0)
    }

    pub(crate) fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let f = |a: u8, b: u8| -> u8 {
            ((a as f32) + (b as f32 - a as f32) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: f(self.r, other.r),
            g: f(self.g, other.g),
            b: f(self.b, other.b),
        }
    }

    /// Uniform shift of all channels, saturating.
    pub(crate) fn shifted(self, k: f32) -> Rgb {
        let f = |a: u8| -> u8 { (a as f32 + k).round().clamp(0.0, 255.0) as u8 };
        Rgb {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    /// HSB with hue in degrees and saturation/brightness in 0..=100.
    pub(crate) fn from_hsb(h: f32, s: f32, v: f32) -> Rgb {
        let h = h.rem_euclid(360.0) / 60.0;
        let s = (s / 100.0).clamp(0.0, 1.0);
        let v = (v / 100.0).clamp(0.0, 1.0);
        let c = v * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = v - c;
        let q = |t: f32| ((t + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(q(r), q(g), q(b))
    }
}

/// Straight (non-premultiplied) colour, channels and alpha in 0..=255.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rgba {
    pub(crate) r: f32,
    pub(crate) g: f32,
    pub(crate) b: f32,
    pub(crate) a: f32,
}

impl Rgba {
    pub(crate) fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            a: a.clamp(0.0, 255.0),
            ..self
        }
    }

    /// Scale alpha by a fade factor in `[0, 1]`.
    pub(crate) fn fade(self, k: f32) -> Rgba {
        self.with_alpha(self.a * k.clamp(0.0, 1.0))
    }
}

// Byzantine metallic palette.
pub(crate) const GOLD: [Rgb; 18] = [
    Rgb::new(0xB8, 0x86, 0x0B),
    Rgb::new(0xCF, 0xB5, 0x3B),
    Rgb::new(0xD4, 0xAF, 0x37),
    Rgb::new(0xE6, 0xBE, 0x8A),
    Rgb::new(0xB8, 0x73, 0x33),
    Rgb::new(0xCD, 0x7F, 0x32),
    Rgb::new(0x99, 0x65, 0x15),
    Rgb::new(0x80, 0x00, 0x20),
    Rgb::new(0xDA, 0xA5, 0x20),
    Rgb::new(0x8B, 0x45, 0x13),
    Rgb::new(0xFF, 0xD7, 0x00),
    Rgb::new(0xC1, 0x9A, 0x6B),
    Rgb::new(0xE6, 0xC1, 0x9C),
    Rgb::new(0xAE, 0x8F, 0x60),
    Rgb::new(0xD4, 0xAF, 0x37),
    Rgb::new(0x9C, 0x7C, 0x38),
    Rgb::new(0x96, 0x71, 0x17),
    Rgb::new(0x6B, 0x44, 0x23),
];

// Dark accents for contrast.
pub(crate) const ACCENT: [Rgb; 8] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0x4A, 0x04, 0x04),
    Rgb::new(0x2C, 0x18, 0x10),
    Rgb::new(0x1E, 0x1E, 0x1E),
    Rgb::new(0x80, 0x00, 0x20),
    Rgb::new(0x4B, 0x00, 0x82),
    Rgb::new(0x2F, 0x4F, 0x4F),
    Rgb::new(0x19, 0x19, 0x70),
];

pub(crate) fn pick<R: Rng + ?Sized>(rng: &mut R, set: &[Rgb]) -> Rgb {
    set[rng.gen_range(0..set.len())]
}

pub(crate) fn gold<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    pick(rng, &GOLD)
}

pub(crate) fn accent<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
    pick(rng, &ACCENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsb_primaries() {
        assert_eq!(Rgb::from_hsb(0.0, 100.0, 100.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsb(120.0, 100.0, 100.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsb(240.0, 100.0, 100.0), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hsb(360.0, 0.0, 100.0), Rgb::WHITE);
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(Rgb::WHITE.alpha(400.0).a, 255.0);
        assert_eq!(Rgb::WHITE.alpha(-3.0).a, 0.0);
    }

    #[test]
    fn fade_scales_alpha_only() {
        let c = Rgb::new(10, 20, 30).alpha(200.0);
        let half = c.fade(0.5);
        assert_eq!(half.a, 100.0);
        assert_eq!((half.r, half.g, half.b), (10.0, 20.0, 30.0));
        assert_eq!(c.fade(1.7).a, 200.0);
        assert_eq!(c.fade(-1.0).a, 0.0);
    }

    #[test]
    fn shifted_saturates() {
        assert_eq!(Rgb::new(250, 5, 100).shifted(10.0), Rgb::new(255, 15, 110));
        assert_eq!(Rgb::new(250, 5, 100).shifted(-10.0), Rgb::new(240, 0, 90));
    }
}
