// ------------------------------
// Small deterministic noise
// ------------------------------

fn hash_u32(mut x: u32) -> u32 {
    // xorshift-ish
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846ca68b);
    x ^= x >> 16;
    x
}

fn hash2(x: i32, y: i32, seed: u32) -> u32 {
    hash_u32(seed ^ (x as u32).wrapping_mul(0x9e3779b1) ^ (y as u32).wrapping_mul(0x85ebca6b))
}

fn rand01_from_hash(h: u32) -> f32 {
    // 24-bit mantissa style
    ((h & 0x00FF_FFFF) as f32) / 16_777_215.0
}

fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn value_noise2(x: f32, y: f32, seed: u32) -> f32 {
    let xi = x.floor() as i32;
    let yi = y.floor() as i32;
    let xf = x - xi as f32;
    let yf = y - yi as f32;

    let h00 = rand01_from_hash(hash2(xi, yi, seed));
    let h10 = rand01_from_hash(hash2(xi.wrapping_add(1), yi, seed));
    let h01 = rand01_from_hash(hash2(xi, yi.wrapping_add(1), seed));
    let h11 = rand01_from_hash(hash2(xi.wrapping_add(1), yi.wrapping_add(1), seed));

    let u = fade(xf);
    let v = fade(yf);

    let x0 = h00 + (h10 - h00) * u;
    let x1 = h01 + (h11 - h01) * u;
    x0 + (x1 - x0) * v
}

/// Seeded smooth noise in `[0, 1]`, four octaves with halving amplitude.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Noise {
    seed: u32,
}

impl Noise {
    const OCTAVES: u32 = 4;

    pub(crate) fn new(seed: u64) -> Self {
        Self {
            seed: hash_u32((seed as u32) ^ ((seed >> 32) as u32)),
        }
    }

    pub(crate) fn get(&self, x: f32) -> f32 {
        self.get2(x, 0.0)
    }

    pub(crate) fn get2(&self, mut x: f32, mut y: f32) -> f32 {
        let mut amp = 0.5;
        let mut sum = 0.0;
        let mut norm = 0.0;
        for i in 0..Self::OCTAVES {
            let s = self.seed.wrapping_add(i.wrapping_mul(1013));
            sum += value_noise2(x, y, s) * amp;
            norm += amp;
            x *= 2.0;
            y *= 2.0;
            amp *= 0.5;
        }
        (sum / norm).clamp(0.0, 1.0)
    }
}

/// Stateless per-frame jitter in `[0, 1)`, for draw-time variation that must
/// not consume the simulation RNG.
pub(crate) fn jitter(seed: u32, a: u32, b: u32) -> f32 {
    let h = hash_u32(seed ^ a.wrapping_mul(0x9e3779b1) ^ hash_u32(b.wrapping_add(0x632b_e5ab)));
    ((h >> 8) as f32) / 16_777_216.0
}
