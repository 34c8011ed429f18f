// Copyright @yucwang 2026

use crate::math::constants::{ Float, Vector2f };

/// 64-bit LCG; each path owns one.
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

// Largest f32 strictly below one.
const ONE_MINUS_EPSILON: Float = 0.99999994;

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        rng.next_u32();
        rng
    }

    /// Independent stream for a pixel; `index` is the pixel's linear index.
    pub fn for_pixel(seed: u64, index: u64) -> Self {
        Self::new(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_1d(&mut self) -> Float {
        ((self.next_u32() >> 8) as Float * (1.0 / 16_777_216.0)).min(ONE_MINUS_EPSILON)
    }

    pub fn next_2d(&mut self) -> Vector2f {
        let x = self.next_1d();
        let y = self.next_1d();
        Vector2f::new(x, y)
    }
}
