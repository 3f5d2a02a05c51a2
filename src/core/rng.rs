// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};

#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generator for one shading point of one frame.
    pub fn for_point(frame_index: u64, point_index: u64) -> Self {
        let hi = hash_u32((frame_index as u32) ^ 0x9e37_79b9) as u64;
        let lo = hash_u32(point_index as u32 ^ hash_u32((point_index >> 32) as u32)) as u64;
        Self::new((hi << 32) | lo)
    }

    /// Generator keyed by a world position and a frame, so every lookup of the
    /// same point within a frame draws the same jitter.
    pub fn for_position(position: &Vector3f, frame_index: u64) -> Self {
        let mut h = hash_u32(frame_index as u32);
        for idx in 0..3 {
            h = hash_u32(h ^ position[idx].to_bits());
        }
        Self::new(((h as u64) << 32) | (frame_index & 0xffff_ffff))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    // Uniform in [0, 1)
    pub fn next_f32(&mut self) -> Float {
        (self.next_u32() >> 8) as Float * (1.0 / 16777216.0)
    }

    pub fn next_2d(&mut self) -> Vector2f {
        let x = self.next_f32();
        let y = self.next_f32();
        Vector2f::new(x, y)
    }

    // Uniform in [0, bound), bound > 0
    pub fn next_index(&mut self, bound: usize) -> usize {
        (((self.next_u32() as u64) * (bound as u64)) >> 32) as usize
    }
}

pub fn hash_u32(mut x: u32) -> u32 {
    x = ((x >> 16) ^ x).wrapping_mul(0x45d9f3b);
    x = ((x >> 16) ^ x).wrapping_mul(0x45d9f3b);
    (x >> 16) ^ x
}
