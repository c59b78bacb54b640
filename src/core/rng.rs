//! Xorshift32 - deterministic per-worker random stream
//!
//! Used only for seeding (hotspot placement), never inside a pass, so runs
//! with the same seed and layout are reproducible.

#[derive(Clone, Copy, Debug)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Zero is a fixed point of xorshift, so it is remapped.
    pub fn new(seed: u32) -> Self {
        Self { state: if seed == 0 { 0x9E37_79B9 } else { seed } }
    }

    /// Stream derived from a base seed and a worker id.
    pub fn for_worker(seed: u32, worker: usize) -> Self {
        Self::new(seed ^ (worker as u32).wrapping_add(1).wrapping_mul(0x85EB_CA6B))
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform value in `0..bound` (bound must be non-zero).
    #[inline]
    pub fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }
}
