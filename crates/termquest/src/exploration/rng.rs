//! Randomness for the tile walk
//!
//! Two sources: [`tile_hash`]/[`tile_fraction`] give every `(x, y)` of a zone
//! a fixed value so the map looks the same on every render, and [`Rng`] drives
//! everything that should differ between plays (zone choice, events, dialogue).

/// Seed of a zone's tile layout, a 31-polynomial hash of its name.
pub fn zone_seed(name: &str) -> u32 {
    name.chars()
        .fold(0u32, |seed, c| seed.wrapping_mul(31).wrapping_add(c as u32))
}

/// Stable per-tile hash.
pub fn tile_hash(x: i32, y: i32, seed: u32) -> u32 {
    (x as u32).wrapping_mul(73_856_093) ^ (y as u32).wrapping_mul(19_349_663) ^ seed
}

/// One LCG step over the tile hash, scaled into `[0, 1)`.
pub fn tile_fraction(hash: u32) -> f64 {
    let v = hash.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    f64::from(v) / 4_294_967_296.0
}

/// xorshift64* generator.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn from_seed(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Index into a slice of `len` elements. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    pub fn roll_range(&mut self, lo: i32, hi_inclusive: i32) -> i32 {
        debug_assert!(lo <= hi_inclusive);
        let span = (hi_inclusive - lo + 1) as u64;
        lo + (self.next_u64() % span) as i32
    }
}
