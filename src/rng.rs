use xxhash_rust::xxh3::xxh3_64;

/// Derive a stable stream seed for one decorative element.
///
/// Keyed by (session seed, effect id, element index) so identical `t` yields
/// identical decorative state regardless of frame count or wall clock.
pub fn derive_seed(session_seed: u64, effect: &str, element: u64) -> u64 {
    let mut key = Vec::with_capacity(effect.len() + 16);
    key.extend_from_slice(&session_seed.to_le_bytes());
    key.extend_from_slice(effect.as_bytes());
    key.extend_from_slice(&element.to_le_bytes());
    xxh3_64(&key)
}

/// Small splitmix64 step generator for schedule-time choices (bass-note
/// picks, percussion accents). Decorative per-frame state never draws from a
/// stepped generator; it hashes instead.
#[derive(Clone, Debug)]
pub struct SeedRng(u64);

impl SeedRng {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.next_f64() as f32
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = (self.next_u64() % items.len() as u64) as usize;
        Some(&items[idx])
    }
}

/// Stateless hash-to-unit-interval, for effects that sample by element index.
pub fn unit_hash(seed: u64, lane: u64) -> f64 {
    let mut z = seed ^ lane.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}
