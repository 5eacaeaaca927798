use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::render::cache::FrameKey;

const XXH3_SEED: u64 = 0x51d3_ca57_9e0f_2b71;

/// 128-bit stable fingerprint of a [`FrameKey`].
///
/// Stable across runs and platforms; used for log fields and frame file names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl fmt::Display for FrameFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

pub(crate) fn fingerprint_key(key: &FrameKey) -> FrameFingerprint {
    let mut h = StableHasher::new();
    h.write_str(&key.text);
    h.write_u32(key.duration_secs);
    h.write_bytes(&[key.color.r, key.color.g, key.color.b]);
    h.write_str(key.size_class.as_str());
    h.write_bool(key.uppercase);
    h.write_u32(key.width);
    h.write_u32(key.height);
    h.write_str(&key.font_family);
    h.write_str(&key.font_class);
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_bytes(&[u8::from(v)]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    // Length-prefixed so adjacent strings cannot alias.
    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    fn finish(self) -> FrameFingerprint {
        let v = self.inner.digest128();
        FrameFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fingerprint.rs"]
mod tests;
