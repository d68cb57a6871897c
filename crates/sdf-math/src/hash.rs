//! Deterministic 64-bit content hashing.
//!
//! One mixing function serves both name dedup and name-shortening: an
//! FNV-1a variant (64-bit, standard offset-basis/prime) with a seed
//! parameter so a body hash can be mixed on top of a name hash
//! (`hash(body, seed=h_name)`). FNV-1a is picked over `std`'s
//! `DefaultHasher` because the latter's algorithm and output are explicitly
//! *not* guaranteed stable across Rust versions — the emitter's dedup law
//! needs the same input to always hash the same way, including across a
//! process restart and across CPU/GPU generation happening in different
//! runs.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash `bytes` starting from the standard FNV-1a offset basis.
#[must_use]
pub fn hash64(bytes: &[u8]) -> u64 {
    hash64_seeded(bytes, FNV_OFFSET_BASIS)
}

/// Hash `bytes` starting from an arbitrary seed, so a second hash can be
/// mixed on top of a first one (e.g. body hash seeded with the name hash).
#[must_use]
pub fn hash64_seeded(bytes: &[u8], seed: u64) -> u64 {
    let mut h = seed;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Hash a `str` (convenience over [`hash64`]).
#[must_use]
pub fn hash_str(s: &str) -> u64 {
    hash64(s.as_bytes())
}

/// Hash a `str` seeded on a prior hash (convenience over [`hash64_seeded`]).
#[must_use]
pub fn hash_str_seeded(s: &str, seed: u64) -> u64 {
    hash64_seeded(s.as_bytes(), seed)
}

/// Fold a 64-bit hash down to 32 bits for use inside an identifier, e.g. the
/// name-shortening pass's `<prefix><32-bit-hash-of-name-and-body>` alias.
#[must_use]
pub fn fold_to_u32(h: u64) -> u32 {
    ((h >> 32) ^ (h & 0xffff_ffff)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(hash_str("sphere_r1p0"), hash_str("sphere_r1p0"));
    }

    #[test]
    fn distinguishes_inputs() {
        assert_ne!(hash_str("sphere_r1p0"), hash_str("sphere_r1p1"));
    }

    #[test]
    fn seeded_hash_depends_on_seed() {
        let a = hash_str_seeded("body", 1);
        let b = hash_str_seeded("body", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_input_returns_seed() {
        assert_eq!(hash64_seeded(&[], 42), 42);
    }
}
