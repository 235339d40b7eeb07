//! The digest extension point: turn a key into a 64-bit value the bucket
//! indexer can split into two candidate buckets.
//!
//! The table is generic over `S: BuildHasher`, the same seam
//! `std::collections::HashMap<K, V, S>` exposes, so callers can plug in their
//! own hasher. [`FoldHashBuilder`] is the crate's own default: a cheap
//! multiply-xor-shift mixer seeded per-table, not exposed beyond this seam.

use std::hash::{BuildHasher, Hash, Hasher};

/// Mixes a `u64` key with a per-table seed into a well-distributed `u64` digest.
///
/// Carried over from the table variants this crate's eviction engine
/// replaces: same constant, same fold-by-xor-of-halves shape.
#[inline(always)]
pub(crate) fn fold_hash_fast(mut key: u64, seed: u64) -> u64 {
    const FOLD: u64 = 0x2d35_8dcc_aa6c_78a5;
    key ^= seed;
    let r = (key as u128) * FOLD as u128;
    ((r >> 64) as u64) ^ (r as u64)
}

/// [`Hasher`] backing [`FoldHashBuilder`].
///
/// Keys are reduced to a `u64` via `std::hash::Hash` first (through
/// [`Hasher::write`]'s default byte-folding), then mixed with
/// [`fold_hash_fast`]. This keeps the table generic over any `K: Hash + Eq`
/// while still only ever computing one 64-bit digest per key, per spec
/// §4.1 ("why two hash fragments, not two hash functions").
pub struct FoldHasher {
    seed: u64,
    state: u64,
}

impl Hasher for FoldHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        // Fold the byte stream into state the same way std's SipHasher does:
        // absorb 8 bytes at a time, then mix. We don't need cryptographic
        // strength here, only decent avalanche for the final fold.
        let mut chunks = bytes.chunks_exact(8);
        for chunk in &mut chunks {
            let word = u64::from_ne_bytes(chunk.try_into().unwrap());
            self.state = fold_hash_fast(self.state ^ word, self.seed);
        }
        let rem = chunks.remainder();
        if !rem.is_empty() {
            let mut buf = [0u8; 8];
            buf[..rem.len()].copy_from_slice(rem);
            let word = u64::from_ne_bytes(buf);
            self.state = fold_hash_fast(self.state ^ word, self.seed);
        }
    }

    #[inline]
    fn write_u64(&mut self, value: u64) {
        self.state = fold_hash_fast(self.state ^ value, self.seed);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }
}

/// A [`BuildHasher`] producing [`FoldHasher`]s seeded once per table.
///
/// This is the crate's default hasher, analogous to `RandomState` for
/// `std::collections::HashMap`: each table picks a fresh seed at
/// construction (from a private `fastrand::Rng`, the same seeding pattern
/// every table variant in the source benchmark crate used for its own
/// `seed` field) so that two tables over the same keys don't share a digest
/// schedule.
#[derive(Clone)]
pub struct FoldHashBuilder {
    seed: u64,
}

impl FoldHashBuilder {
    /// Builds a hasher builder from an explicit seed. Exposed for
    /// reproducible tests; most callers should use [`FoldHashBuilder::new`].
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// Builds a hasher builder seeded from process-local randomness.
    pub fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }
}

impl Default for FoldHashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildHasher for FoldHashBuilder {
    type Hasher = FoldHasher;

    fn build_hasher(&self) -> Self::Hasher {
        // `state` must not start out equal to `seed`: `fold_hash_fast`'s
        // first step is `key ^= seed`, so a single `write_u64(value)` from
        // `state == seed` computes `fold_hash_fast(seed ^ value, seed)`,
        // whose internal xor cancels `seed` straight back out, making the
        // digest of any one-word key independent of the seed.
        const STATE_INIT: u64 = 0x9e37_79b9_7f4a_7c15;
        FoldHasher {
            seed: self.seed,
            state: STATE_INIT,
        }
    }
}

/// Produces the 64-bit digest for a key under a given `BuildHasher`.
#[inline]
pub(crate) fn digest<K: Hash + ?Sized, S: BuildHasher>(key: &K, build: &S) -> u64 {
    let mut hasher = build.build_hasher();
    key.hash(&mut hasher);
    hasher.finish()
}
