//! The table itself: lookup, upsert, remove, the bounded-BFS displacement
//! engine, and rehash.

use std::collections::VecDeque;
use std::hash::{BuildHasher, Hash};

use crate::cell::CellStore;
use crate::error::CuckooError;
use crate::hash::{digest, FoldHashBuilder};
use crate::index::candidates;

/// The result of [`Table::put`]: whether the key was freshly inserted, or
/// already present (carrying the value it had before the overwrite).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome<V> {
    /// The key was not previously present; it now is.
    Inserted,
    /// The key was already present; its value has been replaced. Carries
    /// the value it held before this call.
    Updated(V),
}

impl<V> PutOutcome<V> {
    /// True iff this call inserted a brand new key.
    pub fn is_inserted(&self) -> bool {
        matches!(self, PutOutcome::Inserted)
    }
}

/// A two-choice cuckoo hash table.
///
/// Every key lives in exactly one of two candidate buckets, one per half of
/// the bucket space (see the crate-level docs for the layout). Lookup is
/// `O(B)` worst case; insertion is expected amortized `O(1)`, backed by a
/// bounded breadth-first eviction search that falls back to a doubling
/// rehash when the search budget is exhausted.
pub struct Table<K, V, S = FoldHashBuilder> {
    store: CellStore<K, V>,
    len: usize,
    build_hasher: S,
}

impl<K, V> Table<K, V, FoldHashBuilder> {
    /// Default initial bucket count (`m` in the literature).
    pub const DEFAULT_NUM_BUCKETS: usize = 1024;
    /// Default cells per bucket (`b` in the literature).
    pub const DEFAULT_CELLS_PER_BUCKET: usize = 4;

    /// Builds a table with the default geometry (`m=1024`, `b=4`).
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_NUM_BUCKETS, Self::DEFAULT_CELLS_PER_BUCKET)
    }

    /// Builds a table with `num_buckets` buckets of `cells_per_bucket` cells
    /// each. `num_buckets` must be a positive even number.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. Use
    /// [`Table::try_with_capacity`] to handle this as a recoverable error.
    pub fn with_capacity(num_buckets: usize, cells_per_bucket: usize) -> Self {
        match Self::try_with_capacity(num_buckets, cells_per_bucket) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible sibling of [`Table::with_capacity`].
    pub fn try_with_capacity(
        num_buckets: usize,
        cells_per_bucket: usize,
    ) -> Result<Self, CuckooError> {
        Self::try_with_capacity_and_hasher(num_buckets, cells_per_bucket, FoldHashBuilder::new())
    }
}

impl<K, V> Default for Table<K, V, FoldHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S: BuildHasher> Table<K, V, S> {
    /// The displacement search's bounded dequeue budget (`CYCLES` in the
    /// literature). Fixed by design, not a runtime knob.
    pub const DISPLACEMENT_BUDGET: usize = 500;

    /// How many times `rehash` is allowed to double the bucket count while
    /// chasing a single stubborn insert before giving up with
    /// [`CuckooError::CapacityExhausted`].
    const MAX_REHASH_CASCADES: usize = 32;

    /// Builds a table using an explicit [`BuildHasher`], for callers that
    /// want to supply their own digest source.
    pub fn try_with_capacity_and_hasher(
        num_buckets: usize,
        cells_per_bucket: usize,
        build_hasher: S,
    ) -> Result<Self, CuckooError> {
        if num_buckets == 0 || num_buckets % 2 != 0 {
            return Err(CuckooError::InvalidConfig {
                reason: format!(
                    "bucket count must be a positive even number, got {num_buckets}"
                ),
            });
        }
        if cells_per_bucket == 0 {
            return Err(CuckooError::InvalidConfig {
                reason: "cells per bucket must be positive".to_string(),
            });
        }
        Ok(Self {
            store: CellStore::new(num_buckets, cells_per_bucket),
            len: 0,
            build_hasher,
        })
    }

    /// Number of live entries.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True iff the table holds no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count (`M`); doubles on every rehash.
    #[inline(always)]
    pub fn num_buckets(&self) -> usize {
        self.store.num_buckets()
    }

    /// Cells per bucket (`B`); fixed for the table's lifetime.
    #[inline(always)]
    pub fn cells_per_bucket(&self) -> usize {
        self.store.cells_per_bucket()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Table<K, V, S> {
    #[inline(always)]
    fn candidate_buckets(&self, key: &K) -> (usize, usize) {
        let d = digest(key, &self.build_hasher);
        candidates(d, self.store.num_buckets())
    }

    fn find_key(&self, bucket: usize, key: &K) -> Option<usize> {
        self.store
            .bucket_range(bucket)
            .find(|&idx| matches!(self.store.get(idx), Some((k, _)) if k == key))
    }

    fn find_empty(&self, bucket: usize) -> Option<usize> {
        self.store
            .bucket_range(bucket)
            .find(|&idx| self.store.get(idx).is_none())
    }

    /// Membership by the key's `Eq` relation, not identity.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Looks up `key`. `O(B)` worst case, independent of `len()`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let (b1, b2) = self.candidate_buckets(key);
        for bucket in [b1, b2] {
            for idx in self.store.bucket_range(bucket) {
                if let Some((k, v)) = self.store.get(idx) {
                    if k == key {
                        return Some(v);
                    }
                }
            }
        }
        None
    }

    /// Mutable sibling of [`Table::get`].
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (b1, b2) = self.candidate_buckets(key);
        for bucket in [b1, b2] {
            for idx in self.store.bucket_range(bucket) {
                if matches!(self.store.get(idx), Some((k, _)) if k == key) {
                    return self.store.get_mut(idx).as_mut().map(|(_, v)| v);
                }
            }
        }
        None
    }

    /// [`Table::get`], surfacing a miss as [`CuckooError::NotFound`] rather
    /// than `None`.
    pub fn try_get(&self, key: &K) -> Result<&V, CuckooError> {
        self.get(key).ok_or(CuckooError::NotFound)
    }

    fn replace_value(&mut self, idx: usize, value: V) -> V {
        let (k, old) = self.store.take(idx).expect("cell must be occupied");
        self.store.put_at(idx, Some((k, value)));
        old
    }

    /// Tries to place `key`/`value` without touching anything outside
    /// `key`'s two candidate buckets (and whatever the displacement search
    /// reaches from them). Returns the pair back on budget exhaustion so
    /// the caller — the sole owner of the pending insert — can rehash and
    /// retry exactly once.
    fn attempt_put(&mut self, key: K, value: V) -> Result<PutOutcome<V>, (K, V)> {
        let (b1, b2) = self.candidate_buckets(&key);

        if let Some(idx) = self.find_key(b1, &key) {
            return Ok(PutOutcome::Updated(self.replace_value(idx, value)));
        }
        if let Some(idx) = self.find_key(b2, &key) {
            return Ok(PutOutcome::Updated(self.replace_value(idx, value)));
        }

        if let Some(idx) = self.find_empty(b1) {
            self.store.put_at(idx, Some((key, value)));
            self.len += 1;
            return Ok(PutOutcome::Inserted);
        }
        if let Some(idx) = self.find_empty(b2) {
            self.store.put_at(idx, Some((key, value)));
            self.len += 1;
            return Ok(PutOutcome::Inserted);
        }

        self.displace(b1, b2, key, value)
    }

    /// The displacement engine: a bounded breadth-first search over the
    /// cuckoo dependency graph for a cell we can vacate by shifting a chain
    /// of residents one step each, per spec §4.6.
    ///
    /// Each BFS frontier entry is an index into a flat arena of
    /// `(cell, parent)` records rather than a copied path — per Design
    /// Notes, this keeps per-probe cost `O(1)` and avoids heap churn even
    /// though the frontier can grow to hundreds of entries before the
    /// budget is spent.
    fn displace(&mut self, b1: usize, b2: usize, key: K, value: V) -> Result<PutOutcome<V>, (K, V)> {
        struct ArenaNode {
            cell: usize,
            parent: Option<usize>,
        }

        let mut arena: Vec<ArenaNode> = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();

        for idx in self.store.bucket_range(b1).chain(self.store.bucket_range(b2)) {
            let node = arena.len();
            arena.push(ArenaNode { cell: idx, parent: None });
            queue.push_back(node);
        }

        let mut found = None;
        for dequeues in 0..Self::DISPLACEMENT_BUDGET {
            let Some(node_idx) = queue.pop_front() else {
                break;
            };
            let cell_idx = arena[node_idx].cell;

            if self.store.get(cell_idx).is_none() {
                if dequeues > 0 {
                    log::debug!(
                        "displacement path of length {} found after {} dequeues",
                        {
                            let mut len = 0;
                            let mut cur = Some(node_idx);
                            while let Some(n) = cur {
                                len += 1;
                                cur = arena[n].parent;
                            }
                            len
                        },
                        dequeues + 1
                    );
                }
                found = Some(node_idx);
                break;
            }

            let (victim_key, _) = self.store.get(cell_idx).as_ref().unwrap();
            let victim_digest = digest(victim_key, &self.build_hasher);
            let (vb1, vb2) = candidates(victim_digest, self.store.num_buckets());
            let cell_bucket = self.store.bucket_of(cell_idx);
            debug_assert!(
                vb1 == cell_bucket || vb2 == cell_bucket,
                "invariant 1 violated: resident key is not in one of its own candidate buckets"
            );
            let target_bucket = if vb1 == cell_bucket { vb2 } else { vb1 };

            for nxt in self.store.bucket_range(target_bucket) {
                let node = arena.len();
                arena.push(ArenaNode { cell: nxt, parent: Some(node_idx) });
                queue.push_back(node);
            }
        }

        let Some(leaf) = found else {
            log::warn!(
                "displacement budget of {} exhausted with {} buckets; rehash required",
                Self::DISPLACEMENT_BUDGET,
                self.store.num_buckets()
            );
            return Err((key, value));
        };

        // Walk from the empty leaf back to the root, shifting each
        // ancestor's resident one step down the chain toward the empty
        // cell it vacates. The root (one of `key`'s own candidate cells)
        // ends up empty and receives `key`/`value`.
        let mut idx = arena[leaf].cell;
        let mut parent = arena[leaf].parent;
        while let Some(p) = parent {
            let nxt = arena[p].cell;
            let moved = self.store.take(nxt);
            self.store.put_at(idx, moved);
            idx = nxt;
            parent = arena[p].parent;
        }
        self.store.put_at(idx, Some((key, value)));
        self.len += 1;
        Ok(PutOutcome::Inserted)
    }

    /// Doubles the bucket count — possibly several times, if reinserting
    /// the displaced set itself needs more room — and reinserts every live
    /// entry plus the pair that triggered the rehash.
    ///
    /// This is the only place `rehash` is invoked from, and it owns
    /// `pending` for its whole lifetime: the retry after a successful
    /// rehash happens exactly once, resolving the open question in spec
    /// §9 about duplicated or dropped post-rehash inserts.
    fn rehash_with_cascade(&mut self, pending: (K, V)) -> Result<(), CuckooError> {
        let cells_per_bucket = self.store.cells_per_bucket();
        let mut num_buckets = self.store.num_buckets();
        let old_store = std::mem::replace(&mut self.store, CellStore::new(num_buckets, cells_per_bucket));
        let mut entries: Vec<(K, V)> = old_store.into_occupied().collect();
        entries.push(pending);

        for _ in 0..Self::MAX_REHASH_CASCADES {
            num_buckets *= 2;
            log::debug!("rehashing: doubling bucket count to {num_buckets}");
            // Drain whatever this cascade's previous (too-small) store
            // already holds back into `entries` before discarding it —
            // otherwise every entry a failed `attempt_put` already placed
            // in that store is lost the moment it's replaced.
            let prev_store = std::mem::replace(&mut self.store, CellStore::new(num_buckets, cells_per_bucket));
            entries.extend(prev_store.into_occupied());
            self.len = 0;

            let mut ok = true;
            while let Some((k, v)) = entries.pop() {
                match self.attempt_put(k, v) {
                    Ok(_) => {}
                    Err(kv) => {
                        entries.push(kv);
                        ok = false;
                        break;
                    }
                }
            }
            if ok {
                return Ok(());
            }
        }

        log::warn!(
            "capacity exhausted after {} rehash cascades",
            Self::MAX_REHASH_CASCADES
        );
        Err(CuckooError::CapacityExhausted)
    }

    /// Inserts or updates `key` with `value`.
    ///
    /// # Panics
    ///
    /// Panics with [`CuckooError::CapacityExhausted`] as the message if
    /// repeated rehashing still cannot place the key — normally impossible
    /// short of a broken `Hash`/`Eq` contract. Use [`Table::try_put`] to
    /// handle this as a recoverable error.
    pub fn put(&mut self, key: K, value: V) -> PutOutcome<V> {
        match self.try_put(key, value) {
            Ok(outcome) => outcome,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible sibling of [`Table::put`].
    pub fn try_put(&mut self, key: K, value: V) -> Result<PutOutcome<V>, CuckooError> {
        match self.attempt_put(key, value) {
            Ok(outcome) => Ok(outcome),
            Err((key, value)) => {
                self.rehash_with_cascade((key, value))?;
                Ok(PutOutcome::Inserted)
            }
        }
    }

    /// `put`, reporting only whether a brand new key was inserted — kept
    /// for callers migrating from a boolean-returning insert API.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.put(key, value).is_inserted()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn erase(&mut self, key: &K) -> Option<V> {
        let (b1, b2) = self.candidate_buckets(key);
        for bucket in [b1, b2] {
            if let Some(idx) = self.find_key(bucket, key) {
                let (_, value) = self.store.take(idx).expect("cell must be occupied");
                self.len -= 1;
                return Some(value);
            }
        }
        None
    }

    /// [`Table::erase`], surfacing a miss as [`CuckooError::NotFound`]
    /// rather than `None`.
    pub fn try_erase(&mut self, key: &K) -> Result<V, CuckooError> {
        self.erase(key).ok_or(CuckooError::NotFound)
    }

    /// Iterates over all live `(key, value)` pairs, in unspecified order.
    /// Not restartable across mutation: any `put`/`erase` invalidates a
    /// borrow taken here (enforced by the borrow checker).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.store.iter()
    }

    /// Projection of [`Table::iter`] onto keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Projection of [`Table::iter`] onto values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Bulk insert-or-update, equivalent to calling [`Table::put`] for
    /// every pair in `iter`.
    pub fn update<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.extend(iter);
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for Table<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K: Hash + Eq, V: PartialEq, S: BuildHasher> PartialEq for Table<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for Table<K, V, S> {}
