use std::hash::Hash;

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::config::PageTableConfig;
use crate::error::{PageTableError, PageTableResult};
use crate::hash::bucket::Bucket;
use crate::hash::hasher::{KeyHasher, SipKeyHasher};
use crate::hash::HashTable;

pub type BucketId = usize;

/// One directory slot as seen by diagnostics.
#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    pub slot: usize,
    pub bucket_id: BucketId,
    pub local_depth: u32,
    pub len: usize,
}

#[inline]
fn low_bits(depth: u32) -> u64 {
    if depth >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << depth) - 1
    }
}

/// Everything guarded by the table lock. Buckets live in an arena and the
/// directory stores arena indices; a bucket is never freed once created.
#[derive(Debug)]
struct Directory<K, V> {
    global_depth: u32,
    bucket_size: usize,
    slots: Vec<BucketId>,
    buckets: Vec<Bucket<K, V>>,
}

impl<K: Eq + Clone, V: Clone> Directory<K, V> {
    fn new(bucket_size: usize) -> Self {
        Self {
            global_depth: 0,
            bucket_size,
            slots: vec![0],
            buckets: vec![Bucket::new(bucket_size, 0)],
        }
    }

    fn slot_of(&self, hash: u64) -> usize {
        (hash & low_bits(self.global_depth)) as usize
    }

    fn bucket_of(&self, hash: u64) -> BucketId {
        self.slots[self.slot_of(hash)]
    }

    /// Reserves room for growing the directory to `depth` bits and adding
    /// `splits` buckets, so the splits that follow cannot fail halfway.
    fn reserve(&mut self, depth: u32, splits: usize) -> PageTableResult<()> {
        if depth > self.global_depth {
            if depth >= usize::BITS {
                return Err(PageTableError::DirectoryOverflow { depth });
            }
            let additional = (1usize << depth) - self.slots.len();
            self.slots
                .try_reserve_exact(additional)
                .map_err(|_| PageTableError::DirectoryOverflow { depth })?;
        }
        self.buckets
            .try_reserve(splits)
            .map_err(|e| PageTableError::Internal(format!("bucket arena: {e}")))?;
        Ok(())
    }

    /// Splits `bucket_id` on hash bit `local_depth`, doubling the directory
    /// first when the new local depth exceeds the global depth.
    fn split<S: KeyHasher<K>>(&mut self, bucket_id: BucketId, hasher: &S) -> BucketId {
        let old_local = self.buckets[bucket_id].local_depth();
        let new_local = old_local + 1;

        if new_local > self.global_depth {
            self.slots.extend_from_within(..);
            self.global_depth += 1;
            debug!(
                "directory doubled: global depth {} -> {}, {} slots",
                self.global_depth - 1,
                self.global_depth,
                self.slots.len()
            );
        }

        let split_bit = 1u64 << old_local;
        let moved = self.buckets[bucket_id].drain_where(|k| hasher.hash_key(k) & split_bit != 0);
        self.buckets[bucket_id].set_local_depth(new_local);

        let sibling_id = self.buckets.len();
        let mut sibling = Bucket::new(self.bucket_size, new_local);
        for (k, v) in moved {
            let stored = sibling.insert(k, v);
            debug_assert!(stored);
        }
        self.buckets.push(sibling);

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if *slot == bucket_id && (i >> old_local) & 1 == 1 {
                *slot = sibling_id;
            }
        }

        debug!(
            "split bucket {} (depth {} -> {}): {} stay, {} moved to bucket {}",
            bucket_id,
            old_local,
            new_local,
            self.buckets[bucket_id].len(),
            self.buckets[sibling_id].len(),
            sibling_id
        );
        sibling_id
    }
}

/// In-memory extendible hash table.
///
/// A single mutex guards the directory, both depth counters and every bucket.
/// Each public method, accessors included, holds it for its whole duration.
/// The lock never escapes the `&self` API, so a finer-grained scheme can
/// replace it without touching callers.
#[derive(Debug)]
pub struct ExtendibleHashTable<K, V, S = SipKeyHasher<K>> {
    config: PageTableConfig,
    hasher: S,
    inner: Mutex<Directory<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> ExtendibleHashTable<K, V> {
    /// Table with `DEFAULT_BUCKET_SIZE` buckets and SipHash routing.
    pub fn new() -> Self {
        Self::build(PageTableConfig::default(), SipKeyHasher::new())
    }

    pub fn with_bucket_size(bucket_size: usize) -> PageTableResult<Self> {
        Self::with_config(PageTableConfig::default().with_bucket_size(bucket_size))
    }

    pub fn with_config(config: PageTableConfig) -> PageTableResult<Self> {
        Self::with_hasher(config, SipKeyHasher::new())
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for ExtendibleHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Eq + Clone,
    V: Clone,
    S: KeyHasher<K>,
{
    pub fn with_hasher(config: PageTableConfig, hasher: S) -> PageTableResult<Self> {
        config.validate()?;
        Ok(Self::build(config, hasher))
    }

    fn build(config: PageTableConfig, hasher: S) -> Self {
        Self {
            inner: Mutex::new(Directory::new(config.bucket_size)),
            config,
            hasher,
        }
    }

    pub fn hash_key(&self, key: &K) -> u64 {
        self.hasher.hash_key(key)
    }

    /// Directory slot `key` currently routes to.
    pub fn table_index(&self, key: &K) -> usize {
        let hash = self.hash_key(key);
        self.inner.lock().slot_of(hash)
    }

    pub fn find(&self, key: &K) -> Option<V> {
        let hash = self.hash_key(key);
        let dir = self.inner.lock();
        let bucket_id = dir.bucket_of(hash);
        trace!("find: hash {:#x} -> bucket {}", hash, bucket_id);
        dir.buckets[bucket_id].find(key)
    }

    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash_key(key);
        let mut dir = self.inner.lock();
        let bucket_id = dir.bucket_of(hash);
        trace!("remove: hash {:#x} -> bucket {}", hash, bucket_id);
        dir.buckets[bucket_id].remove(key)
    }

    /// Removes `key` only if `pred` accepts the value it maps to, checked
    /// under the same lock as the removal.
    pub fn remove_if<F>(&self, key: &K, pred: F) -> bool
    where
        F: FnOnce(&V) -> bool,
    {
        let hash = self.hash_key(key);
        let mut dir = self.inner.lock();
        let bucket_id = dir.bucket_of(hash);
        dir.buckets[bucket_id].remove_if(key, pred)
    }

    /// Inserts or overwrites `key`, splitting buckets and doubling the
    /// directory as needed. Fails with `HashExhausted` when the target bucket
    /// is full of keys that agree with `key` on the low `max_depth` hash bits;
    /// the table is unchanged after any error.
    pub fn insert(&self, key: K, value: V) -> PageTableResult<()> {
        let hash = self.hash_key(&key);
        let mut dir = self.inner.lock();

        let bucket_id = dir.bucket_of(hash);
        trace!("insert: hash {:#x} -> bucket {}", hash, bucket_id);
        let bucket = &mut dir.buckets[bucket_id];
        if !bucket.is_full() || bucket.contains(&key) {
            bucket.insert(key, value);
            return Ok(());
        }

        let target = self.split_depth(bucket, hash)?;
        let splits = (target - bucket.local_depth()) as usize;
        dir.reserve(target, splits)?;

        loop {
            let bucket_id = dir.bucket_of(hash);
            let bucket = &mut dir.buckets[bucket_id];
            if !bucket.is_full() {
                bucket.insert(key, value);
                return Ok(());
            }
            if bucket.local_depth() >= self.config.max_depth {
                return Err(PageTableError::Internal(format!(
                    "bucket {} still full at depth {}",
                    bucket_id,
                    bucket.local_depth()
                )));
            }
            dir.split(bucket_id, &self.hasher);
        }
    }

    /// Local depth the bucket holding `hash` must reach before a slot frees
    /// up for it: one past the lowest bit on which some resident key differs.
    fn split_depth(&self, bucket: &Bucket<K, V>, hash: u64) -> PageTableResult<u32> {
        let first_diff = bucket
            .iter()
            .map(|(k, _)| (self.hasher.hash_key(k) ^ hash).trailing_zeros())
            .min()
            .unwrap_or(0);
        let depth = (first_diff + 1).max(bucket.local_depth() + 1);
        if depth > self.config.max_depth {
            warn!(
                "hash exhausted: {} keys share the low {} bits of hash {:#x}",
                bucket.len(),
                self.config.max_depth,
                hash
            );
            return Err(PageTableError::HashExhausted {
                depth: self.config.max_depth,
            });
        }
        Ok(depth)
    }

    pub fn global_depth(&self) -> u32 {
        self.inner.lock().global_depth
    }

    /// Local depth of the bucket referenced by directory slot `bucket_index`.
    pub fn local_depth(&self, bucket_index: usize) -> PageTableResult<u32> {
        let dir = self.inner.lock();
        match dir.slots.get(bucket_index) {
            Some(&bucket_id) => Ok(dir.buckets[bucket_id].local_depth()),
            None => Err(PageTableError::BucketIndexOutOfRange {
                index: bucket_index,
                len: dir.slots.len(),
            }),
        }
    }

    pub fn num_buckets(&self) -> usize {
        self.inner.lock().buckets.len()
    }

    pub fn bucket_size(&self) -> usize {
        self.config.bucket_size
    }

    pub fn config(&self) -> PageTableConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.inner.lock().buckets.iter().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn directory_snapshot(&self) -> Vec<SlotInfo> {
        let dir = self.inner.lock();
        dir.slots
            .iter()
            .enumerate()
            .map(|(slot, &bucket_id)| {
                let bucket = &dir.buckets[bucket_id];
                SlotInfo::new(slot, bucket_id, bucket.local_depth(), bucket.len())
            })
            .collect()
    }

    /// Checks the directory and bucket invariants, reporting the first
    /// violation found.
    pub fn verify_integrity(&self) -> PageTableResult<()> {
        let dir = self.inner.lock();
        let global_depth = dir.global_depth;

        if global_depth >= usize::BITS || dir.slots.len() != 1usize << global_depth {
            return Err(PageTableError::Internal(format!(
                "directory has {} slots at global depth {}",
                dir.slots.len(),
                global_depth
            )));
        }

        let mut referencing: Vec<Vec<usize>> = vec![Vec::new(); dir.buckets.len()];
        for (slot, &bucket_id) in dir.slots.iter().enumerate() {
            match referencing.get_mut(bucket_id) {
                Some(slots) => slots.push(slot),
                None => {
                    return Err(PageTableError::Internal(format!(
                        "slot {} references missing bucket {}",
                        slot, bucket_id
                    )))
                }
            }
        }

        for (bucket_id, bucket) in dir.buckets.iter().enumerate() {
            let local_depth = bucket.local_depth();
            if local_depth > global_depth {
                return Err(PageTableError::Internal(format!(
                    "bucket {} local depth {} exceeds global depth {}",
                    bucket_id, local_depth, global_depth
                )));
            }
            if bucket.len() > dir.bucket_size {
                return Err(PageTableError::Internal(format!(
                    "bucket {} holds {} entries, capacity {}",
                    bucket_id,
                    bucket.len(),
                    dir.bucket_size
                )));
            }

            let slots = &referencing[bucket_id];
            let expected = 1usize << (global_depth - local_depth);
            if slots.len() != expected {
                return Err(PageTableError::Internal(format!(
                    "bucket {} referenced by {} slots, expected {}",
                    bucket_id,
                    slots.len(),
                    expected
                )));
            }

            let mask = low_bits(local_depth);
            let prefix = slots[0] as u64 & mask;
            if let Some(slot) = slots.iter().find(|&&s| s as u64 & mask != prefix) {
                return Err(PageTableError::Internal(format!(
                    "bucket {} slots {} and {} disagree on the low {} bits",
                    bucket_id, slots[0], slot, local_depth
                )));
            }
            if bucket
                .iter()
                .any(|(k, _)| self.hasher.hash_key(k) & mask != prefix)
            {
                return Err(PageTableError::Internal(format!(
                    "bucket {} holds a key outside prefix {:#b}",
                    bucket_id, prefix
                )));
            }
        }
        Ok(())
    }
}

impl<K, V, S> HashTable<K, V> for ExtendibleHashTable<K, V, S>
where
    K: Eq + Clone,
    V: Clone,
    S: KeyHasher<K>,
{
    fn find(&self, key: &K) -> Option<V> {
        ExtendibleHashTable::find(self, key)
    }

    fn remove(&self, key: &K) -> bool {
        ExtendibleHashTable::remove(self, key)
    }

    fn insert(&self, key: K, value: V) -> PageTableResult<()> {
        ExtendibleHashTable::insert(self, key, value)
    }
}
