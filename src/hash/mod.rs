pub mod bucket;
pub mod extendible_hash;
pub mod hasher;

pub use bucket::Bucket;
pub use extendible_hash::{ExtendibleHashTable, SlotInfo};
pub use hasher::{IdentityHasher, KeyHasher, SipKeyHasher};

use crate::error::PageTableResult;

/// Width of the values produced by a [`KeyHasher`].
pub const HASH_BITS: u32 = u64::BITS;

/// Associative in-memory index. All methods take `&self`; implementations
/// handle their own synchronization.
pub trait HashTable<K, V> {
    fn find(&self, key: &K) -> Option<V>;

    fn remove(&self, key: &K) -> bool;

    /// Upserts `key`. On error the table is left unchanged.
    fn insert(&self, key: K, value: V) -> PageTableResult<()>;
}
