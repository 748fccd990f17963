use crate::error::{PageTableError, PageTableResult};
use crate::hash::HASH_BITS;

pub const DEFAULT_BUCKET_SIZE: usize = 50;
/// Buckets are scanned linearly, so anything past this is a misconfiguration.
pub const MAX_BUCKET_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableConfig {
    /// Maximum number of entries a single bucket holds before it splits.
    pub bucket_size: usize,
    /// Ceiling for local depth. Inserting a key whose bucket cannot be
    /// separated within this many hash bits fails with `HashExhausted`.
    pub max_depth: u32,
}

impl PageTableConfig {
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self) -> PageTableResult<()> {
        if self.bucket_size == 0 || self.bucket_size > MAX_BUCKET_SIZE {
            return Err(PageTableError::Config(format!(
                "bucket_size must be within 1..={}, got {}",
                MAX_BUCKET_SIZE, self.bucket_size
            )));
        }
        if self.max_depth == 0 || self.max_depth > HASH_BITS {
            return Err(PageTableError::Config(format!(
                "max_depth must be within 1..={}, got {}",
                HASH_BITS, self.max_depth
            )));
        }
        Ok(())
    }
}

impl Default for PageTableConfig {
    fn default() -> Self {
        PageTableConfig {
            bucket_size: DEFAULT_BUCKET_SIZE,
            max_depth: HASH_BITS,
        }
    }
}
