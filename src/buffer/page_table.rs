use crate::buffer::{FrameId, PageId};
use crate::config::PageTableConfig;
use crate::error::PageTableResult;
use crate::hash::{ExtendibleHashTable, IdentityHasher, KeyHasher, SlotInfo};

/// Maps resident pages to the frames holding them.
///
/// Page ids are routed by their own low bits unless another hasher is
/// supplied.
#[derive(Debug)]
pub struct PageTable<S = IdentityHasher> {
    table: ExtendibleHashTable<PageId, FrameId, S>,
}

impl PageTable {
    pub fn new(config: PageTableConfig) -> PageTableResult<Self> {
        Self::with_hasher(config, IdentityHasher)
    }
}

impl<S: KeyHasher<PageId>> PageTable<S> {
    pub fn with_hasher(config: PageTableConfig, hasher: S) -> PageTableResult<Self> {
        Ok(Self {
            table: ExtendibleHashTable::with_hasher(config, hasher)?,
        })
    }

    pub fn find(&self, page_id: PageId) -> Option<FrameId> {
        self.table.find(&page_id)
    }

    /// Maps `page_id` to `frame_id`, replacing any previous mapping.
    pub fn insert(&self, page_id: PageId, frame_id: FrameId) -> PageTableResult<()> {
        self.table.insert(page_id, frame_id)
    }

    pub fn remove(&self, page_id: PageId) -> bool {
        self.table.remove(&page_id)
    }

    /// Drops the mapping only while it still points at `frame_id`.
    pub fn remove_if(&self, page_id: PageId, frame_id: FrameId) -> bool {
        self.table.remove_if(&page_id, |current| *current == frame_id)
    }

    pub fn global_depth(&self) -> u32 {
        self.table.global_depth()
    }

    pub fn local_depth(&self, bucket_index: usize) -> PageTableResult<u32> {
        self.table.local_depth(bucket_index)
    }

    pub fn num_buckets(&self) -> usize {
        self.table.num_buckets()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn directory_snapshot(&self) -> Vec<SlotInfo> {
        self.table.directory_snapshot()
    }

    pub fn verify_integrity(&self) -> PageTableResult<()> {
        self.table.verify_integrity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::SipKeyHasher;

    #[test]
    fn maps_pages_to_frames() {
        let table = PageTable::new(PageTableConfig::default().with_bucket_size(4)).unwrap();
        for page_id in 1..=64 {
            table.insert(page_id, (page_id as usize) % 16).unwrap();
        }
        assert_eq!(table.len(), 64);
        assert_eq!(table.find(17), Some(1));
        assert_eq!(table.find(65), None);

        table.insert(17, 9).unwrap();
        assert_eq!(table.find(17), Some(9));
        assert_eq!(table.len(), 64);

        assert!(table.remove(17));
        assert_eq!(table.find(17), None);
        assert!(!table.remove(17));
        table.verify_integrity().unwrap();
    }

    #[test]
    fn remove_if_only_matches_current_frame() {
        let table = PageTable::new(PageTableConfig::default()).unwrap();
        table.insert(3, 7).unwrap();
        assert!(!table.remove_if(3, 8));
        assert_eq!(table.find(3), Some(7));
        assert!(table.remove_if(3, 7));
        assert_eq!(table.find(3), None);
        assert!(!table.remove_if(3, 7));
    }

    #[test]
    fn sequential_pages_split_evenly() {
        let table = PageTable::new(PageTableConfig::default().with_bucket_size(2)).unwrap();
        for page_id in 0..16 {
            table.insert(page_id, page_id as usize).unwrap();
        }
        // identity routing: 16 keys in buckets of 2 need exactly 8 buckets
        assert_eq!(table.global_depth(), 3);
        assert_eq!(table.num_buckets(), 8);
        for slot in 0..8 {
            assert_eq!(table.local_depth(slot).unwrap(), 3);
        }
        table.verify_integrity().unwrap();
    }

    #[test]
    fn custom_hasher() {
        let config = PageTableConfig::default().with_bucket_size(3);
        let table = PageTable::with_hasher(config, SipKeyHasher::new()).unwrap();
        for page_id in 0..500 {
            table.insert(page_id, page_id as usize + 1).unwrap();
        }
        for page_id in 0..500 {
            assert_eq!(table.find(page_id), Some(page_id as usize + 1));
        }
        table.verify_integrity().unwrap();
    }
}
