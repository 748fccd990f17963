use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use quill_pagetable::buffer::{FrameId, PageId, PageTable};
use quill_pagetable::config::PageTableConfig;
use quill_pagetable::hash::{ExtendibleHashTable, HashTable, SipKeyHasher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn random_workload_matches_reference_map() {
    let table: ExtendibleHashTable<u64, u64> = ExtendibleHashTable::with_bucket_size(4).unwrap();
    let mut reference = HashMap::new();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..20_000 {
        let key = rng.random_range(0..2_000u64);
        match rng.random_range(0..3) {
            0 | 1 => {
                let value = rng.random::<u64>();
                table.insert(key, value).unwrap();
                reference.insert(key, value);
            }
            _ => {
                assert_eq!(table.remove(&key), reference.remove(&key).is_some());
            }
        }
    }

    assert_eq!(table.len(), reference.len());
    for key in 0..2_000u64 {
        assert_eq!(table.find(&key), reference.get(&key).copied());
    }
    table.verify_integrity().unwrap();
}

#[test]
fn directory_invariants_hold_after_every_insert() {
    let table: ExtendibleHashTable<u32, u32> = ExtendibleHashTable::with_bucket_size(3).unwrap();
    let mut last_depth = 0;
    let mut last_buckets = 1;
    for key in 0..600u32 {
        table.insert(key, key).unwrap();
        table.verify_integrity().unwrap();

        let depth = table.global_depth();
        let buckets = table.num_buckets();
        assert!(depth >= last_depth);
        assert!(buckets >= last_buckets);
        assert_eq!(table.directory_snapshot().len(), 1usize << depth);
        last_depth = depth;
        last_buckets = buckets;
    }
    for key in 0..600u32 {
        assert_eq!(table.find(&key), Some(key));
    }
}

#[test]
fn concurrent_writers_and_readers() {
    let table = Arc::new(
        PageTable::new(PageTableConfig::default().with_bucket_size(8)).unwrap(),
    );
    let threads = 8;
    let per_thread = 2_000u32;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let base = t * per_thread;
                for page_id in base..base + per_thread {
                    table.insert(page_id, page_id as FrameId * 2).unwrap();
                    assert_eq!(table.find(page_id), Some(page_id as FrameId * 2));
                }
                for page_id in (base..base + per_thread).step_by(2) {
                    assert!(table.remove(page_id));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.len(), (threads * per_thread / 2) as usize);
    for page_id in 0..threads * per_thread {
        let expected = (page_id % 2 == 1).then_some(page_id as FrameId * 2);
        assert_eq!(table.find(page_id), expected);
    }
    table.verify_integrity().unwrap();
}

#[test]
fn concurrent_upserts_keep_one_mapping_per_page() {
    let table: Arc<ExtendibleHashTable<PageId, FrameId, SipKeyHasher<PageId>>> =
        Arc::new(ExtendibleHashTable::with_bucket_size(2).unwrap());

    let handles: Vec<_> = (0..4usize)
        .map(|frame| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for page_id in 0..500 {
                    table.insert(page_id, frame).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.len(), 500);
    for page_id in 0..500 {
        assert!(matches!(table.find(&page_id), Some(frame) if frame < 4));
    }
    table.verify_integrity().unwrap();
}

#[test]
fn shared_as_trait_object() {
    let table: Arc<dyn HashTable<PageId, FrameId> + Send + Sync> =
        Arc::new(ExtendibleHashTable::<PageId, FrameId>::with_bucket_size(4).unwrap());
    let writer = {
        let table = Arc::clone(&table);
        thread::spawn(move || {
            for page_id in 0..100 {
                table.insert(page_id, page_id as FrameId).unwrap();
            }
        })
    };
    writer.join().unwrap();
    for page_id in 0..100 {
        assert_eq!(table.find(&page_id), Some(page_id as FrameId));
    }
}
