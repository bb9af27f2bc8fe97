use std::fs;
use std::sync::Arc;
use std::thread;

use nextstop_lib::SystemCache;

#[test]
fn insert_past_capacity_evicts_least_recently_used() {
    let cache = SystemCache::with_capacity(3);
    cache.put(1, "one");
    cache.put(2, "two");
    cache.put(3, "three");
    cache.put(4, "four");

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(1), None, "oldest entry should be evicted");
    assert_eq!(cache.get(2), Some("two".to_string()));
    assert_eq!(cache.get(4), Some("four".to_string()));
}

#[test]
fn get_promotes_entry_ahead_of_eviction() {
    let cache = SystemCache::with_capacity(3);
    cache.put(1, "one");
    cache.put(2, "two");
    cache.put(3, "three");

    // Touch the oldest entry, then push two more; the touched key must
    // survive both eviction cycles.
    assert_eq!(cache.get(1), Some("one".to_string()));
    cache.put(4, "four");
    cache.put(5, "five");

    assert_eq!(cache.get(1), Some("one".to_string()));
    assert_eq!(cache.get(2), None);
    assert_eq!(cache.get(3), None);
}

#[test]
fn put_refreshes_existing_key_without_growing() {
    let cache = SystemCache::with_capacity(2);
    cache.put(1, "one");
    cache.put(2, "two");
    cache.put(1, "uno");
    cache.put(3, "three");

    assert_eq!(cache.len(), 2);
    // Key 2 became least-recently-used once key 1 was refreshed.
    assert_eq!(cache.get(2), None);
    assert_eq!(cache.get(1), Some("uno".to_string()));
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = SystemCache::new();
    cache.put(10_477_373_803, "G2-V Yellow-White Star");
    cache.put(1_183_229_809_290, "B (Blue-White) Star");
    cache.save(&path).unwrap();

    let restored = SystemCache::new();
    assert_eq!(restored.load(&path).unwrap(), 2);
    assert_eq!(
        restored.get(10_477_373_803),
        Some("G2-V Yellow-White Star".to_string())
    );
    assert_eq!(
        restored.get(1_183_229_809_290),
        Some("B (Blue-White) Star".to_string())
    );
}

#[test]
fn load_of_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let cache = SystemCache::new();
    assert_eq!(cache.load(&dir.path().join("absent.json")).unwrap(), 0);
    assert!(cache.is_empty());
}

#[test]
fn load_of_corrupt_file_is_an_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, "{ not json").unwrap();

    let cache = SystemCache::new();
    assert!(cache.load(&path).is_err());
    assert!(cache.is_empty());
}

#[test]
fn load_trims_oversized_file_to_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let big = SystemCache::new();
    for id in 0..10u64 {
        big.put(id, format!("star {}", id));
    }
    big.save(&path).unwrap();

    let small = SystemCache::with_capacity(4);
    assert_eq!(small.load(&path).unwrap(), 4);
    assert_eq!(small.len(), 4);
}

#[test]
fn concurrent_readers_and_writers_do_not_corrupt_the_map() {
    let cache = Arc::new(SystemCache::with_capacity(64));
    let mut handles = Vec::new();
    for worker in 0..4u64 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for round in 0..200u64 {
                let id = worker * 1000 + (round % 32);
                cache.put(id, format!("star {}", id));
                if let Some(value) = cache.get(id) {
                    assert_eq!(value, format!("star {}", id));
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(cache.len() <= 64);
}
