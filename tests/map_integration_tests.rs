//! Integration Tests for the public map API
//!
//! Exercises both map variants end to end, including shared use across
//! threads.

use std::sync::{Arc, Barrier};
use std::thread::{self, sleep};

use chrono::Duration;
use expiring_map::map::now;
use expiring_map::{BoundedLookAheadMap, ExpiringOrderedMap, MapError};

// == Helper Functions ==

fn wait_ms(ms: u64) {
    sleep(std::time::Duration::from_millis(ms));
}

// == Scenarios ==

#[test]
fn test_insert_then_len_and_get() {
    let map = ExpiringOrderedMap::new(Some(Duration::seconds(60)));
    map.insert("a", 1);
    map.insert("b", 2);

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("a"), Ok(1));
}

#[test]
fn test_entries_vanish_after_default_ttl() {
    let map = ExpiringOrderedMap::new(Some(Duration::milliseconds(300)));
    map.insert("a", 1);

    wait_ms(600);

    assert_eq!(map.len(), 0);
    assert!(matches!(map.get("a"), Err(MapError::KeyNotFound(_))));
}

#[test]
fn test_expire_at_now_hides_entry() {
    let map = ExpiringOrderedMap::new(Some(Duration::seconds(60)));
    map.insert("a", 100);
    map.expire_at("a", now()).unwrap();
    wait_ms(2);

    assert!(matches!(map.get("a"), Err(MapError::KeyNotFound(_))));
    assert_eq!(map.len(), 0);
}

#[test]
fn test_set_ttl_shortens_remaining_time() {
    let map = ExpiringOrderedMap::new(Some(Duration::seconds(120)));
    map.insert("foo", 3);
    map.set_ttl("foo", Duration::seconds(3)).unwrap();

    let remaining = map.get_ttl("foo").unwrap().unwrap();
    assert!(remaining <= Duration::seconds(3));
    assert!(remaining > Duration::zero());
}

#[test]
fn test_bounded_write_purges_front() {
    let map = BoundedLookAheadMap::new(Some(Duration::milliseconds(300)));
    map.insert("a", 1);
    map.insert("b", 2);
    map.insert("c", 3);

    wait_ms(600);
    map.insert("d", 4);

    assert_eq!(map.keys(), vec!["d"]);
}

#[test]
fn test_reinsert_keeps_first_position() {
    let map = ExpiringOrderedMap::new(None);
    map.insert("a", 1);
    map.insert("b", 2);
    map.insert("c", 3);
    map.insert("a", 4);

    let order: Vec<_> = map.iter().map(|(key, _)| key).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(map.get("a"), Ok(4));
}

#[test]
fn test_seeded_map_applies_default_ttl_to_all() {
    let map = ExpiringOrderedMap::with_entries(
        Some(Duration::milliseconds(300)),
        [("a", 1), ("b", 2)],
    );
    let mut keys = map.keys();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);

    wait_ms(600);
    assert_eq!(map.purge_expired(), 2);
    assert_eq!(map.len(), 0);
    assert!(map.keys().is_empty());
}

#[test]
fn test_get_or_default_after_expiry() {
    let map = ExpiringOrderedMap::new(Some(Duration::milliseconds(300)));
    map.insert("a", "value");
    assert_eq!(map.get_or_default("a", "default"), "value");
    assert_eq!(map.get_or_default("b", "default"), "default");

    wait_ms(600);
    assert_eq!(map.get_or_default("a", "default"), "default");
}

#[test]
fn test_values_in_insertion_order() {
    let map = BoundedLookAheadMap::new(Some(Duration::seconds(60)));
    map.update([("a", 1), ("b", 2)]);
    assert_eq!(map.values(), vec![1, 2]);
}

// == Concurrency ==

#[test]
fn test_concurrent_inserts_are_all_visible() {
    let map = Arc::new(ExpiringOrderedMap::new(Some(Duration::minutes(5))));
    let threads = 8;
    let per_thread = 200;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let map = Arc::clone(&map);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    map.insert((t, i), t * per_thread + i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("insert thread should not panic");
    }

    assert_eq!(map.len(), threads * per_thread);
    for t in 0..threads {
        assert_eq!(map.get(&(t, per_thread - 1)), Ok(t * per_thread + per_thread - 1));
    }
}

#[test]
fn test_concurrent_mixed_operations_stay_consistent() {
    let map = Arc::new(ExpiringOrderedMap::new(Some(Duration::minutes(5))));
    map.update((0..100).map(|i| (i, i)));

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in (t..100).step_by(4) {
                    if i % 2 == 0 {
                        let _ = map.delete(&i);
                    } else {
                        map.expire_at(&i, now() - Duration::seconds(1)).ok();
                    }
                }
            })
        })
        .collect();
    let reader = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            for _ in 0..20 {
                // Every value yielded must match its key and be live
                for (key, value) in map.iter() {
                    assert_eq!(key, value);
                }
                let _ = map.len();
            }
        })
    };

    for writer in writers {
        writer.join().expect("writer should not panic");
    }
    reader.join().expect("reader should not panic");

    assert_eq!(map.len(), 0);
    assert_eq!(map.stats().stored_entries, 0);
}

#[test]
fn test_iteration_while_other_thread_inserts() {
    let map = Arc::new(ExpiringOrderedMap::new(None));
    map.update((0..50).map(|i| (i, i)));

    let mut iter = map.iter();
    let first = iter.next();

    let writer = {
        let map = Arc::clone(&map);
        thread::spawn(move || {
            for i in 50..100 {
                map.insert(i, i);
            }
        })
    };
    writer.join().expect("writer should not panic");

    let rest: Vec<_> = iter.map(|(key, _)| key).collect();
    assert_eq!(first, Some((0, 0)));
    assert_eq!(rest, (1..50).collect::<Vec<_>>());
    assert_eq!(map.len(), 100);
}
