//! Integration tests for prefixkv
//!
//! End-to-end scenarios driving the prefix layer the way a host node
//! would: several subsystems sharing one physical store, batch sessions,
//! scans, shutdown, and concurrent access.

use std::sync::Arc;

use prefixkv::{
    Batch, Config, KeyValueWriter, MemStore, PrefixedStore, Store, StoreError,
    StoreIterator,
};

fn shared(base: &MemStore) -> Arc<dyn Store> {
    Arc::new(base.clone())
}

// =============================================================================
// End-to-End Scenario
// =============================================================================

#[test]
fn test_chains_lifecycle() {
    let base = MemStore::new();
    let view = PrefixedStore::new(b"chains", shared(&base));

    view.put(b"a", b"1").unwrap();
    assert_eq!(view.get(b"a").unwrap(), b"1");

    let mut iter = view.new_iterator();
    assert!(iter.next());
    assert_eq!(iter.key(), b"a");
    assert_eq!(iter.value(), b"1");
    assert!(!iter.next());
    assert!(iter.error().is_ok());

    view.close().unwrap();
    assert_eq!(view.get(b"a"), Err(StoreError::Closed));
    assert_eq!(view.close(), Err(StoreError::Closed));
}

// =============================================================================
// Multi-Subsystem Scenario
// =============================================================================

#[test]
fn test_subsystems_share_one_store() {
    let base = MemStore::new();
    let headers = PrefixedStore::new(b"headers", shared(&base));
    let state = PrefixedStore::new(b"state", shared(&base));
    let index = PrefixedStore::wrap(b"index", &state).unwrap();

    headers.put(b"0", b"genesis").unwrap();
    state.put(b"balance", b"100").unwrap();
    index.put(b"balance", b"slot-7").unwrap();

    // Same logical key, three disjoint physical locations
    assert_eq!(headers.get(b"0").unwrap(), b"genesis");
    assert_eq!(state.get(b"balance").unwrap(), b"100");
    assert_eq!(index.get(b"balance").unwrap(), b"slot-7");
    assert_eq!(base.stat("entries").unwrap(), "3");

    // Each view scans only its own keys
    for view in [&headers, &state, &index] {
        let mut iter = view.new_iterator();
        let mut count = 0;
        while iter.next() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}

#[test]
fn test_batch_session_per_subsystem() {
    let base = MemStore::new();
    let view = PrefixedStore::with_config(
        b"sync",
        shared(&base),
        Config::builder().buffer_capacity(64).pool_capacity(4).build(),
    );

    let mut batch = view.new_batch();
    for i in 0..50u32 {
        batch.put(format!("item-{i:03}").as_bytes(), &i.to_be_bytes()).unwrap();
    }
    batch.write().unwrap();
    batch.reset();

    let mut iter = view.new_iterator_with_prefix(b"item-");
    let mut count = 0;
    while iter.next() {
        count += 1;
    }
    assert_eq!(count, 50);

    // Port the session log to a scratch store: reset emptied it
    let mut scratch = MemStore::new();
    batch.replay(&mut scratch).unwrap();
    assert_eq!(scratch.stat("entries").unwrap(), "0");
}

// =============================================================================
// Concurrency Scenarios
// =============================================================================

#[test]
fn test_concurrent_readers_and_writers() {
    use std::thread;

    let base = MemStore::new();
    let view = Arc::new(PrefixedStore::new(b"shared", shared(&base)));
    view.put(b"stable", b"value").unwrap();

    let mut handles = vec![];

    for i in 0..4 {
        let view = Arc::clone(&view);
        handles.push(thread::spawn(move || {
            for j in 0..200 {
                let key = format!("w{i}-{j}").into_bytes();
                view.put(&key, b"x").unwrap();
            }
        }));
    }

    for _ in 0..4 {
        let view = Arc::clone(&view);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                assert_eq!(view.get(b"stable").unwrap(), b"value");
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(base.stat("entries").unwrap(), "801");
}

#[test]
fn test_concurrent_views_do_not_interfere() {
    use std::thread;

    let base = MemStore::new();
    let mut handles = vec![];

    for i in 0..8u32 {
        let store = shared(&base);
        handles.push(thread::spawn(move || {
            let label = format!("subsystem-{i}").into_bytes();
            let view = PrefixedStore::new(&label, store);
            for j in 0..100u32 {
                view.put(&j.to_be_bytes(), &i.to_be_bytes()).unwrap();
            }
            for j in 0..100u32 {
                assert_eq!(view.get(&j.to_be_bytes()).unwrap(), i.to_be_bytes());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(base.stat("entries").unwrap(), "800");
}
