//! Integration tests exercising the store facade end to end, covering the
//! concrete scenarios and invariants/round-trip properties.

use std::cell::Cell;
use std::rc::Rc;

use kv_common::{Clock, StoreConfig, StoreError};
use kv_store::timer::TrackingTimer;
use kv_store::{Entry, Store};

#[derive(Debug, Clone)]
struct FakeClock(Rc<Cell<u64>>);

impl FakeClock {
    fn new() -> Self {
        FakeClock(Rc::new(Cell::new(0)))
    }

    fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

fn new_store() -> (Store<FakeClock, TrackingTimer>, FakeClock, Rc<Cell<Vec<Vec<u8>>>>) {
    let clock = FakeClock::new();
    let mut store = Store::with_collaborators(StoreConfig::default(), clock.clone(), TrackingTimer::new());
    let released: Rc<Cell<Vec<Vec<u8>>>> = Rc::new(Cell::new(Vec::new()));
    let released_for_closure = released.clone();
    store.register_releaser(move |store, handle| {
        let key = store.entry_key(handle);
        store.release(handle);
        if let Some(key) = key {
            let mut log = released_for_closure.take();
            log.push(key);
            released_for_closure.set(log);
        }
    });
    (store, clock, released)
}

#[test]
fn scenario_1_increment_roundtrip() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"foo");
    store.insert_if(Entry::new_int64(b"foo".to_vec(), hash, 1), 0, true, false).unwrap();
    assert_eq!(store.get(b"foo", |e| *e.unwrap().as_int64().unwrap()), 1);

    store.get_mut(b"foo", |e| e.unwrap().increment_int64(4)).unwrap();
    assert_eq!(store.get(b"foo", |e| *e.unwrap().as_int64().unwrap()), 5);
}

#[test]
fn scenario_2_ttl_then_sweep_releases_once() {
    let (mut store, clock, released) = new_store();
    let hash = store.fingerprint(b"bar");
    store
        .insert_if(Entry::new_bytes(b"bar".to_vec(), hash, b"hello".to_vec()), 100, true, false)
        .unwrap();
    assert_eq!(store.expiring_size(), 1);

    clock.advance(50);
    store.sweep().unwrap();
    assert!(released.take().is_empty());
    assert!(store.exists(b"bar"));

    clock.advance(60);
    let count = store.sweep().unwrap();
    assert_eq!(count, 1);
    assert!(!store.exists(b"bar"));
    assert_eq!(store.expiring_size(), 0);
    assert_eq!(released.take(), vec![b"bar".to_vec()]);
}

#[test]
fn scenario_3_predicate_matrix() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");

    assert!(store
        .insert_if(Entry::new_bytes(b"k".to_vec(), hash, b"a".to_vec()), 0, true, false)
        .unwrap());
    assert!(!store
        .insert_if(Entry::new_bytes(b"k".to_vec(), hash, b"b".to_vec()), 0, true, false)
        .unwrap());
    assert_eq!(store.get(b"k", |e| e.unwrap().as_bytes().unwrap().as_bytes().to_vec()), b"a");

    assert!(store
        .insert_if(Entry::new_bytes(b"k".to_vec(), hash, b"c".to_vec()), 0, false, true)
        .unwrap());
    assert_eq!(store.get(b"k", |e| e.unwrap().as_bytes().unwrap().as_bytes().to_vec()), b"c");
}

#[test]
fn scenario_4_rehash_at_threshold_preserves_all_keys() {
    let config = StoreConfig::new(8, 0.75);
    let mut store = Store::with_collaborators(config, FakeClock::new(), TrackingTimer::new());

    for i in 0..64u32 {
        let key = format!("key-{i}").into_bytes();
        let hash = store.fingerprint(&key);
        store.insert_if(Entry::new_int64(key, hash, i as i64), 0, true, false).unwrap();
    }

    assert_eq!(store.size(), 64);
    for i in 0..64u32 {
        let key = format!("key-{i}").into_bytes();
        assert!(store.exists(&key));
        assert_eq!(store.get(&key, |e| *e.unwrap().as_int64().unwrap()), i as i64);
    }
}

#[test]
fn scenario_5_wrong_kind_access() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"x");
    store.insert_if(Entry::new_list(b"x".to_vec(), hash), 0, true, false).unwrap();
    assert_eq!(
        store.get(b"x", |e| e.unwrap().as_int64().map(|v| *v)),
        Err(StoreError::WrongKind)
    );
}

#[test]
fn scenario_6_expire_then_persist_survives_sweep() {
    let (mut store, clock, released) = new_store();
    let hash = store.fingerprint(b"k");
    store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 0, true, false).unwrap();

    store.expire(b"k", 1000).unwrap();
    store.persist(b"k").unwrap();

    clock.advance(2000);
    store.sweep().unwrap();
    assert!(store.exists(b"k"));
    assert!(released.take().is_empty());
}

#[test]
fn erase_then_exists_is_always_false() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 0, true, false).unwrap();
    assert!(store.erase(b"k"));
    assert!(!store.exists(b"k"));
    assert!(!store.erase(b"k"));
}

#[test]
fn replace_replace_is_idempotent_with_single_replace() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");

    let first = store.replace(Entry::new_int64(b"k".to_vec(), hash, 1)).unwrap();
    assert!(first); // key was absent

    let second = store.replace(Entry::new_int64(b"k".to_vec(), hash, 1)).unwrap();
    assert!(!second); // key was present, prior overwritten

    assert_eq!(store.size(), 1);
    assert_eq!(store.get(b"k", |e| *e.unwrap().as_int64().unwrap()), 1);
}

#[test]
fn flush_all_is_idempotent() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 1000, true, false).unwrap();

    store.flush_all();
    store.flush_all();
    assert_eq!(store.size(), 0);
    assert_eq!(store.expiring_size(), 0);
    assert_eq!(store.next_timeout(), None);
}

#[test]
fn insert_if_zero_ttl_does_not_join_expiration_index() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 0, true, false).unwrap();
    assert_eq!(store.expiring_size(), 0);
}

#[test]
fn expire_zero_is_equivalent_to_persist() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 1000, true, false).unwrap();
    assert_eq!(store.expiring_size(), 1);

    store.expire(b"k", 0).unwrap();
    assert_eq!(store.expiring_size(), 0);
    assert!(store.exists(b"k"));
}

#[test]
fn insert_if_nx_on_present_key_does_not_touch_expiration_index() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 1000, true, false).unwrap();
    assert_eq!(store.expiring_size(), 1);

    let inserted = store
        .insert_if(Entry::new_int64(b"k".to_vec(), hash, 2), 0, true, false)
        .unwrap();
    assert!(!inserted);
    assert_eq!(store.expiring_size(), 1);
    assert_eq!(store.get(b"k", |e| *e.unwrap().as_int64().unwrap()), 1);
}

#[test]
fn invalid_predicate_mutates_nothing() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    let err = store.insert_if(Entry::new_int64(b"k".to_vec(), hash, 1), 0, true, true).unwrap_err();
    assert_eq!(err, StoreError::InvalidPredicate);
    assert!(!store.exists(b"k"));
    assert_eq!(store.size(), 0);
}

#[test]
fn sweep_without_releaser_is_fatal_setup_error() {
    let mut store: Store<FakeClock, TrackingTimer> =
        Store::with_collaborators(StoreConfig::default(), FakeClock::new(), TrackingTimer::new());
    assert_eq!(store.sweep().unwrap_err(), StoreError::MissingReleaser);
}

#[test]
fn two_arg_replace_matches_insert_if_unconditional() {
    let (mut store, _clock, _released) = new_store();
    let hash = store.fingerprint(b"k");
    let inserted = store.replace_with_ttl(Entry::new_int64(b"k".to_vec(), hash, 1), 1000).unwrap();
    assert!(inserted);
    assert_eq!(store.expiring_size(), 1);

    let inserted_again = store.replace_with_ttl(Entry::new_int64(b"k".to_vec(), hash, 2), 0).unwrap();
    assert!(inserted_again);
    assert_eq!(store.expiring_size(), 0);
    assert_eq!(store.get(b"k", |e| *e.unwrap().as_int64().unwrap()), 2);
}
