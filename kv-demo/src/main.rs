//! # Store Demo
//!
//! Purpose: Exercise the store facade end to end without reintroducing the
//! wire protocol or command-dispatch layer this core deliberately excludes.
//! A fixed script of `insert_if`/`get`/`expire`/`erase`/`sweep`/`flush_all`
//! calls against a real `SystemClock`, so the core is runnable without a
//! server in front of it.

use std::thread::sleep;
use std::time::Duration;

use kv_common::StoreConfig;
use kv_store::{Entry, Store};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut store: Store = Store::new(StoreConfig::default());
    store.register_releaser(|store, handle| store.release(handle));

    demo_scalar(&mut store);
    demo_ttl_and_sweep(&mut store);
    demo_predicates(&mut store);
    demo_wrong_kind(&mut store);

    println!("final size: {}", store.size());
    store.flush_all();
    println!("size after flush_all: {}", store.size());
}

fn demo_scalar(store: &mut Store) {
    let hash = store.fingerprint(b"counter");
    store
        .insert_if(Entry::new_int64(b"counter".to_vec(), hash, 1), 0, true, false)
        .expect("insert counter");
    let value = store.get_mut(b"counter", |entry| entry.unwrap().increment_int64(4)).unwrap();
    println!("counter after +4 = {value}");
}

fn demo_ttl_and_sweep(store: &mut Store) {
    let hash = store.fingerprint(b"session");
    store
        .insert_if(Entry::new_bytes(b"session".to_vec(), hash, b"hello".to_vec()), 100, true, false)
        .expect("insert session");
    println!("expiring_size after insert = {}", store.expiring_size());

    sleep(Duration::from_millis(50));
    store.sweep().expect("sweep");
    println!("session still present after 50ms sweep: {}", store.exists(b"session"));

    sleep(Duration::from_millis(80));
    let released = store.sweep().expect("sweep");
    println!("sweep released {released} entries; session present: {}", store.exists(b"session"));
}

fn demo_predicates(store: &mut Store) {
    let hash = store.fingerprint(b"k");
    let first = store
        .insert_if(Entry::new_bytes(b"k".to_vec(), hash, b"a".to_vec()), 0, true, false)
        .unwrap();
    let second = store
        .insert_if(Entry::new_bytes(b"k".to_vec(), hash, b"b".to_vec()), 0, true, false)
        .unwrap();
    let third = store
        .insert_if(Entry::new_bytes(b"k".to_vec(), hash, b"c".to_vec()), 0, false, true)
        .unwrap();
    println!("nx-insert={first}, nx-insert-again={second}, xx-replace={third}");
    store.erase(b"k");
}

fn demo_wrong_kind(store: &mut Store) {
    let hash = store.fingerprint(b"x");
    store.insert_if(Entry::new_list(b"x".to_vec(), hash), 0, true, false).unwrap();
    let err = store.get(b"x", |entry| entry.unwrap().as_int64().err());
    println!("expected WrongKind error: {err:?}");
    store.erase(b"x");
}
