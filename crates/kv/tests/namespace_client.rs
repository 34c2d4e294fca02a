//! ActorKv against the in-memory backend

use std::collections::BTreeMap;
use std::sync::Arc;

use actorhost_core::{ActorId, Key, ListQuery};
use actorhost_kv::ActorKv;
use actorhost_storage::MemoryStore;

fn client(store: &MemoryStore) -> ActorKv {
    ActorKv::new(Arc::new(store.host(ActorId::new())))
}

fn decode_count(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[tokio::test]
async fn sequential_increments_reach_one_hundred() {
    let store = MemoryStore::new();
    let kv = client(&store);
    let key = Key::from("count");

    kv.put(key.clone(), 0u64.to_le_bytes().to_vec()).await.unwrap();
    let first = kv.get(&key).await.unwrap().unwrap();

    for _ in 0..100 {
        let current = kv.get(&key).await.unwrap().unwrap();
        let next = decode_count(&current.value) + 1;
        kv.put(key.clone(), next.to_le_bytes().to_vec()).await.unwrap();
    }

    let last = kv.get(&key).await.unwrap().unwrap();
    assert_eq!(decode_count(&last.value), 100);
    assert_ne!(first.version(), last.version());
    assert_eq!(first.create_ts(), last.create_ts());
}

#[tokio::test]
async fn batch_get_matches_single_gets() {
    let store = MemoryStore::new();
    let kv = client(&store);

    let entries: BTreeMap<Key, Vec<u8>> = [("k1", b"one".to_vec()), ("k2", b"two".to_vec())]
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect();
    kv.put_batch(entries).await.unwrap();

    let keys = [Key::from("k1"), Key::from("k2")];
    let batch = kv.get_batch(&keys).await.unwrap();
    for key in &keys {
        assert_eq!(batch.get(key), kv.get(key).await.unwrap().as_ref());
    }
}

#[tokio::test]
async fn prefix_list_stops_at_segment_boundary() {
    let store = MemoryStore::new();
    let kv = client(&store);

    for path in ["a/b", "a/c", "ab"] {
        kv.put(Key::from_path(path), path.as_bytes().to_vec())
            .await
            .unwrap();
    }

    let listed = kv.list(&ListQuery::prefix("a"), false, None).await.unwrap();
    let keys: Vec<Key> = listed.into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Key::new(["a", "b"]), Key::new(["a", "c"])]);

    let reversed = kv.list(&ListQuery::prefix("a"), true, Some(1)).await.unwrap();
    assert_eq!(reversed[0].0, Key::new(["a", "c"]));
}

#[tokio::test]
async fn actors_never_see_each_other() {
    let store = MemoryStore::new();
    let alice = client(&store);
    let bob = client(&store);

    alice.put(Key::from("secret"), b"a".to_vec()).await.unwrap();
    bob.delete_all().await.unwrap();
    bob.delete(&Key::from("secret")).await.unwrap();

    assert!(bob.get(&Key::from("secret")).await.unwrap().is_none());
    assert!(bob.list(&ListQuery::All, false, None).await.unwrap().is_empty());
    assert_eq!(
        alice.get(&Key::from("secret")).await.unwrap().unwrap().value,
        b"a".to_vec()
    );
}

#[tokio::test]
async fn zero_limit_lists_nothing() {
    let store = MemoryStore::new();
    let kv = client(&store);
    kv.put(Key::from("a"), b"1".to_vec()).await.unwrap();

    assert!(kv.list(&ListQuery::All, false, Some(0)).await.unwrap().is_empty());
    assert!(kv.list(&ListQuery::All, true, Some(0)).await.unwrap().is_empty());
    assert_eq!(kv.list(&ListQuery::All, false, Some(1)).await.unwrap().len(), 1);
}
