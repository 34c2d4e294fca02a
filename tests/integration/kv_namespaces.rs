//! Many actors, one store

use std::collections::BTreeMap;

use actorhost::{Error, Key, LimitError, ListQuery, MemoryStore};

use crate::common::{actor_kv, init_tracing, small_store};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_actors_stay_isolated() {
    init_tracing();
    let store = MemoryStore::new();

    let mut tasks = Vec::new();
    for actor in 0..8u8 {
        let (_, kv) = actor_kv(&store);
        tasks.push(tokio::spawn(async move {
            for i in 0..20u8 {
                kv.put(Key::new([b"items".to_vec(), vec![i]]), vec![actor, i])
                    .await
                    .unwrap();
            }
            let listed = kv.list(&ListQuery::prefix("items"), false, None).await.unwrap();
            (actor, listed)
        }));
    }

    for task in tasks {
        let (actor, listed) = task.await.unwrap();
        assert_eq!(listed.len(), 20);
        for (i, (key, entry)) in listed.iter().enumerate() {
            assert_eq!(key, &Key::new([b"items".to_vec(), vec![i as u8]]));
            assert_eq!(entry.value, vec![actor, i as u8]);
        }
    }
    assert_eq!(store.namespace_count(), 8);
}

#[tokio::test]
async fn storage_quota_surfaces_through_client() {
    let store = small_store();
    let (actor_id, kv) = actor_kv(&store);

    // Each entry charges 4 encoded key bytes plus 32 value bytes
    for i in 0..7 {
        kv.put(Key::from(format!("k{}", i).as_str()), vec![7u8; 32])
            .await
            .unwrap();
    }
    assert_eq!(store.storage_size(actor_id), 7 * 36);

    let err = kv.put(Key::from("k7"), vec![7u8; 32]).await.unwrap_err();
    assert!(matches!(
        err,
        Error::LimitExceeded(LimitError::StorageQuotaExceeded { .. })
    ));

    // Overwriting in place does not grow the namespace
    kv.put(Key::from("k0"), vec![8u8; 32]).await.unwrap();
    assert_eq!(store.storage_size(actor_id), 7 * 36);
}

#[tokio::test]
async fn ranges_and_prefixes_over_nested_keys() {
    let store = MemoryStore::new();
    let (_, kv) = actor_kv(&store);

    let entries: BTreeMap<Key, Vec<u8>> = [
        "logs/2024/01",
        "logs/2024/02",
        "logs/2024/03",
        "logs/2025/01",
        "logsx",
        "meta",
    ]
    .into_iter()
    .map(|path| (Key::from_path(path), path.as_bytes().to_vec()))
    .collect();
    kv.put_batch(entries).await.unwrap();

    let in_2024 = kv
        .list(&ListQuery::Prefix(Key::from_path("logs/2024")), true, Some(2))
        .await
        .unwrap();
    let keys: Vec<String> = in_2024.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["logs/2024/03", "logs/2024/02"]);

    let logs = kv.list(&ListQuery::prefix("logs"), false, None).await.unwrap();
    assert_eq!(logs.len(), 4);

    let window = kv
        .list(
            &ListQuery::range(Key::from_path("logs/2024/02"), Key::from_path("logs/2025")),
            false,
            None,
        )
        .await
        .unwrap();
    assert_eq!(window.len(), 2);

    let through = kv
        .list(
            &ListQuery::range_inclusive(Key::from_path("logs/2025/01"), Key::from("meta")),
            false,
            None,
        )
        .await
        .unwrap();
    let keys: Vec<String> = through.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["logs/2025/01", "logsx", "meta"]);
}

#[tokio::test]
async fn destroyed_namespace_starts_over() {
    let store = MemoryStore::new();
    let (actor_id, kv) = actor_kv(&store);

    kv.put(Key::from("k"), b"v".to_vec()).await.unwrap();
    let before = kv.get(&Key::from("k")).await.unwrap().unwrap();

    assert!(store.destroy(actor_id));
    assert!(kv.get(&Key::from("k")).await.unwrap().is_none());

    kv.put(Key::from("k"), b"v".to_vec()).await.unwrap();
    let after = kv.get(&Key::from("k")).await.unwrap().unwrap();
    assert_ne!(before.version(), after.version());
}
