use cafecrawl_core::models::UpsertOutcome;
use cafecrawl_core::traits::CafeStore;
use cafecrawl_db::CafeRepository;

use crate::integration::common::{at, cafe, setup_test_db};

#[tokio::test]
async fn upsert_inserts_then_updates() {
    let (pool, _container) = setup_test_db().await;
    let repo = CafeRepository::new(pool);

    let first = repo.upsert(&cafe("100", "마포구", at(1))).await.unwrap();
    let second = repo.upsert(&cafe("100", "마포구", at(2))).await.unwrap();

    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Updated);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn update_overwrites_fields_but_keeps_first_seen() {
    let (pool, _container) = setup_test_db().await;
    let repo = CafeRepository::new(pool);

    repo.upsert(&cafe("200", "마포구", at(1))).await.unwrap();

    let mut changed = cafe("200", "서대문구", at(5));
    changed.name = "Renamed Roastery".into();
    changed.phone = String::new();
    repo.upsert(&changed).await.unwrap();

    let stored = repo.get("200").await.unwrap().expect("cafe should exist");
    assert_eq!(stored.name, "Renamed Roastery");
    assert_eq!(stored.zone, "서대문구");
    assert_eq!(stored.phone, "");
    assert_eq!(stored.updated_at, at(5));
    assert_eq!(stored.first_seen_at, at(1));
}

#[tokio::test]
async fn replaying_a_snapshot_leaves_rows_unchanged() {
    let (pool, _container) = setup_test_db().await;
    let repo = CafeRepository::new(pool);
    let batch = [cafe("1", "A", at(3)), cafe("2", "A", at(3))];

    for c in &batch {
        repo.upsert(c).await.unwrap();
    }
    let before = repo.list_all(None).await.unwrap();

    for _ in 0..2 {
        for c in &batch {
            assert_eq!(repo.upsert(c).await.unwrap(), UpsertOutcome::Updated);
        }
    }

    assert_eq!(repo.list_all(None).await.unwrap(), before);
}

#[tokio::test]
async fn get_missing_returns_none() {
    let (pool, _container) = setup_test_db().await;
    let repo = CafeRepository::new(pool);

    assert!(repo.get("does-not-exist").await.unwrap().is_none());
}

#[tokio::test]
async fn listing_filters_by_zone_and_orders_by_recency() {
    let (pool, _container) = setup_test_db().await;
    let repo = CafeRepository::new(pool);

    repo.upsert(&cafe("1", "A", at(1))).await.unwrap();
    repo.upsert(&cafe("2", "A", at(3))).await.unwrap();
    repo.upsert(&cafe("3", "B", at(2))).await.unwrap();

    let zone_a = repo.list_by_zone("A", 10).await.unwrap();
    let ids: Vec<_> = zone_a.iter().map(|c| c.external_id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);

    let recent = repo.list_recent(2).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|c| c.external_id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3"]);

    let exported = repo.list_all(Some("B")).await.unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].external_id, "3");
}

#[tokio::test]
async fn health_check_succeeds() {
    let (pool, _container) = setup_test_db().await;
    let repo = CafeRepository::new(pool);

    repo.health_check().await.unwrap();
}
