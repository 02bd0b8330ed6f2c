use chrono::{Duration, TimeZone, Utc};
use elacare_core::SensorSnapshot;

use super::*;

fn memory() -> Datastore {
    Datastore::Memory(MemoryStore::default())
}

fn snapshot(nitrogen: f64) -> SensorSnapshot {
    let mut snapshot = SensorSnapshot::demo();
    snapshot.nitrogen = nitrogen;
    snapshot
}

#[tokio::test]
async fn test_current_is_last_writer() {
    let store = memory();
    assert_eq!(store.current("farm-a").await.unwrap(), None);

    store.put_current("farm-a", &snapshot(10.0)).await.unwrap();
    store.put_current("farm-a", &snapshot(20.0)).await.unwrap();

    let current = store.current("farm-a").await.unwrap().unwrap();
    assert_eq!(current.nitrogen, 20.0);
    assert_eq!(store.current("farm-b").await.unwrap(), None);
}

#[tokio::test]
async fn test_history_order_limit_range() {
    // Prepare
    let store = memory();
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    for day in 0..5 {
        store
            .append_history("farm-a", &snapshot(day as f64), base + Duration::days(day))
            .await
            .unwrap();
    }
    store
        .append_history("farm-b", &snapshot(99.0), base)
        .await
        .unwrap();

    // Execute
    let all = store.history("farm-a", &HistoryQuery::default()).await.unwrap();
    let limited = store
        .history(
            "farm-a",
            &HistoryQuery {
                range: None,
                limit: 2,
            },
        )
        .await
        .unwrap();
    let ranged = store
        .history(
            "farm-a",
            &HistoryQuery {
                range: Some((base + Duration::days(1), base + Duration::days(3))),
                limit: 100,
            },
        )
        .await
        .unwrap();

    // Validate
    let nitrogen: Vec<f64> = all.iter().map(|r| r.snapshot.nitrogen).collect();
    assert_eq!(nitrogen, vec![4.0, 3.0, 2.0, 1.0, 0.0]);
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].snapshot.nitrogen, 4.0);
    let nitrogen: Vec<f64> = ranged.iter().map(|r| r.snapshot.nitrogen).collect();
    assert_eq!(nitrogen, vec![3.0, 2.0, 1.0]);
    assert_ne!(all[0].id, all[1].id);
}

#[tokio::test]
async fn test_farm_upsert() {
    let store = memory();
    assert_eq!(store.farm("farm-a").await.unwrap(), None);

    let mut config = FarmConfig::new("farm-a".to_owned());
    store.upsert_farm(&config).await.unwrap();
    config.update_interval = 60;
    store.upsert_farm(&config).await.unwrap();

    let stored = store.farm("farm-a").await.unwrap().unwrap();
    assert_eq!(stored.update_interval, 60);
    assert!(stored.sensors.boron);
    assert!(!stored.sensors.humidity);
}

#[tokio::test]
async fn test_alert_defaults() {
    let store = memory();
    let alert = store
        .insert_alert(NewAlert {
            farm_id: "farm-a".to_owned(),
            alert_type: "low_battery".to_owned(),
            message: None,
            severity: None,
        })
        .await
        .unwrap();

    assert_eq!(alert.severity, "medium");
    assert!(!alert.read);
    if let Datastore::Memory(inner) = &store {
        assert_eq!(inner.alerts("farm-a").len(), 1);
        assert!(inner.alerts("farm-b").is_empty());
    }
}

#[tokio::test]
async fn test_user_upsert_keeps_email() {
    let store = memory();
    let created_at = Utc::now();
    store
        .upsert_user(&UserRecord {
            uid: "uid-1".to_owned(),
            farm_id: Some("farm-a".to_owned()),
            email: Some("grower@example.com".to_owned()),
            created_at,
        })
        .await
        .unwrap();
    store
        .upsert_user(&UserRecord {
            uid: "uid-1".to_owned(),
            farm_id: Some("farm-b".to_owned()),
            email: None,
            created_at: created_at + Duration::hours(1),
        })
        .await
        .unwrap();

    let user = store.user("uid-1").await.unwrap().unwrap();
    assert_eq!(user.farm_id.as_deref(), Some("farm-b"));
    assert_eq!(user.email.as_deref(), Some("grower@example.com"));
    assert_eq!(user.created_at, created_at);
}

#[tokio::test]
async fn test_memory_check() {
    assert_eq!(memory().check().await, "memory");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_roundtrip() {
    let url = std::env::var("DATABASE_URL").unwrap();
    let store = establish_datastore(Some(&url)).await.unwrap();
    let farm_id = format!("test-{}", uuid::Uuid::new_v4());

    store.put_current(&farm_id, &snapshot(52.5)).await.unwrap();
    store
        .append_history(&farm_id, &snapshot(52.5), Utc::now())
        .await
        .unwrap();

    let current = store.current(&farm_id).await.unwrap().unwrap();
    assert_eq!(current.nitrogen, 52.5);
    let history = store.history(&farm_id, &HistoryQuery::default()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(store.check().await, "connected");
}
