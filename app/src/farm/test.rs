use super::*;
use crate::context::test_context;
use elacare_core::monitor::MonitorStatus;
use elacare_core::recommend::AdviceKind;

fn build_observer() -> FarmObserver {
    FarmObserver::new(test_context(&[]))
}

fn reading(nitrogen: f64) -> SensorSnapshot {
    let mut snapshot = SensorSnapshot::demo();
    snapshot.nitrogen = nitrogen;
    snapshot
}

#[tokio::test]
async fn test_ingest_writes_current_and_history() {
    // Prepare
    let observer = build_observer();

    // Execute
    observer.ingest("farm-1", reading(10.0)).await.unwrap();
    observer.ingest("farm-1", reading(52.5)).await.unwrap();

    // Validate
    let latest = observer.latest("farm-1").await.unwrap().unwrap();
    assert_eq!(latest.nitrogen, 52.5);
    let history = observer
        .history("farm-1", &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_current_snapshot_defaults() {
    let observer = build_observer();

    let snapshot = observer.current_snapshot("unknown").await.unwrap();

    assert_eq!(snapshot.nitrogen, 45.0);
    assert_eq!(snapshot.phosphorus, 35.0);
    assert_eq!(snapshot.potassium, 120.0);
    assert_eq!(snapshot.ph, 6.8);
    assert_eq!(snapshot.boron, 2.1);
    assert!(observer.latest("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn test_farm_config_not_found() {
    let observer = build_observer();

    let missing = observer.farm_config("farm-x").await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));

    observer
        .put_farm_config(FarmConfig::new("farm-x".to_owned()))
        .await
        .unwrap();
    let found = observer.farm_config("farm-x").await.unwrap();
    assert_eq!(found.update_interval, 300);
}

#[tokio::test]
async fn test_authenticate_resolves_farm() {
    let observer = build_observer();

    let own = observer.authenticate(Some("Bearer grower-token")).await.unwrap();
    assert_eq!(own, "grower-uid");

    observer
        .set_farm_id("grower-uid", "farm-7", None)
        .await
        .unwrap();
    let assigned = observer.authenticate(Some("Bearer grower-token")).await.unwrap();
    assert_eq!(assigned, "farm-7");

    let denied = observer.authenticate(Some("Bearer nope")).await;
    assert!(matches!(denied, Err(ApiError::Unauthorized(AuthError::InvalidToken))));
}

#[tokio::test]
async fn test_advice_for_deficient_farm() {
    let observer = build_observer();
    let mut snapshot = reading(10.0);
    snapshot.phosphorus = 20.0;
    observer.ingest("farm-1", snapshot).await.unwrap();

    let advice = observer.advice("farm-1").await.unwrap();

    assert_eq!(advice.recommendations.len(), 1);
    assert_eq!(advice.recommendations[0].kind, AdviceKind::Warning);
    assert_eq!(advice.classifications.len(), 5);
    assert_eq!(advice.expert_tips.len(), 5);
}

#[tokio::test]
async fn test_remedy_in_demo_mode() {
    let observer = build_observer();
    let request = RemedyRequest {
        reading: RemedyReading {
            nitrogen: 30.0,
            ph: 6.8,
            boron: 0.5,
        },
        api_key: None,
    };

    let (result, summary) = observer.remedy(request).await;

    assert!(result.success);
    assert_eq!(result.source, "backend-demo");
    assert_eq!(summary.status, MonitorStatus::Critical);
    assert_eq!(summary.key_actions, vec!["**IMMEDIATE ACTIONS**"]);
}

#[tokio::test]
async fn test_user_not_found() {
    let observer = build_observer();
    assert!(matches!(
        observer.user("ghost").await,
        Err(ApiError::NotFound(_))
    ));
}
