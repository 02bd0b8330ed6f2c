use crate::ai::{RemedyRequest, RemedyResult, RemedyText};
use crate::auth::Identity;
use crate::context::AppContext;
use crate::error::{AiError, ApiError, AuthError};
use crate::models::{Alert, FarmConfig, HistoryQuery, NewAlert, UserRecord};
use chrono::{DateTime, Utc};
use elacare_core::monitor::{summarize, MonitorSummary};
use elacare_core::recommend::{recommend, Recommendation, EXPERT_TIPS};
use elacare_core::threshold::{classify_snapshot, Classification};
use elacare_core::{RemedyReading, SensorHistoryRecord, SensorSnapshot, TrendPoint};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

#[cfg(test)]
mod test;

/// Classifier and recommendation output for one snapshot.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmAdvice {
    pub farm_id: String,
    pub snapshot: SensorSnapshot,
    pub classifications: Vec<Classification>,
    pub recommendations: Vec<Recommendation>,
    pub expert_tips: Vec<String>,
}

/// Service facade over the shared application context.
#[derive(Clone)]
pub struct FarmObserver {
    inner: Arc<AppContext>,
}

impl FarmObserver {
    pub fn new(inner: Arc<AppContext>) -> Self {
        FarmObserver { inner }
    }

    pub fn authorize_device(&self, key: Option<&str>) -> Result<(), ApiError> {
        self.inner.verify_device_key(key).map_err(|err| {
            warn!("Rejected device request");
            ApiError::from(err)
        })
    }

    /// Resolves the bearer token and the farm its owner is bound to.
    /// Users without a farm assignment own the farm named after their uid.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<String, ApiError> {
        let identity = self.inner.authenticate(authorization).await?;
        let farm_id = self
            .inner
            .store
            .user(&identity.uid)
            .await?
            .and_then(|user| user.farm_id)
            .unwrap_or(identity.uid);
        Ok(farm_id)
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub async fn ingest(
        &self,
        farm_id: &str,
        snapshot: SensorSnapshot,
    ) -> Result<DateTime<Utc>, ApiError> {
        let timestamp = snapshot.last_update;
        self.inner.store.put_current(farm_id, &snapshot).await?;
        self.inner
            .store
            .append_history(farm_id, &snapshot, timestamp)
            .await?;

        info!(farm_id = farm_id, "Stored sensor reading");
        Ok(timestamp)
    }

    pub async fn farm_config(&self, farm_id: &str) -> Result<FarmConfig, ApiError> {
        self.inner
            .store
            .farm(farm_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Farm not found".to_owned()))
    }

    pub async fn put_farm_config(&self, config: FarmConfig) -> Result<FarmConfig, ApiError> {
        self.inner.store.upsert_farm(&config).await?;
        info!(farm_id = config.farm_id.as_str(), "Provisioned farm config");
        Ok(config)
    }

    pub async fn latest(&self, farm_id: &str) -> Result<Option<SensorSnapshot>, ApiError> {
        Ok(self.inner.store.current(farm_id).await?)
    }

    pub async fn record_alert(&self, alert: NewAlert) -> Result<Alert, ApiError> {
        let alert = self.inner.store.insert_alert(alert).await?;
        warn!(
            farm_id = alert.farm_id.as_str(),
            alert_type = alert.alert_type.as_str(),
            severity = alert.severity.as_str(),
            "Device alert"
        );
        Ok(alert)
    }

    /// Stored snapshot, or the demo defaults stamped now.
    pub async fn current_snapshot(&self, farm_id: &str) -> Result<SensorSnapshot, ApiError> {
        let snapshot = self.inner.store.current(farm_id).await?;
        if snapshot.is_none() {
            debug!(farm_id = farm_id, "No snapshot yet, serving defaults");
        }
        Ok(snapshot.unwrap_or_else(SensorSnapshot::demo))
    }

    pub async fn history(
        &self,
        farm_id: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<SensorHistoryRecord>, ApiError> {
        Ok(self.inner.store.history(farm_id, query).await?)
    }

    /// Writes a manual test reading through the regular ingestion path.
    pub async fn write_test_snapshot(
        &self,
        farm_id: &str,
        snapshot: SensorSnapshot,
    ) -> Result<SensorSnapshot, ApiError> {
        self.ingest(farm_id, snapshot.clone()).await?;
        Ok(snapshot)
    }

    pub async fn advice(&self, farm_id: &str) -> Result<FarmAdvice, ApiError> {
        let snapshot = self.current_snapshot(farm_id).await?;
        Ok(FarmAdvice {
            farm_id: farm_id.to_owned(),
            classifications: classify_snapshot(&snapshot),
            recommendations: recommend(&snapshot),
            expert_tips: EXPERT_TIPS.iter().map(|tip| tip.to_string()).collect(),
            snapshot,
        })
    }

    pub async fn backend_remedy(&self, reading: &RemedyReading) -> Result<RemedyText, AiError> {
        self.inner.generator.generate(reading).await
    }

    pub async fn analyze_trend(&self, points: &[TrendPoint]) -> Result<String, AiError> {
        self.inner.generator.analyze_trend(points).await
    }

    pub fn ai_configured(&self) -> bool {
        self.inner.generator.is_configured()
    }

    /// Runs the strategy chain and attaches the monitor summary.
    pub async fn remedy(&self, request: RemedyRequest) -> (RemedyResult, MonitorSummary) {
        let result = self.inner.remedy_client.generate_remedy(&request).await;
        let summary = summarize(&request.reading, &result.remedy);
        (result, summary)
    }

    pub async fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        self.inner.identity.verify(token).await
    }

    pub async fn set_farm_id(
        &self,
        uid: &str,
        farm_id: &str,
        email: Option<String>,
    ) -> Result<UserRecord, ApiError> {
        let record = UserRecord {
            uid: uid.to_owned(),
            farm_id: Some(farm_id.to_owned()),
            email,
            created_at: Utc::now(),
        };
        self.inner.store.upsert_user(&record).await?;
        info!(farm_id = farm_id, uid = uid, "Assigned farm to user");
        self.user(uid).await
    }

    pub async fn user(&self, uid: &str) -> Result<UserRecord, ApiError> {
        self.inner
            .store
            .user(uid)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))
    }

    pub async fn database_state(&self) -> String {
        self.inner.store.check().await
    }
}
