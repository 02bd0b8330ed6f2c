use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_SEVERITY: &str = "medium";

/// Device raised alert, append-only.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub farm_id: String,
    pub alert_type: String,
    pub message: Option<String>,
    pub severity: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub farm_id: String,
    pub alert_type: String,
    pub message: Option<String>,
    pub severity: Option<String>,
}

impl NewAlert {
    pub(crate) fn into_alert(self, id: Uuid, timestamp: DateTime<Utc>) -> Alert {
        Alert {
            id: id.to_string(),
            farm_id: self.farm_id,
            alert_type: self.alert_type,
            message: self.message,
            severity: self
                .severity
                .unwrap_or_else(|| DEFAULT_SEVERITY.to_owned()),
            timestamp,
            read: false,
        }
    }
}

pub async fn insert(conn: &sqlx::PgPool, alert: NewAlert) -> Result<Alert, StoreError> {
    let id = Uuid::new_v4();
    let alert = alert.into_alert(id, Utc::now());
    sql_stmnt!(
        r#"INSERT INTO alerts (id, farm_id, alert_type, message, severity, timestamp, read)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        id,
        &alert.farm_id,
        &alert.alert_type,
        &alert.message,
        &alert.severity,
        alert.timestamp,
        alert.read
    )
    .execute(conn)
    .await?;
    Ok(alert)
}
