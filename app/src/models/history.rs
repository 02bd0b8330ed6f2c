use crate::error::StoreError;
use chrono::{DateTime, Utc};
use elacare_core::{SensorHistoryRecord, SensorSnapshot};
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Inclusive time window plus row limit for history reads.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub limit: i64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        HistoryQuery {
            range: None,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl HistoryQuery {
    pub fn matches(&self, timestamp: &DateTime<Utc>) -> bool {
        match &self.range {
            Some((start, end)) => start <= timestamp && timestamp <= end,
            None => true,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct HistoryDao {
    pub(crate) id: Uuid,
    pub(crate) nitrogen: f64,
    pub(crate) phosphorus: f64,
    pub(crate) potassium: f64,
    pub(crate) ph: f64,
    pub(crate) boron: f64,
    pub(crate) temperature: Option<f64>,
    pub(crate) moisture: Option<f64>,
    pub(crate) last_update: DateTime<Utc>,
    pub(crate) timestamp: DateTime<Utc>,
}

impl From<HistoryDao> for SensorHistoryRecord {
    fn from(val: HistoryDao) -> Self {
        SensorHistoryRecord {
            id: val.id.to_string(),
            snapshot: SensorSnapshot {
                nitrogen: val.nitrogen,
                phosphorus: val.phosphorus,
                potassium: val.potassium,
                ph: val.ph,
                boron: val.boron,
                temperature: val.temperature,
                moisture: val.moisture,
                last_update: val.last_update,
            },
            timestamp: val.timestamp,
        }
    }
}

pub async fn insert(
    conn: &sqlx::PgPool,
    farm_id: &str,
    snapshot: &SensorSnapshot,
    timestamp: DateTime<Utc>,
) -> Result<SensorHistoryRecord, StoreError> {
    let id = Uuid::new_v4();
    sql_stmnt!(
        r#"INSERT INTO sensor_history
            (id, farm_id, nitrogen, phosphorus, potassium, ph, boron, temperature, moisture, last_update, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        id,
        farm_id,
        snapshot.nitrogen,
        snapshot.phosphorus,
        snapshot.potassium,
        snapshot.ph,
        snapshot.boron,
        snapshot.temperature,
        snapshot.moisture,
        snapshot.last_update,
        timestamp
    )
    .execute(conn)
    .await?;

    Ok(SensorHistoryRecord {
        id: id.to_string(),
        snapshot: snapshot.clone(),
        timestamp,
    })
}

pub async fn get(
    conn: &sqlx::PgPool,
    farm_id: &str,
    query: &HistoryQuery,
) -> Result<Vec<SensorHistoryRecord>, StoreError> {
    let (start, end) = match query.range {
        Some((start, end)) => (Some(start), Some(end)),
        None => (None, None),
    };

    let daos = sql_stmnt!(
        HistoryDao,
        r#"SELECT id, nitrogen, phosphorus, potassium, ph, boron, temperature, moisture, last_update, timestamp
            FROM sensor_history
            WHERE farm_id = $1
                AND ($2::timestamptz IS NULL OR timestamp >= $2)
                AND ($3::timestamptz IS NULL OR timestamp <= $3)
            ORDER BY timestamp DESC
            LIMIT $4"#,
        farm_id,
        start,
        end,
        query.limit
    )
    .fetch_all(conn)
    .await?;

    Ok(daos.into_iter().map(SensorHistoryRecord::from).collect())
}
