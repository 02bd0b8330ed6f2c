use crate::error::StoreError;
use chrono::{DateTime, Utc};
use elacare_core::SensorSnapshot;

#[derive(sqlx::FromRow)]
pub struct SnapshotDao {
    pub(crate) nitrogen: f64,
    pub(crate) phosphorus: f64,
    pub(crate) potassium: f64,
    pub(crate) ph: f64,
    pub(crate) boron: f64,
    pub(crate) temperature: Option<f64>,
    pub(crate) moisture: Option<f64>,
    pub(crate) last_update: DateTime<Utc>,
}

impl From<SnapshotDao> for SensorSnapshot {
    fn from(val: SnapshotDao) -> Self {
        SensorSnapshot {
            nitrogen: val.nitrogen,
            phosphorus: val.phosphorus,
            potassium: val.potassium,
            ph: val.ph,
            boron: val.boron,
            temperature: val.temperature,
            moisture: val.moisture,
            last_update: val.last_update,
        }
    }
}

pub async fn upsert(
    conn: &sqlx::PgPool,
    farm_id: &str,
    snapshot: &SensorSnapshot,
) -> Result<(), StoreError> {
    sql_stmnt!(
        r#"INSERT INTO sensor_current
            (farm_id, nitrogen, phosphorus, potassium, ph, boron, temperature, moisture, last_update)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (farm_id) DO UPDATE SET
                nitrogen = EXCLUDED.nitrogen, phosphorus = EXCLUDED.phosphorus,
                potassium = EXCLUDED.potassium, ph = EXCLUDED.ph, boron = EXCLUDED.boron,
                temperature = EXCLUDED.temperature, moisture = EXCLUDED.moisture,
                last_update = EXCLUDED.last_update"#,
        farm_id,
        snapshot.nitrogen,
        snapshot.phosphorus,
        snapshot.potassium,
        snapshot.ph,
        snapshot.boron,
        snapshot.temperature,
        snapshot.moisture,
        snapshot.last_update
    )
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get(conn: &sqlx::PgPool, farm_id: &str) -> Result<Option<SnapshotDao>, StoreError> {
    Ok(sql_stmnt!(
        SnapshotDao,
        r#"SELECT nitrogen, phosphorus, potassium, ph, boron, temperature, moisture, last_update
            FROM sensor_current
            WHERE farm_id = $1"#,
        farm_id
    )
    .fetch_optional(conn)
    .await?)
}
