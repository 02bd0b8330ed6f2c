use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_UPDATE_INTERVAL: i32 = 300;

/// Which probes a farm's device should report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SensorToggles {
    pub nitrogen: bool,
    pub phosphorus: bool,
    pub potassium: bool,
    pub ph: bool,
    pub boron: bool,
    pub temperature: bool,
    pub humidity: bool,
}

impl Default for SensorToggles {
    fn default() -> Self {
        SensorToggles {
            nitrogen: true,
            phosphorus: true,
            potassium: true,
            ph: true,
            boron: true,
            temperature: false,
            humidity: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmConfig {
    pub farm_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    /// Seconds between device uploads.
    pub update_interval: i32,
    pub sensors: SensorToggles,
}

impl FarmConfig {
    pub fn new(farm_id: String) -> Self {
        FarmConfig {
            farm_id,
            name: None,
            location: None,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            sensors: SensorToggles::default(),
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct FarmDao {
    farm_id: String,
    name: Option<String>,
    location: Option<String>,
    update_interval: i32,
    sensor_nitrogen: bool,
    sensor_phosphorus: bool,
    sensor_potassium: bool,
    sensor_ph: bool,
    sensor_boron: bool,
    sensor_temperature: bool,
    sensor_humidity: bool,
}

impl From<FarmDao> for FarmConfig {
    fn from(val: FarmDao) -> Self {
        FarmConfig {
            farm_id: val.farm_id,
            name: val.name,
            location: val.location,
            update_interval: val.update_interval,
            sensors: SensorToggles {
                nitrogen: val.sensor_nitrogen,
                phosphorus: val.sensor_phosphorus,
                potassium: val.sensor_potassium,
                ph: val.sensor_ph,
                boron: val.sensor_boron,
                temperature: val.sensor_temperature,
                humidity: val.sensor_humidity,
            },
        }
    }
}

pub async fn upsert(conn: &sqlx::PgPool, config: &FarmConfig) -> Result<(), StoreError> {
    let sensors = &config.sensors;
    sql_stmnt!(
        r#"INSERT INTO farms
            (farm_id, name, location, update_interval, sensor_nitrogen, sensor_phosphorus,
             sensor_potassium, sensor_ph, sensor_boron, sensor_temperature, sensor_humidity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (farm_id) DO UPDATE SET
                name = EXCLUDED.name, location = EXCLUDED.location,
                update_interval = EXCLUDED.update_interval,
                sensor_nitrogen = EXCLUDED.sensor_nitrogen,
                sensor_phosphorus = EXCLUDED.sensor_phosphorus,
                sensor_potassium = EXCLUDED.sensor_potassium,
                sensor_ph = EXCLUDED.sensor_ph, sensor_boron = EXCLUDED.sensor_boron,
                sensor_temperature = EXCLUDED.sensor_temperature,
                sensor_humidity = EXCLUDED.sensor_humidity"#,
        &config.farm_id,
        &config.name,
        &config.location,
        config.update_interval,
        sensors.nitrogen,
        sensors.phosphorus,
        sensors.potassium,
        sensors.ph,
        sensors.boron,
        sensors.temperature,
        sensors.humidity
    )
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get(conn: &sqlx::PgPool, farm_id: &str) -> Result<Option<FarmDao>, StoreError> {
    Ok(sql_stmnt!(
        FarmDao,
        r#"SELECT farm_id, name, location, update_interval, sensor_nitrogen, sensor_phosphorus,
                sensor_potassium, sensor_ph, sensor_boron, sensor_temperature, sensor_humidity
            FROM farms
            WHERE farm_id = $1"#,
        farm_id
    )
    .fetch_optional(conn)
    .await?)
}
