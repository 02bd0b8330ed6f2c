use super::coerce;
use super::{build_response, json_body, parse_body};
use crate::error::ApiError;
use crate::farm::FarmObserver;
use crate::models::{FarmConfig, NewAlert};
use chrono::Utc;
use elacare_core::SensorSnapshot;
use warp::hyper::body::Bytes;
use warp::Filter;

pub fn routes(
    observer: &FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    receive_data(observer.clone())
        .or(farm_config(observer.clone()))
        .or(put_farm_config(observer.clone()))
        .or(latest(observer.clone()))
        .or(alert(observer.clone()))
}

fn device_key() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("x-api-key")
}

/// POST /api/esp32/data
///
/// Webhook the field devices post their readings to.
/// Overwrites the farm's current snapshot and appends a history record.
///
/// Returns 401 for a wrong `x-api-key`, 400 without a `farmId`
#[utoipa::path(
    post,
    path = "/api/esp32/data",
    request_body = dto::IngestRequestDto,
    params(("x-api-key" = String, Header, description = "Device secret")),
    responses(
        (status = 200, description = "Success", body = dto::IngestResponseDto),
        (status = 400, description = "Invalid request", body = crate::rest::ErrorResponseDto),
        (status = 401, description = "Wrong device key", body = crate::rest::ErrorResponseDto)
    )
)]
fn receive_data(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "esp32" / "data"))
        .and(warp::post())
        .and(device_key())
        .and(json_body())
        .and_then(
            |observer: FarmObserver, key: Option<String>, body: Bytes| async move {
                let resp = async {
                    observer.authorize_device(key.as_deref())?;
                    let body: dto::IngestRequestDto = parse_body(&body)?;
                    let (farm_id, snapshot) = body.into_reading()?;
                    let timestamp = observer.ingest(&farm_id, snapshot).await?;
                    Ok::<_, ApiError>(dto::IngestResponseDto {
                        success: true,
                        message: "Data received successfully".to_owned(),
                        farm_id,
                        timestamp,
                    })
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/esp32/config/:farmId
///
/// Configuration the device polls on boot
///
/// Returns 404 for unknown farms
#[utoipa::path(
    get,
    path = "/api/esp32/config/{farmId}",
    params(
        ("farmId" = String, Path, description = "Farm identifier"),
        ("x-api-key" = String, Header, description = "Device secret")
    ),
    responses(
        (status = 200, description = "Success", body = dto::FarmConfigDto),
        (status = 404, description = "Unknown farm", body = crate::rest::ErrorResponseDto)
    )
)]
fn farm_config(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "esp32" / "config" / String))
        .and(warp::get())
        .and(device_key())
        .and_then(
            |observer: FarmObserver, farm_id: String, key: Option<String>| async move {
                let resp = async {
                    observer.authorize_device(key.as_deref())?;
                    let config = observer.farm_config(&farm_id).await?;
                    Ok::<_, ApiError>(dto::FarmConfigDto::from(config))
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PUT /api/esp32/config/:farmId
///
/// Provision or replace a farm's device configuration.
/// Omitted fields take their defaults.
#[utoipa::path(
    put,
    path = "/api/esp32/config/{farmId}",
    request_body = dto::FarmConfigUpdateDto,
    params(
        ("farmId" = String, Path, description = "Farm identifier"),
        ("x-api-key" = String, Header, description = "Device secret")
    ),
    responses((status = 200, description = "Success", body = dto::FarmConfigDto))
)]
fn put_farm_config(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "esp32" / "config" / String))
        .and(warp::put())
        .and(device_key())
        .and(json_body())
        .and_then(
            |observer: FarmObserver, farm_id: String, key: Option<String>, body: Bytes| async move {
                let resp = async {
                    observer.authorize_device(key.as_deref())?;
                    let update: dto::FarmConfigUpdateDto = parse_body(&body)?;
                    let config = observer.put_farm_config(update.into_config(farm_id)).await?;
                    Ok::<_, ApiError>(dto::FarmConfigDto::from(config))
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/esp32/latest/:farmId
///
/// Current snapshot, so a device can validate its last upload
#[utoipa::path(
    get,
    path = "/api/esp32/latest/{farmId}",
    params(
        ("farmId" = String, Path, description = "Farm identifier"),
        ("x-api-key" = String, Header, description = "Device secret")
    ),
    responses((status = 200, description = "Success", body = SensorSnapshot))
)]
fn latest(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "esp32" / "latest" / String))
        .and(warp::get())
        .and(device_key())
        .and_then(
            |observer: FarmObserver, farm_id: String, key: Option<String>| async move {
                let resp = async {
                    observer.authorize_device(key.as_deref())?;
                    let latest = match observer.latest(&farm_id).await? {
                        Some(snapshot) => dto::LatestDto::Snapshot(snapshot),
                        None => dto::LatestDto::Empty {
                            message: "No data available yet".to_owned(),
                        },
                    };
                    Ok::<_, ApiError>(latest)
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// POST /api/esp32/alert
///
/// Device side alert, stored append-only
#[utoipa::path(
    post,
    path = "/api/esp32/alert",
    request_body = dto::AlertRequestDto,
    params(("x-api-key" = String, Header, description = "Device secret")),
    responses(
        (status = 200, description = "Success", body = dto::AlertResponseDto),
        (status = 400, description = "Invalid request", body = crate::rest::ErrorResponseDto)
    )
)]
fn alert(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "esp32" / "alert"))
        .and(warp::post())
        .and(device_key())
        .and(json_body())
        .and_then(
            |observer: FarmObserver, key: Option<String>, body: Bytes| async move {
                let resp = async {
                    observer.authorize_device(key.as_deref())?;
                    let body: dto::AlertRequestDto = parse_body(&body)?;
                    let alert = body.into_alert()?;
                    observer.record_alert(alert).await?;
                    Ok::<_, ApiError>(dto::AlertResponseDto {
                        success: true,
                        message: "Alert recorded".to_owned(),
                    })
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use super::*;
    use crate::models::SensorToggles;
    use chrono::DateTime;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use utoipa::ToSchema;

    /// Device payload. Numeric fields may arrive as numbers or strings.
    #[derive(Debug, Default, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IngestRequestDto {
        #[schema(value_type = String)]
        pub farm_id: Option<Value>,
        #[schema(value_type = f64)]
        pub nitrogen: Option<Value>,
        #[schema(value_type = f64)]
        pub phosphorus: Option<Value>,
        #[schema(value_type = f64)]
        pub potassium: Option<Value>,
        #[schema(value_type = f64)]
        pub ph: Option<Value>,
        #[schema(value_type = f64)]
        pub boron: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub temperature: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub humidity: Option<Value>,
    }

    impl IngestRequestDto {
        pub fn into_reading(self) -> Result<(String, SensorSnapshot), ApiError> {
            let farm_id = match self.farm_id {
                Some(Value::String(farm_id)) if !farm_id.is_empty() => farm_id,
                _ => return Err(ApiError::Validation("farmId is required".to_owned())),
            };

            let snapshot = SensorSnapshot {
                nitrogen: coerce::number_or_zero(self.nitrogen.as_ref()),
                phosphorus: coerce::number_or_zero(self.phosphorus.as_ref()),
                potassium: coerce::number_or_zero(self.potassium.as_ref()),
                ph: coerce::number_or_zero(self.ph.as_ref()),
                boron: coerce::number_or_zero(self.boron.as_ref()),
                temperature: coerce::number(self.temperature.as_ref()),
                moisture: coerce::number(self.humidity.as_ref()),
                last_update: Utc::now(),
            };
            Ok((farm_id, snapshot))
        }
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct IngestResponseDto {
        pub success: bool,
        pub message: String,
        pub farm_id: String,
        pub timestamp: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct FarmConfigDto {
        pub farm_id: String,
        pub name: String,
        pub location: String,
        pub update_interval: i32,
        pub sensors: SensorToggles,
    }

    impl From<FarmConfig> for FarmConfigDto {
        fn from(config: FarmConfig) -> Self {
            FarmConfigDto {
                farm_id: config.farm_id,
                name: config.name.unwrap_or_else(|| "Unknown Farm".to_owned()),
                location: config.location.unwrap_or_default(),
                update_interval: config.update_interval,
                sensors: config.sensors,
            }
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct SensorTogglesUpdateDto {
        pub nitrogen: Option<bool>,
        pub phosphorus: Option<bool>,
        pub potassium: Option<bool>,
        pub ph: Option<bool>,
        pub boron: Option<bool>,
        pub temperature: Option<bool>,
        pub humidity: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct FarmConfigUpdateDto {
        pub name: Option<String>,
        pub location: Option<String>,
        pub update_interval: Option<i32>,
        #[serde(default)]
        pub sensors: SensorTogglesUpdateDto,
    }

    impl FarmConfigUpdateDto {
        pub fn into_config(self, farm_id: String) -> FarmConfig {
            let defaults = SensorToggles::default();
            let sensors = self.sensors;
            FarmConfig {
                farm_id,
                name: self.name,
                location: self.location,
                update_interval: self
                    .update_interval
                    .filter(|interval| *interval > 0)
                    .unwrap_or(crate::models::farm::DEFAULT_UPDATE_INTERVAL),
                sensors: SensorToggles {
                    nitrogen: sensors.nitrogen.unwrap_or(defaults.nitrogen),
                    phosphorus: sensors.phosphorus.unwrap_or(defaults.phosphorus),
                    potassium: sensors.potassium.unwrap_or(defaults.potassium),
                    ph: sensors.ph.unwrap_or(defaults.ph),
                    boron: sensors.boron.unwrap_or(defaults.boron),
                    temperature: sensors.temperature.unwrap_or(defaults.temperature),
                    humidity: sensors.humidity.unwrap_or(defaults.humidity),
                },
            }
        }
    }

    #[derive(Debug, Serialize)]
    #[serde(untagged)]
    pub enum LatestDto {
        Snapshot(SensorSnapshot),
        Empty { message: String },
    }

    #[derive(Debug, Default, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct AlertRequestDto {
        pub farm_id: Option<String>,
        pub alert_type: Option<String>,
        pub message: Option<String>,
        pub severity: Option<String>,
    }

    impl AlertRequestDto {
        pub fn into_alert(self) -> Result<NewAlert, ApiError> {
            match (self.farm_id, self.alert_type) {
                (Some(farm_id), Some(alert_type)) if !farm_id.is_empty() && !alert_type.is_empty() => {
                    Ok(NewAlert {
                        farm_id,
                        alert_type,
                        message: self.message,
                        severity: self.severity.filter(|severity| !severity.is_empty()),
                    })
                }
                _ => Err(ApiError::Validation(
                    "farmId and alertType are required".to_owned(),
                )),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize, ToSchema)]
    pub struct AlertResponseDto {
        pub success: bool,
        pub message: String,
    }
}
