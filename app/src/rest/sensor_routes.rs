use super::query::HistoryParams;
use super::{build_response, coerce, json_body, parse_body};
use crate::error::ApiError;
use crate::farm::FarmObserver;
use crate::models::HistoryQuery;
use elacare_core::SensorSnapshot;
use warp::hyper::body::Bytes;
use warp::Filter;

pub fn routes(
    observer: &FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    current(observer.clone())
        .or(history(observer.clone()))
        .or(write_test(observer.clone()))
        .or(advice(observer.clone()))
}

fn bearer() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization")
}

/// GET /api/sensors/current
///
/// Snapshot of the caller's farm.
///
/// Falls back to the demo defaults when the farm never reported
#[utoipa::path(
    get,
    path = "/api/sensors/current",
    params(("authorization" = String, Header, description = "Bearer token")),
    responses(
        (status = 200, description = "Current snapshot", body = SensorSnapshot),
        (status = 401, description = "Missing or invalid token", body = crate::rest::ErrorResponseDto)
    )
)]
fn current(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "sensors" / "current"))
        .and(warp::get())
        .and(bearer())
        .and_then(|observer: FarmObserver, token: Option<String>| async move {
            let resp = async {
                let farm_id = observer.authenticate(token.as_deref()).await?;
                observer.current_snapshot(&farm_id).await
            }
            .await;
            build_response(resp)
        })
        .boxed()
}

/// GET /api/sensors/history?startDate&endDate&limit
///
/// History records of the caller's farm, newest first
#[utoipa::path(
    get,
    path = "/api/sensors/history",
    params(
        HistoryParams,
        ("authorization" = String, Header, description = "Bearer token")
    ),
    responses(
        (status = 200, description = "History records", body = [elacare_core::SensorHistoryRecord]),
        (status = 400, description = "Invalid query", body = crate::rest::ErrorResponseDto),
        (status = 401, description = "Missing or invalid token", body = crate::rest::ErrorResponseDto)
    )
)]
fn history(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "sensors" / "history"))
        .and(warp::get())
        .and(bearer())
        .and(warp::query::<HistoryParams>())
        .and_then(
            |observer: FarmObserver, token: Option<String>, params: HistoryParams| async move {
                let resp = async {
                    let farm_id = observer.authenticate(token.as_deref()).await?;
                    let query = HistoryQuery::try_from(params)?;
                    observer.history(&farm_id, &query).await
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// POST /api/sensors/test
///
/// Writes a manual reading for the caller's farm.
/// Missing or zero values take the demo defaults.
#[utoipa::path(
    post,
    path = "/api/sensors/test",
    request_body = dto::TestReadingDto,
    params(("authorization" = String, Header, description = "Bearer token")),
    responses(
        (status = 200, description = "Reading written", body = dto::TestReadingResponseDto),
        (status = 401, description = "Missing or invalid token", body = crate::rest::ErrorResponseDto)
    )
)]
fn write_test(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "sensors" / "test"))
        .and(warp::post())
        .and(bearer())
        .and(json_body())
        .and_then(
            |observer: FarmObserver, token: Option<String>, body: Bytes| async move {
                let resp = async {
                    let farm_id = observer.authenticate(token.as_deref()).await?;
                    let body: dto::TestReadingDto = parse_body(&body)?;
                    let data = observer
                        .write_test_snapshot(&farm_id, body.into_snapshot())
                        .await?;
                    Ok::<_, ApiError>(dto::TestReadingResponseDto {
                        success: true,
                        data,
                    })
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/sensors/advice
///
/// Classifications, recommendations and expert tips
/// for the caller's current snapshot
#[utoipa::path(
    get,
    path = "/api/sensors/advice",
    params(("authorization" = String, Header, description = "Bearer token")),
    responses(
        (status = 200, description = "Advice", body = crate::farm::FarmAdvice),
        (status = 401, description = "Missing or invalid token", body = crate::rest::ErrorResponseDto)
    )
)]
fn advice(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "sensors" / "advice"))
        .and(warp::get())
        .and(bearer())
        .and_then(|observer: FarmObserver, token: Option<String>| async move {
            let resp = async {
                let farm_id = observer.authenticate(token.as_deref()).await?;
                observer.advice(&farm_id).await
            }
            .await;
            build_response(resp)
        })
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use utoipa::ToSchema;

    #[derive(Debug, Default, Deserialize, ToSchema)]
    pub struct TestReadingDto {
        #[schema(value_type = Option<f64>)]
        pub nitrogen: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub phosphorus: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub potassium: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub ph: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub boron: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub temperature: Option<Value>,
        #[schema(value_type = Option<f64>)]
        pub humidity: Option<Value>,
    }

    impl TestReadingDto {
        pub fn into_snapshot(self) -> SensorSnapshot {
            let or_default = |value: Option<&Value>, default: f64| {
                coerce::number(value)
                    .filter(|v| *v != 0.0)
                    .unwrap_or(default)
            };
            SensorSnapshot {
                nitrogen: or_default(self.nitrogen.as_ref(), SensorSnapshot::DEMO_NITROGEN),
                phosphorus: or_default(self.phosphorus.as_ref(), SensorSnapshot::DEMO_PHOSPHORUS),
                potassium: or_default(self.potassium.as_ref(), SensorSnapshot::DEMO_POTASSIUM),
                ph: or_default(self.ph.as_ref(), SensorSnapshot::DEMO_PH),
                boron: or_default(self.boron.as_ref(), SensorSnapshot::DEMO_BORON),
                temperature: coerce::number(self.temperature.as_ref()),
                moisture: coerce::number(self.humidity.as_ref()),
                last_update: Utc::now(),
            }
        }
    }

    #[derive(Debug, Serialize, ToSchema)]
    pub struct TestReadingResponseDto {
        pub success: bool,
        pub data: SensorSnapshot,
    }
}
