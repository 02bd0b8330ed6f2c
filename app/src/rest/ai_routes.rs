use super::{build_response, coerce, json_body, parse_body, reply_with};
use crate::ai::{RemedyRequest, RemedyResult};
use crate::error::AiError;
use crate::farm::FarmObserver;
use chrono::Utc;
use elacare_core::monitor::MonitorSummary;
use elacare_core::{RemedyReading, TrendPoint};
use serde_json::Value;
use tracing::error;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::Filter;

const MISSING_READING: &str = "Missing required sensor data: nitrogen, ph, boron";
const MISSING_READING_HINT: &str = "Please provide nitrogen, pH, and boron values";

pub fn routes(
    observer: &FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    generate_remedy(observer.clone())
        .or(analyze_trend(observer.clone()))
        .or(remedy(observer.clone()))
        .or(ai_health(observer.clone()))
}

/// POST /api/ai/generate-remedy
///
/// Remedy text from the server side generator,
/// templated in demo mode and Gemini backed in live mode
#[utoipa::path(
    post,
    path = "/api/ai/generate-remedy",
    request_body = RemedyReading,
    responses(
        (status = 200, description = "Remedy generated", body = dto::GeneratedRemedyDto),
        (status = 400, description = "Missing sensor values", body = dto::AiFailureDto),
        (status = 500, description = "Generation failed", body = dto::AiFailureDto)
    )
)]
fn generate_remedy(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "ai" / "generate-remedy"))
        .and(warp::post())
        .and(json_body())
        .and_then(|observer: FarmObserver, body: Bytes| async move {
            let reading = match read_reading(&body) {
                Some(reading) => reading,
                None => return Ok::<_, warp::Rejection>(missing_reading()),
            };

            let resp = match observer.backend_remedy(&reading).await {
                Ok(text) => reply_with(
                    StatusCode::OK,
                    &dto::GeneratedRemedyDto {
                        success: true,
                        remedy: text.text,
                        timestamp: Utc::now(),
                        sensor_data: reading,
                        model: text.model,
                        source: text.source,
                        note: text.note,
                    },
                ),
                Err(err) => ai_failure(
                    &err,
                    None,
                    Some("Unable to generate recommendations. Please check backend configuration."),
                ),
            };
            Ok(resp)
        })
        .boxed()
}

/// POST /api/ai/analyze-trend
///
/// Trend analysis over a series of daily readings.
/// Needs the server Gemini key.
#[utoipa::path(
    post,
    path = "/api/ai/analyze-trend",
    request_body = dto::TrendRequestDto,
    responses(
        (status = 200, description = "Trend analysis", body = dto::TrendAnalysisDto),
        (status = 400, description = "No history given", body = dto::AiFailureDto),
        (status = 500, description = "Analysis failed", body = dto::AiFailureDto)
    )
)]
fn analyze_trend(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "ai" / "analyze-trend"))
        .and(warp::post())
        .and(json_body())
        .and_then(|observer: FarmObserver, body: Bytes| async move {
            let points = parse_body::<dto::TrendRequestDto>(&body)
                .ok()
                .and_then(|body| body.historical_data)
                .filter(|points| !points.is_empty())
                .map(|points| points.iter().map(trend_point).collect::<Vec<_>>());
            let points = match points {
                Some(points) => points,
                None => {
                    return Ok::<_, warp::Rejection>(reply_with(
                        StatusCode::BAD_REQUEST,
                        &dto::AiFailureDto {
                            success: false,
                            error: "Historical data required for trend analysis".to_owned(),
                            remedy: None,
                            analysis: None,
                        },
                    ))
                }
            };

            let resp = match observer.analyze_trend(&points).await {
                Ok(analysis) => reply_with(
                    StatusCode::OK,
                    &dto::TrendAnalysisDto {
                        success: true,
                        analysis,
                        timestamp: Utc::now(),
                    },
                ),
                Err(err) => ai_failure(
                    &err,
                    Some("Unable to analyze trend data at this time."),
                    None,
                ),
            };
            Ok(resp)
        })
        .boxed()
}

/// POST /api/ai/remedy
///
/// Runs the remedy strategy chain, optionally with the caller's own
/// Gemini key from `x-gemini-key`.
///
/// Always answers 200. Failures are reported inside the result.
#[utoipa::path(
    post,
    path = "/api/ai/remedy",
    request_body = RemedyReading,
    params(("x-gemini-key" = Option<String>, Header, description = "User supplied Gemini key")),
    responses(
        (status = 200, description = "Remedy result with monitor summary", body = dto::RemedyResponseDto),
        (status = 400, description = "Missing sensor values", body = dto::AiFailureDto)
    )
)]
fn remedy(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "ai" / "remedy"))
        .and(warp::post())
        .and(warp::header::optional::<String>("x-gemini-key"))
        .and(json_body())
        .and_then(
            |observer: FarmObserver, api_key: Option<String>, body: Bytes| async move {
                let reading = match read_reading(&body) {
                    Some(reading) => reading,
                    None => return Ok::<_, warp::Rejection>(missing_reading()),
                };

                let (result, monitor) = observer.remedy(RemedyRequest { reading, api_key }).await;
                Ok(reply_with(
                    StatusCode::OK,
                    &dto::RemedyResponseDto { result, monitor },
                ))
            },
        )
        .boxed()
}

/// GET /api/ai/health
#[utoipa::path(
    get,
    path = "/api/ai/health",
    responses((status = 200, description = "AI service state", body = dto::AiHealthDto))
)]
fn ai_health(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "ai" / "health"))
        .and(warp::get())
        .and_then(|observer: FarmObserver| async move {
            build_response(Ok(dto::AiHealthDto {
                status: "healthy".to_owned(),
                service: "gemini-ai".to_owned(),
                timestamp: Utc::now(),
                configured: observer.ai_configured(),
            }))
        })
        .boxed()
}

/// Reads `{nitrogen, ph, boron}`. Any missing or unreadable value voids the reading.
fn read_reading(body: &[u8]) -> Option<RemedyReading> {
    let body: Value = parse_body(body).ok()?;
    Some(RemedyReading {
        nitrogen: coerce::number(body.get("nitrogen"))?,
        ph: coerce::number(body.get("ph"))?,
        boron: coerce::number(body.get("boron"))?,
    })
}

fn trend_point(entry: &Value) -> TrendPoint {
    TrendPoint {
        ph: coerce::number(entry.get("ph")),
        nitrogen: coerce::number(entry.get("nitrogen")),
        boron: coerce::number(entry.get("boron")),
    }
}

fn missing_reading() -> Response {
    reply_with(
        StatusCode::BAD_REQUEST,
        &dto::AiFailureDto {
            success: false,
            error: MISSING_READING.to_owned(),
            remedy: Some(MISSING_READING_HINT.to_owned()),
            analysis: None,
        },
    )
}

fn ai_failure(err: &AiError, analysis: Option<&str>, remedy: Option<&str>) -> Response {
    error!(kind = err.kind(), "AI request failed: {}", err);
    reply_with(
        StatusCode::INTERNAL_SERVER_ERROR,
        &dto::AiFailureDto {
            success: false,
            error: err.to_string(),
            remedy: remedy.map(str::to_owned),
            analysis: analysis.map(str::to_owned),
        },
    )
}

///
/// DTO
///
pub mod dto {
    use super::*;
    use chrono::DateTime;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct GeneratedRemedyDto {
        pub success: bool,
        pub remedy: String,
        pub timestamp: DateTime<Utc>,
        pub sensor_data: RemedyReading,
        pub model: String,
        pub source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, ToSchema)]
    pub struct AiFailureDto {
        pub success: bool,
        pub error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub remedy: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub analysis: Option<String>,
    }

    #[derive(Debug, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct TrendRequestDto {
        #[schema(value_type = Option<Vec<TrendPoint>>)]
        pub historical_data: Option<Vec<Value>>,
    }

    #[derive(Debug, Serialize, ToSchema)]
    pub struct TrendAnalysisDto {
        pub success: bool,
        pub analysis: String,
        pub timestamp: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, ToSchema)]
    pub struct RemedyResponseDto {
        #[serde(flatten)]
        pub result: RemedyResult,
        pub monitor: MonitorSummary,
    }

    #[derive(Debug, Serialize, ToSchema)]
    pub struct AiHealthDto {
        pub status: String,
        pub service: String,
        pub timestamp: DateTime<Utc>,
        pub configured: bool,
    }
}
