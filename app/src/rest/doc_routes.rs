use super::{ai_routes, auth_routes, esp32_routes, health_routes, sensor_routes};
use super::ErrorResponseDto;
use crate::ai::RemedyResult;
use crate::farm::FarmAdvice;
use crate::models::{FarmConfig, SensorToggles, UserRecord};
use elacare_core::monitor::{MonitorStatus, MonitorSummary, Priority};
use elacare_core::recommend::{AdviceKind, Recommendation};
use elacare_core::threshold::{Classification, Parameter, Severity, SoilStatus};
use elacare_core::{RemedyReading, SensorHistoryRecord, SensorSnapshot, TrendPoint};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::Config;
use warp::Filter;
use warp::{
    http::Uri,
    hyper::{Response, StatusCode},
    path::{FullPath, Tail},
    Rejection, Reply,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_routes::health,
        esp32_routes::receive_data,
        esp32_routes::farm_config,
        esp32_routes::put_farm_config,
        esp32_routes::latest,
        esp32_routes::alert,
        sensor_routes::current,
        sensor_routes::history,
        sensor_routes::write_test,
        sensor_routes::advice,
        ai_routes::generate_remedy,
        ai_routes::analyze_trend,
        ai_routes::remedy,
        ai_routes::ai_health,
        auth_routes::auth_health,
        auth_routes::verify,
        auth_routes::set_farm_id,
        auth_routes::user,
    ),
    components(schemas(
        ErrorResponseDto,
        SensorSnapshot,
        SensorHistoryRecord,
        RemedyReading,
        TrendPoint,
        Parameter,
        SoilStatus,
        Severity,
        Classification,
        AdviceKind,
        Recommendation,
        MonitorStatus,
        Priority,
        MonitorSummary,
        RemedyResult,
        FarmAdvice,
        FarmConfig,
        SensorToggles,
        UserRecord,
        health_routes::dto::HealthDto,
        esp32_routes::dto::IngestRequestDto,
        esp32_routes::dto::IngestResponseDto,
        esp32_routes::dto::FarmConfigDto,
        esp32_routes::dto::FarmConfigUpdateDto,
        esp32_routes::dto::SensorTogglesUpdateDto,
        esp32_routes::dto::AlertRequestDto,
        esp32_routes::dto::AlertResponseDto,
        sensor_routes::dto::TestReadingDto,
        sensor_routes::dto::TestReadingResponseDto,
        ai_routes::dto::GeneratedRemedyDto,
        ai_routes::dto::AiFailureDto,
        ai_routes::dto::TrendRequestDto,
        ai_routes::dto::TrendAnalysisDto,
        ai_routes::dto::RemedyResponseDto,
        ai_routes::dto::AiHealthDto,
        auth_routes::dto::AuthHealthDto,
        auth_routes::dto::VerifyRequestDto,
        auth_routes::dto::VerifyResponseDto,
        auth_routes::dto::SetFarmIdRequestDto,
        auth_routes::dto::SetFarmIdResponseDto,
    )),
    tags((name = "elacare", description = "Cardamom soil monitoring API"))
)]
pub struct ApiDoc;

pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = ApiDoc::openapi();
    let config = Arc::new(Config::new(["/api/doc/api.json"]));

    warp::path!("api" / "doc" / "api.json")
        .and(warp::get())
        .map(move || warp::reply::json(&api))
        .or(warp::path("api")
            .and(warp::path("doc"))
            .and(warp::get())
            .and(warp::path::full())
            .and(warp::path::tail())
            .and(warp::any().map(move || config.clone()))
            .and_then(serve_swagger))
}

async fn serve_swagger(
    full_path: FullPath,
    tail: Tail,
    config: Arc<Config<'static>>,
) -> Result<Box<dyn Reply + 'static>, Rejection> {
    if full_path.as_str() == "/api/doc" {
        return Ok(Box::new(warp::redirect::found(Uri::from_static(
            "/api/doc/",
        ))));
    }

    match utoipa_swagger_ui::serve(tail.as_str(), config) {
        Ok(Some(file)) => Ok(Box::new(
            Response::builder()
                .header("Content-Type", file.content_type)
                .body(file.bytes),
        )),
        Ok(None) => Ok(Box::new(StatusCode::NOT_FOUND)),
        Err(error) => Ok(Box::new(
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(error.to_string()),
        )),
    }
}
