use crate::error::ApiError;
use crate::farm::FarmObserver;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

mod ai_routes;
mod auth_routes;
mod coerce;
mod doc_routes;
mod esp32_routes;
mod health_routes;
mod query;
mod sensor_routes;


const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    observer: &FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization", "x-api-key", "x-gemini-key"])
        .allow_methods(vec!["GET", "POST", "PUT", "OPTIONS"]);

    health_routes::routes(observer)
        .or(esp32_routes::routes(observer))
        .or(sensor_routes::routes(observer))
        .or(ai_routes::routes(observer))
        .or(auth_routes::routes(observer))
        .or(doc_routes::routes())
        .with(cors)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

pub async fn dispatch_server(
    observer: FarmObserver,
    addr: SocketAddr,
) -> Result<(), warp::Error> {
    let (bound, server) = warp::serve(routes(&observer)).try_bind_with_graceful_shutdown(
        addr,
        async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        },
    )?;
    info!("Starting webserver at: {}", bound);
    server.await;
    Ok(())
}

pub(crate) fn reply_with<T: Serialize>(status: StatusCode, body: &T) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

pub(crate) fn error_response(err: &ApiError) -> Response {
    if err.is_internal() {
        error!("{}", err);
    } else {
        warn!("{}", err);
    }
    reply_with(
        err.status(),
        &ErrorResponseDto {
            error: err.to_string(),
        },
    )
}

/// Raw request body, capped before anything is buffered
pub(crate) fn json_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes())
}

/// Parses a raw JSON body. An empty body reads as `{}`.
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body)
        .map_err(|err| ApiError::Validation(format!("Invalid request body: {}", err)))
}

pub(crate) fn build_response<T: Serialize>(resp: Result<T, ApiError>) -> Result<Response, Rejection> {
    match resp {
        Ok(data) => Ok(warp::reply::json(&data).into_response()),
        Err(err) => Ok(error_response(&err)),
    }
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_owned())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_owned())
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_owned())
    } else if let Some(e) = err.find::<warp::filters::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_owned())
    };
    Ok(reply_with(status, &ErrorResponseDto { error: message }))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponseDto {
    pub error: String,
}
