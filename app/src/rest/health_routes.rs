use super::build_response;
use crate::farm::FarmObserver;
use chrono::Utc;
use warp::Filter;

pub fn routes(
    observer: &FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(observer.clone())
}

/// GET /health
///
/// Liveness probe, reports the datastore state
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = dto::HealthDto))
)]
fn health(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("health"))
        .and(warp::get())
        .and_then(|observer: FarmObserver| async move {
            let database = observer.database_state().await;
            build_response(Ok(dto::HealthDto {
                status: "OK".to_owned(),
                timestamp: Utc::now(),
                database,
            }))
        })
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use chrono::{DateTime, Utc};
    use serde::Serialize;
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, ToSchema)]
    pub struct HealthDto {
        pub status: String,
        pub timestamp: DateTime<Utc>,
        pub database: String,
    }
}
