use super::{build_response, json_body, parse_body, reply_with, ErrorResponseDto};
use crate::error::ApiError;
use crate::farm::FarmObserver;
use tracing::debug;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::Filter;

pub fn routes(
    observer: &FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    auth_health()
        .or(verify(observer.clone()))
        .or(set_farm_id(observer.clone()))
        .or(user(observer.clone()))
}

/// GET /api/auth/health
#[utoipa::path(
    get,
    path = "/api/auth/health",
    responses((status = 200, description = "Auth service is running", body = dto::AuthHealthDto))
)]
fn auth_health() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "auth" / "health")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&dto::AuthHealthDto {
                status: "Auth service is running".to_owned(),
            })
        })
        .boxed()
}

/// POST /api/auth/verify
///
/// Checks an identity token and returns who it belongs to
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body = dto::VerifyRequestDto,
    responses(
        (status = 200, description = "Valid token", body = dto::VerifyResponseDto),
        (status = 400, description = "No token given", body = ErrorResponseDto),
        (status = 401, description = "Invalid token", body = dto::VerifyResponseDto)
    )
)]
fn verify(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "auth" / "verify"))
        .and(warp::post())
        .and(json_body())
        .and_then(|observer: FarmObserver, body: Bytes| async move {
            let token = parse_body::<dto::VerifyRequestDto>(&body)
                .ok()
                .and_then(|body| body.token)
                .filter(|token| !token.is_empty());
            let token = match token {
                Some(token) => token,
                None => {
                    return Ok::<_, warp::Rejection>(reply_with(
                        StatusCode::BAD_REQUEST,
                        &ErrorResponseDto {
                            error: "Token is required".to_owned(),
                        },
                    ))
                }
            };

            let resp = match observer.verify_token(&token).await {
                Ok(identity) => reply_with(
                    StatusCode::OK,
                    &dto::VerifyResponseDto {
                        valid: true,
                        uid: Some(identity.uid),
                        email: identity.email,
                        error: None,
                    },
                ),
                Err(err) => {
                    debug!("Token verification failed: {}", err);
                    reply_with(
                        StatusCode::UNAUTHORIZED,
                        &dto::VerifyResponseDto {
                            valid: false,
                            uid: None,
                            email: None,
                            error: Some("Invalid token".to_owned()),
                        },
                    )
                }
            };
            Ok(resp)
        })
        .boxed()
}

/// POST /api/auth/set-farm-id
///
/// Administrative, binds a user to a farm
#[utoipa::path(
    post,
    path = "/api/auth/set-farm-id",
    request_body = dto::SetFarmIdRequestDto,
    params(("x-api-key" = String, Header, description = "Administrative secret")),
    responses(
        (status = 200, description = "Farm assigned", body = dto::SetFarmIdResponseDto),
        (status = 400, description = "Missing fields", body = ErrorResponseDto),
        (status = 401, description = "Wrong key", body = ErrorResponseDto)
    )
)]
fn set_farm_id(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "auth" / "set-farm-id"))
        .and(warp::post())
        .and(warp::header::optional::<String>("x-api-key"))
        .and(json_body())
        .and_then(
            |observer: FarmObserver, key: Option<String>, body: Bytes| async move {
                let resp = async {
                    observer.authorize_device(key.as_deref())?;
                    let body: dto::SetFarmIdRequestDto = parse_body(&body)?;
                    let (uid, farm_id) = match (body.uid, body.farm_id) {
                        (Some(uid), Some(farm_id)) if !uid.is_empty() && !farm_id.is_empty() => {
                            (uid, farm_id)
                        }
                        _ => {
                            return Err(ApiError::Validation(
                                "uid and farmId are required".to_owned(),
                            ))
                        }
                    };
                    let record = observer.set_farm_id(&uid, &farm_id, body.email).await?;
                    Ok::<_, ApiError>(dto::SetFarmIdResponseDto {
                        success: true,
                        message: "Farm ID set successfully".to_owned(),
                        uid: record.uid,
                        farm_id,
                    })
                }
                .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/auth/user/:uid
#[utoipa::path(
    get,
    path = "/api/auth/user/{uid}",
    params(("uid" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User record", body = crate::models::UserRecord),
        (status = 404, description = "Unknown user", body = ErrorResponseDto)
    )
)]
fn user(
    observer: FarmObserver,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "auth" / "user" / String))
        .and(warp::get())
        .and_then(|observer: FarmObserver, uid: String| async move {
            let resp = observer.user(&uid).await;
            build_response(resp)
        })
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Debug, Serialize, ToSchema)]
    pub struct AuthHealthDto {
        pub status: String,
    }

    #[derive(Debug, Default, Deserialize, ToSchema)]
    pub struct VerifyRequestDto {
        pub token: Option<String>,
    }

    #[derive(Debug, Serialize, ToSchema)]
    pub struct VerifyResponseDto {
        pub valid: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub uid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub email: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }

    #[derive(Debug, Default, Deserialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct SetFarmIdRequestDto {
        pub uid: Option<String>,
        pub farm_id: Option<String>,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct SetFarmIdResponseDto {
        pub success: bool,
        pub message: String,
        pub uid: String,
        pub farm_id: String,
    }
}
