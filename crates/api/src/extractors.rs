//! Request extractors.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::str::FromStr;
use tresor_shared::types::UserId;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller of a mutating endpoint.
///
/// Identity arrives from the fronting gateway as an `x-user-id` header;
/// the engine records it as maker or checker but enforces no
/// permissions of its own.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| rejection("x-user-id header is required"))?;

        UserId::from_str(raw)
            .map(Caller)
            .map_err(|_| rejection("x-user-id header is not a valid UUID"))
    }
}

fn rejection(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": {
                "code": "VALIDATION_ERROR",
                "message": message,
            }
        })),
    )
        .into_response()
}
