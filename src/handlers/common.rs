use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ApiResponse;

/// 200 with the success envelope.
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::new(data))).into_response()
}

/// 201 with the success envelope.
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::new(data))).into_response()
}

/// 200 with a bare message payload, for operations with nothing to return.
pub fn message_response(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::new(serde_json::json!({ "message": message }))),
    )
        .into_response()
}
