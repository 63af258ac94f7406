//! HTTP mapping for engine errors
//!
//! Every error becomes a status plus a one-field JSON body. Internal
//! detail is logged here and never serialized.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use corpus_core::Error;
use serde_json::json;
use tracing::error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Lock(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(detail = %self.0, "request failed");
        }
        let body = Json(json!({ "error": self.0.code() }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
