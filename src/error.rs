use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::permissions::Action;

/// ErrorResponse
///
/// The JSON body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub message: String,
}

/// ApiError
///
/// Every way a handler can fail. The `IntoResponse` impl below is the single place
/// where failures become HTTP statuses.
///
/// Invalid ids and missing logins answer 404 rather than 400/401; clients of this
/// API depend on those codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid id \"{0}\"")]
    InvalidId(String),

    #[error("Could not find place with id \"{0}\"")]
    PlaceNotFound(String),

    #[error("Could not find comment")]
    CommentNotFound,

    #[error("You must be logged in to leave a rant or a rave")]
    LoginRequired,

    #[error("{0}")]
    Forbidden(Action),

    /// A body that is missing, not JSON, or the wrong shape. Keeps axum's status.
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_)
            | ApiError::PlaceNotFound(_)
            | ApiError::CommentNotFound
            | ApiError::LoginRequired => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Database(e) => {
                // Store details stay in the logs.
                tracing::error!("database error: {:?}", e);
                "Internal server error".to_string()
            }
            ApiError::InvalidBody(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Parses a route segment as a numeric id.
///
/// Surrounding whitespace is ignored and any decimal numeral is accepted. `Ok(None)`
/// means the segment is a number that no stored id can equal: a fraction, or an
/// integer outside the id range. Callers answer those with their not-found error.
pub fn parse_id(raw: &str) -> Result<Option<i32>, ApiError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| ApiError::InvalidId(raw.to_string()))?;

    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    if value.fract() == 0.0 && in_range {
        Ok(Some(value as i32))
    } else {
        Ok(None)
    }
}
