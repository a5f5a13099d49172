// JSON error responses.
// Maps run failures to HTTP statuses with an `{"error": message}` body.

use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};
use serde_json::json;
use tracing::{info, warn};

use crate::error::FellowError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn status_for(error: &FellowError) -> StatusCode {
        match error {
            FellowError::MissingToken => StatusCode::BAD_REQUEST,
            FellowError::Unauthorized => StatusCode::UNAUTHORIZED,
            e if e.is_budget() => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<FellowError> for ApiError {
    fn from(error: FellowError) -> Self {
        let status = Self::status_for(&error);
        if status.is_server_error() {
            warn!(error = %error, "request failed");
        } else {
            info!(error = %error, %status, "request rejected");
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        Json(json!({ "error": self.message }))
            .with_status(self.status)
            .into_response()
    }
}
