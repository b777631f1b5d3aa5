use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Every failure a request handler can end with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The media host gave no result for a required upload.
    #[error("{0}")]
    UploadFailed(String),
    /// The record was written but could not be read back.
    #[error("{0}")]
    CreationFailed(String),
    #[error("something went wrong while generating tokens")]
    TokenGeneration(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::CreationFailed(_)
            | ApiError::TokenGeneration(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::TokenGeneration(e) => error!(error = %e, "token generation failed"),
            ApiError::Internal(e) => error!(error = ?e, "internal error"),
            other if status.is_server_error() => error!(error = %other, %status, "request failed"),
            other => warn!(error = %other, %status, "request rejected"),
        }

        let body = json!({
            "statusCode": status.as_u16(),
            "data": null,
            "message": self.public_message(),
            "success": false,
            "errors": [],
        });
        (status, Json(body)).into_response()
    }
}
