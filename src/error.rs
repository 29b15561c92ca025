use crate::store::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body shared by every acknowledgement and error of the demo routes.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub success: bool,
    pub message: String,
}

impl MessageBody {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Store(_) => StatusCode::NOT_FOUND,
        };
        let body = MessageBody {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
