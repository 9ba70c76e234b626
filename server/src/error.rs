use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::derive::Display;
use serde_json::json;

use crate::{analysis::AnalysisError, auth::AuthError, email::client::GatewayError};

pub type AppResult<T> = Result<T, AppError>;
pub type AppJsonResult<T> = AppResult<Json<T>>;

#[derive(Debug, Display)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    UnprocessableEntity(String),
    Internal(anyhow::Error),
    RequestTimeout,
    TooManyRequests,
    BadGateway(String),
    DbError(sea_orm::error::DbErr),
    Oauth2(AuthError),
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<sea_orm::error::DbErr> for AppError {
    fn from(error: sea_orm::error::DbErr) -> Self {
        AppError::DbError(error)
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        AppError::Oauth2(error)
    }
}

impl From<GatewayError> for AppError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound(id) => AppError::NotFound(format!("Email {} not found", id)),
            GatewayError::Transport {
                status: Some(401), ..
            } => AppError::Unauthorized("Mailbox access was rejected".to_string()),
            GatewayError::Transport { message, .. } => AppError::BadGateway(message),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::Mailbox(e) => e.into(),
            AnalysisError::Extraction(e) => AppError::UnprocessableEntity(e.to_string()),
            AnalysisError::EmptyContent => AppError::BadRequest("Email content is empty".to_string()),
            AnalysisError::Provider(e) => match e.status {
                Some(429) => AppError::TooManyRequests,
                Some(408) => AppError::RequestTimeout,
                _ => AppError::BadGateway(format!("AI provider failed: {}", e.message)),
            },
        }
    }
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(json!({"error": {
            "code": status.as_u16(),
            "message": message.into()
        }})),
    )
}

// This centralizes all different errors from our app in one place
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self {
            AppError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => error_body(StatusCode::UNAUTHORIZED, msg),
            AppError::UnprocessableEntity(msg) => error_body(StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::RequestTimeout => {
                error_body(StatusCode::REQUEST_TIMEOUT, "Request took too long")
            }
            AppError::TooManyRequests => error_body(StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            AppError::BadGateway(msg) => error_body(StatusCode::BAD_GATEWAY, msg),
            AppError::DbError(err) => {
                tracing::error!("Database error: {:?}", err);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            AppError::Oauth2(err) => {
                tracing::error!("OAuth2 error: {:?}", err);
                error_body(StatusCode::BAD_REQUEST, "Could not authenticate with OAuth2")
            }
        };
        tracing::error!("Error: {:?}", err.1);

        err.into_response()
    }
}
