//! Errors returned by HTTP handlers.

use crate::analysis::AnalysisError;
use crate::extract::ExtractError;
use crate::github::UrlError;
use crate::roadmap::RoadmapError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Body used for every failure that is not the caller's fault
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Roadmap(#[from] RoadmapError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidUrl(e) => Self::InvalidUrl(e),
            AnalysisError::Extraction(e) => Self::Extraction(e),
            AnalysisError::Upstream(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::InvalidUrl(e) => (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() }))
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::Extraction(e) => {
                tracing::error!("Could not read model output: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                )
            }
            AppError::Roadmap(RoadmapError::WrongItemCount { received }) => {
                tracing::error!("Roadmap has {} items", received);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string(), "received": received }),
                )
            }
            AppError::Roadmap(e) => {
                tracing::error!("Roadmap generation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                )
            }
            AppError::Template(_) | AppError::Internal(_) => {
                tracing::error!("{:#}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": INTERNAL_ERROR_MESSAGE }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
