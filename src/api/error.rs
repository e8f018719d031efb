//! Unified API error handling
//!
//! This module provides a consistent error response format across all API endpoints.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbError;
use crate::service::SurveyError;

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
    /// Structured context, e.g. the offending field of a validation error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Unified API error type
///
/// All API endpoints should return `Result<T, ApiError>` for consistent error handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Malformed request or out-of-range input (400)
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists (409)
    #[error("{0}")]
    Conflict(String),

    /// Request is well-formed but breaks a business rule (422)
    #[error("{message}")]
    BusinessLogic {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "resource_not_found",
            ApiError::Conflict(_) => "duplicate_resource",
            ApiError::BusinessLogic { .. } => "business_logic_error",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Validation { details, .. } | ApiError::BusinessLogic { details, .. } => {
                details.clone()
            }
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BusinessLogic { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();

        if status.is_server_error() {
            tracing::error!(
                error_type = error_type,
                status = status.as_u16(),
                message = %self,
                "API error"
            );
        } else {
            tracing::warn!(
                error_type = error_type,
                status = status.as_u16(),
                message = %self,
                "Request rejected"
            );
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id: Uuid::new_v4().to_string(),
            details: self.details(),
        })
    }
}

// ============================================================================
// From conversions for service errors
// ============================================================================

impl From<SurveyError> for ApiError {
    fn from(err: SurveyError) -> Self {
        match err {
            SurveyError::Validation(e) => ApiError::Validation {
                message: e.to_string(),
                details: Some(serde_json::json!({
                    "field": e.field.form_name(),
                    "code": e.field.code(),
                    "value": e.value,
                    "allowed": e.allowed.values(),
                })),
            },
            SurveyError::DuplicateResource(msg) => ApiError::Conflict(msg),
            SurveyError::ResourceNotFound(msg) => ApiError::NotFound(msg),
            SurveyError::BusinessLogic(message) => ApiError::BusinessLogic {
                message,
                details: None,
            },
            ref invalid @ SurveyError::InvalidThreats {
                asset_id,
                ref threat_ids,
            } => ApiError::BusinessLogic {
                message: invalid.to_string(),
                details: Some(serde_json::json!({
                    "assetId": asset_id,
                    "invalidThreatIds": threat_ids,
                })),
            },
            SurveyError::Unauthorized(msg) => ApiError::Forbidden(msg),
            SurveyError::Store(e) => e.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => ApiError::NotFound(id),
            DbError::UniqueViolation(what) => ApiError::Conflict(what),
            _ => ApiError::Database(err.to_string()),
        }
    }
}
