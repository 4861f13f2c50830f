//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Responses always carry
//! `{"error": {"code": "...", "message": "..."}}` with a Korean message; 5xx
//! details are captured to Sentry and never sent to the client.

use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::geocoding::GeocodingError;
use crate::services::supabase::SupabaseError;
use crate::services::uploads::UploadError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Hosted auth/storage call failed.
    #[error("Platform error: {0}")]
    Supabase(#[from] SupabaseError),

    /// Geocoding provider call failed.
    #[error("Geocoding error: {0}")]
    Geocoding(#[from] GeocodingError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No valid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Signed in, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate resource.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload too large.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Review creation cooldown.
    #[error("Review cooldown: retry after {retry_after_minutes} minutes")]
    Cooldown { retry_after_minutes: i64 },

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Optional integration is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Supabase(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Geocoding(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Supabase(_) | Self::Geocoding(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Cooldown { .. } | Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => "not_found",
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => "conflict",
            Self::Database(_) => "database_error",
            Self::Supabase(_) | Self::Geocoding(_) => "upstream_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Cooldown { .. } => "review_cooldown",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// User-facing message. Server-side details are never included.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => {
                "요청한 항목을 찾을 수 없습니다.".to_string()
            }
            Self::Database(RepositoryError::Conflict(_)) => "이미 존재하는 항목입니다.".to_string(),
            Self::Database(_) | Self::Internal(_) => {
                "서버 오류가 발생했습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            Self::Supabase(_) | Self::Geocoding(_)
                if self.status() == StatusCode::GATEWAY_TIMEOUT =>
            {
                "외부 서비스 응답이 지연되고 있습니다.".to_string()
            }
            Self::Supabase(_) | Self::Geocoding(_) => {
                "외부 서비스 오류가 발생했습니다.".to_string()
            }
            Self::Unauthorized => "로그인이 필요합니다.".to_string(),
            Self::Cooldown {
                retry_after_minutes,
            } => format!(
                "리뷰는 10분에 한 번만 작성할 수 있습니다. {retry_after_minutes}분 후에 다시 시도해주세요."
            ),
            Self::RateLimited => "요청이 너무 많습니다. 잠시 후 다시 시도해주세요.".to_string(),
            Self::NotFound(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::PayloadTooLarge(msg)
            | Self::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && !matches!(self, Self::ServiceUnavailable(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let mut error = json!({
            "code": self.code(),
            "message": self.message(),
        });
        if let Self::Cooldown {
            retry_after_minutes,
        } = self
        {
            error["retryAfterMinutes"] = json!(retry_after_minutes);
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();

        if let Self::Cooldown {
            retry_after_minutes,
        } = self
            && let Ok(value) = HeaderValue::from_str(&(retry_after_minutes * 60).to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }

        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("요청 본문이 올바르지 않습니다: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("쿼리 파라미터가 올바르지 않습니다: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("경로 파라미터가 올바르지 않습니다: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge("업로드 용량이 너무 큽니다.".to_string())
        } else {
            Self::BadRequest(format!("업로드 요청이 올바르지 않습니다: {}", err.body_text()))
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge => {
                Self::PayloadTooLarge("이미지는 5MB 이하만 업로드할 수 있습니다.".to_string())
            }
            UploadError::UnsupportedType(_) => {
                Self::BadRequest("이미지 파일만 업로드할 수 있습니다.".to_string())
            }
            UploadError::Empty => Self::BadRequest("빈 파일은 업로드할 수 없습니다.".to_string()),
            UploadError::TooMany { max } => {
                Self::BadRequest(format!("이미지는 한 번에 {max}장까지 업로드할 수 있습니다."))
            }
            UploadError::Missing => Self::BadRequest("업로드할 이미지를 선택해주세요.".to_string()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
