//! API route modules.
//!
//! Organizes routes by resource type.

pub mod analyze;
pub mod download;
pub mod file;
pub mod health;
pub mod status;

use axum::{Json, Router, routing::get};

use crate::api::error::ApiError;
use crate::api::models::ServiceInfo;
use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api/analyze", analyze::router())
        .nest("/api/download", download::router())
        .nest("/api/status", status::router())
        .nest("/api/file", file::router())
        .nest("/health", health::router())
        .with_state(state)
}

/// Service banner.
async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}

/// Validate and normalize a client-supplied media URL.
///
/// Rejected inputs never reach the job store.
pub(crate) fn validate_url(raw: &str) -> Result<url::Url, ApiError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ApiError::validation(format!("invalid url: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::validation(format!(
            "unsupported url scheme: {}",
            parsed.scheme()
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.com/watch?v=abc").is_ok());
        assert!(validate_url("http://example.com/v").is_ok());
        assert!(validate_url("  https://example.com/v  ").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_bad_input() {
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("ftp://example.com/v").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("").is_err());
    }
}
