//! REST API: router, shared state, and the per-route handler modules.

pub mod auth;
pub mod lags;
pub mod question_bank;
pub mod subjects;

use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AuthConfig;
use crate::db::Database;
use crate::error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub jwt_secret: Arc<String>,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Build state from an opened database and the auth configuration.
    /// The secret must have survived `Config::validate`.
    pub fn new(db: Arc<Database>, auth: &AuthConfig) -> Self {
        let jwt_secret = auth.jwt_secret.clone().unwrap_or_default();
        debug_assert!(!jwt_secret.is_empty(), "jwt secret must be set");
        Self {
            db,
            jwt_secret: Arc::new(jwt_secret),
            token_ttl_secs: auth.token_ttl_secs,
            bcrypt_cost: auth.bcrypt_cost,
        }
    }
}

/// Resolve `page`/`limit` query values into `(page, limit, skip)`.
/// Saturating math keeps absurd page numbers from overflowing the
/// OFFSET; SQLite just returns an empty page.
pub(crate) fn page_window(
    page: Option<i64>,
    limit: Option<i64>,
    default_limit: i64,
) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).max(1);
    let skip = page.saturating_sub(1).saturating_mul(limit);
    (page, limit, skip)
}

/// Validate the bearer token and return the caller's user id
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = crate::auth::bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    let claims = crate::auth::verify_token(token, &state.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        ApiError::Unauthorized
    })?;
    Ok(claims.user_id)
}

/// Simple `{status, success}` acknowledgement body
#[derive(Serialize)]
pub(crate) struct Ack {
    pub status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            status: 200,
            success: true,
            message: None,
        }
    }

    pub fn created() -> Self {
        Self {
            status: 201,
            success: true,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Serialize)]
struct HealthResponse {
    success: bool,
    data: &'static str,
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        data: "OK",
    })
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route(
            "/subject",
            get(subjects::list)
                .post(subjects::create)
                .delete(subjects::remove),
        )
        .route("/incAndDcs", patch(subjects::inc_and_dcs))
        .route("/questionCount", get(subjects::question_count));

    let v2 = Router::new()
        .route("/questionCount", get(subjects::question_count_v2))
        .route("/incAndDcrEvent", post(subjects::inc_and_dcr_event))
        .route(
            "/lags",
            get(lags::list).post(lags::create).delete(lags::remove),
        )
        .route("/getLags", get(lags::list_all))
        .route(
            "/lagChapter",
            get(lags::chapters)
                .post(lags::create_chapter)
                .patch(lags::rename_chapter)
                .delete(lags::remove_chapter),
        )
        .route(
            "/lagBody",
            get(lags::bodies)
                .post(lags::create_body)
                .patch(lags::update_body)
                .delete(lags::remove_body),
        )
        .route(
            "/questionBank",
            get(question_bank::list_subjects).post(question_bank::create_subject),
        )
        .route(
            "/questionBank/chapter",
            get(question_bank::list_chapters).post(question_bank::create_chapter),
        )
        .route(
            "/questionBank/question",
            get(question_bank::list_questions).post(question_bank::create_question),
        );

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/v1", v1)
        .nest("/api/v2", v2)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None, 20), (1, 20, 0));
        assert_eq!(page_window(Some(3), Some(10), 20), (3, 10, 20));
        assert_eq!(page_window(Some(0), Some(-5), 20), (1, 1, 0));
    }

    #[test]
    fn test_page_window_saturates() {
        let (page, limit, skip) = page_window(Some(i64::MAX), Some(2), 20);
        assert_eq!(page, i64::MAX);
        assert_eq!(limit, 2);
        assert_eq!(skip, i64::MAX);

        let (_, _, skip) = page_window(Some(i64::MAX), Some(i64::MAX), 20);
        assert_eq!(skip, i64::MAX);
    }

    #[test]
    #[should_panic(expected = "jwt secret")]
    fn test_state_rejects_empty_secret() {
        let db = Database::open_in_memory().unwrap();
        AppState::new(Arc::new(db), &AuthConfig::default());
    }
}
