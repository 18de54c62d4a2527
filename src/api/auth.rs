//! Signup and signin handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::{hash_password, is_valid_email, is_valid_password, issue_token, verify_password};
use crate::error::ApiError;
use crate::store::users;

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    status: u16,
    success: bool,
    token: String,
}

fn validate_credentials(body: &Credentials) -> Result<(), ApiError> {
    if !is_valid_email(&body.email) {
        return Err(ApiError::BadRequest("invalid email".to_string()));
    }
    if !is_valid_password(&body.password) {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            crate::auth::MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// POST /api/v1/signup - register a new user and hand back a token
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(&body)?;

    let conn = state.db.connection();

    if users::find_by_email(&conn, &body.email)?.is_some() {
        return Err(ApiError::Conflict(
            "user already registered, please login".to_string(),
        ));
    }

    let hash = hash_password(&body.password, state.bcrypt_cost)?;
    let user = users::create(&conn, &body.email, &hash)?;

    let token = issue_token(&user.id, &state.jwt_secret, state.token_ttl_secs)?;
    users::set_token(&conn, &user.id, &token)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            status: 200,
            success: true,
            token,
        }),
    ))
}

/// POST /api/v1/signin - verify credentials and re-issue a token
pub async fn signin(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.connection();

    let user = users::find_by_email(&conn, &body.email)?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::BadRequest("wrong password".to_string()));
    }

    let token = issue_token(&user.id, &state.jwt_secret, state.token_ttl_secs)?;
    users::set_token(&conn, &user.id, &token)?;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            status: 200,
            success: true,
            token,
        }),
    ))
}
