use axum::{extract::State, routing::post, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::extract::Json;
use crate::middleware::auth::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct TokenRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    token: String,
    token_type: &'static str,
    expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/token", post(issue_token))
}

/// Exchange demo credentials from config for a bearer token.
async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .auth
        .users
        .iter()
        .find(|u| u.username == req.username && u.password == req.password)
        .ok_or_else(|| ApiError::AuthenticationError("invalid credentials".to_string()))?;

    let claims = Claims {
        sub: user.username.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| {
        ApiError::Core(aero_core::CoreError::Internal(format!(
            "token encoding failed: {e}"
        )))
    })?;

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.auth.expiration,
    }))
}
