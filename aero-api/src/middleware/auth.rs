use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use aero_core::identity::Principal;
use aero_core::{CoreError, CoreResult};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            subject: self.sub.clone(),
            email: self.email.clone(),
            admin: self.role == "admin",
        }
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::AuthenticationError("missing bearer token".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::AuthenticationError("malformed authorization header".to_string())
    })?;

    // 2. Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::AuthenticationError("invalid or expired token".to_string()))?;

    // 3. Inject the caller identity into request extensions
    req.extensions_mut().insert(token_data.claims.principal());

    Ok(next.run(req).await)
}

/// Gate for admin-only write endpoints. Read-side admin checks live in the
/// engine next to the data they protect.
pub fn require_admin(principal: &Principal) -> CoreResult<()> {
    if principal.admin {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied(
            "administrator role required".to_string(),
        ))
    }
}
