// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware and the per-request authorization context.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Role carried by trusted internal callers (other platform services).
pub const INTERNAL_ROLE: &str = "microservice";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (platform user id)
    pub sub: String,
    /// Caller roles; the first role decides trust
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authorization context extracted from the verified JWT.
///
/// Owned by the request and dropped with it; handlers never hold one across
/// requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl AuthContext {
    /// Whether the caller is a trusted internal service.
    pub fn is_internal(&self) -> bool {
        self.roles.first().map(String::as_str) == Some(INTERNAL_ROLE)
    }

    /// Resolve the user id an operation acts on.
    ///
    /// Internal callers act on behalf of whichever user id they supply (and
    /// must supply one); ordinary callers always act as themselves, whatever
    /// they requested.
    pub fn effective_user_id(&self, requested: Option<&str>) -> Result<String, AppError> {
        if self.is_internal() {
            requested
                .map(str::to_string)
                .ok_or(AppError::MissingUserId)
        } else {
            Ok(self.user_id.clone())
        }
    }
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get("tracker_token") {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data =
        decode::<Claims>(&token, &key, &validation).map_err(|_| StatusCode::UNAUTHORIZED)?;

    let ctx = AuthContext {
        user_id: token_data.claims.sub,
        roles: token_data.claims.roles,
    };
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

/// Create a JWT for a caller. Used by tests and internal tooling; user
/// tokens are normally issued by the platform's auth service.
pub fn create_jwt(user_id: &str, roles: &[String], signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        roles: roles.to_vec(),
        iat: now,
        exp: now + 30 * 24 * 60 * 60, // 30 days
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
