use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;
use chorewheel_shared::jwt::{self, JwtClaims};
use chrono::{Duration, Utc};
use tracing::error;

use super::{AppError, AppState};
use crate::storage::models::User;

/// How many days before mandatory re-login.
const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthCtx {
    pub claims: JwtClaims,
}

pub async fn require_bearer(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || Err(AppError::unauthorized());
    let header_val = match req.headers().get(header::AUTHORIZATION) {
        Some(v) => v,
        None => return unauthorized(),
    };
    let header_str = header_val.to_str().map_err(|_| AppError::unauthorized())?;
    let prefix = "Bearer ";
    if !header_str.starts_with(prefix) {
        return unauthorized();
    }
    let token = &header_str[prefix.len()..];

    let claims = match jwt::decode_and_verify(token, state.config.jwt_secret.as_bytes()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error=%e, "auth: jwt decode failed");
            return unauthorized();
        }
    };

    req.extensions_mut().insert(AuthCtx { claims });
    Ok(next.run(req).await)
}

/// Issues a bearer token for a user row loaded from the store. The claims
/// carry the full identity context `(family_id, user_id, role)`; handlers
/// trust it and never re-derive identity.
pub fn issue_jwt_for_user(state: &AppState, user: &User) -> Result<String, AppError> {
    let role = user.role.parse().map_err(|e| {
        error!(username=%user.username, error=%e, "login: user row has invalid role");
        AppError::internal(e)
    })?;
    let claims = JwtClaims {
        sub: user.username.clone(),
        jti: uuid::Uuid::new_v4().to_string(),
        exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        role,
        family_id: user.family_id,
        user_id: user.id,
    };
    jwt::encode(&claims, state.config.jwt_secret.as_bytes()).map_err(|e| {
        error!(username=%user.username, error=%e, "login: jwt encode failed");
        AppError::internal(e)
    })
}
