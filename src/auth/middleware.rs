//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role checks

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, Role},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Auth middleware that validates bearer tokens.
///
/// Runs before any handler logic on protected routes. On success the
/// verified claims are inserted into request extensions; handlers read
/// identity only from there and never re-derive it.
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthError::MissingToken)?;

    // An invalid token is treated exactly like no token at all
    let claims = jwt_handler
        .validate_token(&token)
        .map_err(|_| AuthError::InvalidToken)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Role layer for write routes: requires the "Manager" claim.
///
/// Must run after [`auth_middleware`]; a valid identity without the role
/// gets 403, distinct from the 401 of a missing or bad token.
pub async fn require_manager(req: Request, next: Next) -> Result<Response, AuthError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(AuthError::MissingToken)?;

    if !claims.has_role(Role::Manager) {
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
