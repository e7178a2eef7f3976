//! Authentication API Endpoints
//! Mission: Registration with email-confirmation gating, credential login

use crate::auth::{
    jwt::JwtHandler,
    models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Role},
    user_store::{ConfirmOutcome, UserStore},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(user_store: Arc<UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }
}

/// Password policy: minimum length 8 with uppercase, lowercase, digit,
/// and a symbol. Returns every violated rule, not just the first.
pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain an uppercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain a lowercase letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain a digit.".to_string());
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        errors.push("Password must contain a non-alphanumeric character.".to_string());
    }

    errors
}

fn validate_email(email: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if email.trim().is_empty() {
        errors.push("Email is required.".to_string());
    } else if !email.contains('@') {
        errors.push("Email is not a valid address.".to_string());
    }
    errors
}

/// Registration endpoint - POST /api/auth/register
///
/// On success the confirmation link is returned directly in the body;
/// an email collaborator would deliver it out-of-band in production.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthApiError> {
    let mut errors = validate_email(&payload.email);
    errors.extend(validate_password(&payload.password));
    if !errors.is_empty() {
        return Err(AuthApiError::Validation(errors));
    }

    // Duplicate registration surfaces as a validation error; no second
    // user record is created.
    if state
        .user_store
        .find_by_email(&payload.email)
        .map_err(|_| AuthApiError::InternalError)?
        .is_some()
    {
        return Err(AuthApiError::Validation(vec![
            "Email is already registered.".to_string(),
        ]));
    }

    let user = state
        .user_store
        .create_user(&payload.email, &payload.password)
        .map_err(|e| {
            warn!("Failed to create user {}: {}", payload.email, e);
            AuthApiError::Validation(vec!["Email is already registered.".to_string()])
        })?;

    state
        .user_store
        .add_role(&user.id, Role::User)
        .map_err(|_| AuthApiError::InternalError)?;

    let token = state
        .user_store
        .issue_confirmation_token(&user.id)
        .map_err(|_| AuthApiError::InternalError)?;

    let confirmation_link = format!(
        "/api/auth/confirmemail?userId={}&token={}",
        user.id, token
    );

    info!("✅ Registered user {} (pending confirmation)", user.email);

    Ok(Json(RegisterResponse {
        message: "User registered successfully. Please confirm your email before logging in."
            .to_string(),
        confirmation_link,
    }))
}

/// Query parameters for GET /api/auth/confirmemail
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEmailQuery {
    pub user_id: String,
    pub token: String,
}

/// Email confirmation endpoint - GET /api/auth/confirmemail
pub async fn confirm_email(
    State(state): State<AuthState>,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    let user_id = Uuid::parse_str(&query.user_id).map_err(|_| AuthApiError::InvalidRequest)?;

    let outcome = state
        .user_store
        .confirm_email(&user_id, &query.token)
        .map_err(|_| AuthApiError::InternalError)?;

    match outcome {
        ConfirmOutcome::Confirmed => {
            info!("✅ Email confirmed for user {}", user_id);
            Ok(Json(json!({ "message": "Email confirmed successfully." })))
        }
        ConfirmOutcome::UserNotFound => Err(AuthApiError::UserNotFound),
        ConfirmOutcome::InvalidToken => Err(AuthApiError::ConfirmationFailed),
    }
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    // Unknown email and wrong password take the same path and produce the
    // same rejection, so responses cannot be used for account enumeration.
    let valid = state
        .user_store
        .verify_password(&payload.email, &payload.password)
        .map_err(|_| AuthApiError::InternalError)?;

    if !valid {
        warn!("❌ Failed login attempt: {}", payload.email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let user = state
        .user_store
        .find_by_email(&payload.email)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::InvalidCredentials)?;

    if !user.email_confirmed {
        warn!("❌ Login before email confirmation: {}", payload.email);
        return Err(AuthApiError::EmailNotConfirmed);
    }

    let roles = state
        .user_store
        .get_roles(&user.id)
        .map_err(|_| AuthApiError::InternalError)?;

    let (token, _expires_in) = state
        .jwt_handler
        .generate_token(&user, &roles)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("✅ Login successful: {} ({:?})", user.email, roles);

    Ok(Json(LoginResponse { token }))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    Validation(Vec<String>),
    InvalidCredentials,
    EmailNotConfirmed,
    InvalidRequest,
    ConfirmationFailed,
    UserNotFound,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, json!({ "errors": errors }))
            }
            AuthApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Invalid credentials." }),
            ),
            AuthApiError::EmailNotConfirmed => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Email not confirmed." }),
            ),
            AuthApiError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Invalid email confirmation request." }),
            ),
            AuthApiError::ConfirmationFailed => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Email confirmation failed." }),
            ),
            AuthApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                json!({ "message": "User not found." }),
            ),
            AuthApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy_accepts_strong_password() {
        assert!(validate_password("AdminPass123!").is_empty());
    }

    #[test]
    fn test_password_policy_reports_every_violation() {
        // Too short, no uppercase, no digit, no symbol
        let errors = validate_password("abc");
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_password_policy_single_violations() {
        assert_eq!(validate_password("password1!").len(), 1); // no uppercase
        assert_eq!(validate_password("PASSWORD1!").len(), 1); // no lowercase
        assert_eq!(validate_password("Password!!").len(), 1); // no digit
        assert_eq!(validate_password("Password11").len(), 1); // no symbol
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("samir@example.com").is_empty());
        assert_eq!(validate_email("").len(), 1);
        assert_eq!(validate_email("not-an-email").len(), 1);
    }

    #[test]
    fn test_auth_api_error_statuses() {
        let validation = AuthApiError::Validation(vec!["bad".to_string()]).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let creds = AuthApiError::InvalidCredentials.into_response();
        assert_eq!(creds.status(), StatusCode::UNAUTHORIZED);

        let unconfirmed = AuthApiError::EmailNotConfirmed.into_response();
        assert_eq!(unconfirmed.status(), StatusCode::UNAUTHORIZED);

        let not_found = AuthApiError::UserNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    }
}
