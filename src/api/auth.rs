use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::services::{Account, IssuedToken, NewRootAccount, TokenPurpose};

pub const SESSION_ACCOUNT_KEY: &str = "account_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    pub company_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// The issued approval token rides along in the response as the stand-in for
/// the external mailer; nothing in the serving process logs it.
#[derive(Serialize)]
pub struct SignupResponse {
    pub account: Account,
    pub approval: IssuedToken,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Email (case-insensitive) or username.
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Mailer stand-in; absent when no matching account exists, but the HTTP
    /// status never varies (anti-enumeration).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<IssuedToken>,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Session helpers
// ============================================================================

pub async fn session_account_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not logged in".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/signup
/// Create an unapproved tenant-root account and issue its approval token.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<ApiResponse<SignupResponse>>, ApiError> {
    let account = state
        .accounts
        .create_root_account(NewRootAccount {
            company_name: payload.company_name,
            email: payload.email,
            username: payload.username,
            password: payload.password,
        })
        .await?;

    let ttl = Duration::minutes(state.config.tokens.approval_ttl_minutes);
    let approval = state
        .tokens
        .issue(account.id, TokenPurpose::Approval, ttl)
        .await?;

    Ok(Json(ApiResponse::success(SignupResponse {
        account,
        approval,
    })))
}

/// POST /auth/login
/// Authenticate with email-or-username and password; creates a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    if payload.identifier.is_empty() {
        return Err(ApiError::validation("Identifier is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let account = state
        .accounts
        .authenticate(&payload.identifier, &payload.password)
        .await?;

    session
        .insert(SESSION_ACCOUNT_KEY, account.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(account)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
pub async fn get_current_account(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let account_id = session_account_id(&session).await?;
    let account = state.accounts.get_account(account_id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// POST /auth/forgot-password
/// Always returns 200 with the same message whether or not the email matches
/// an account.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<ForgotPasswordResponse>>, ApiError> {
    let message = "If that email is registered, a reset link has been sent".to_string();

    let account = state
        .store
        .accounts()
        .find_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let reset = match account {
        Some(account) => {
            let ttl = Duration::minutes(state.config.tokens.reset_ttl_minutes);
            Some(
                state
                    .tokens
                    .issue(account.id, TokenPurpose::PasswordReset, ttl)
                    .await?,
            )
        }
        None => None,
    };

    Ok(Json(ApiResponse::success(ForgotPasswordResponse {
        message,
        reset,
    })))
}

/// POST /auth/reset-password
/// Redeems a reset token and installs the new password atomically.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .tokens
        .redeem_password_reset(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}
