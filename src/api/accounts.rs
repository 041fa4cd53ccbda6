use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_account_id;
use super::{ApiError, ApiResponse, AppState};
use crate::entities::accounts::Role;
use crate::services::{Account, Candidate, NewSubAccount};

#[derive(Deserialize)]
pub struct CreateSubAccountRequest {
    pub role: Role,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateCandidateRequest {
    pub full_name: String,
    pub email: String,
}

/// POST /accounts
/// Create a recruiter or partner under the logged-in admin's tenant.
pub async fn create_sub_account(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateSubAccountRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let creator_id = session_account_id(&session).await?;

    let account = state
        .accounts
        .create_sub_account(
            creator_id,
            NewSubAccount {
                role: payload.role,
                email: payload.email,
                username: payload.username,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(account)))
}

/// POST /accounts/{id}/approve
/// Admin-driven approval, as distinct from token redemption.
pub async fn approve_account(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(account_id): Path<i32>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let approver_id = session_account_id(&session).await?;

    let approver = state.accounts.get_account(approver_id).await?;
    if !matches!(approver.role, Role::Admin) {
        return Err(ApiError::Forbidden(
            "Only admins may approve accounts".to_string(),
        ));
    }

    state.accounts.approve(account_id, approver_id).await?;
    let account = state.accounts.get_account(account_id).await?;

    Ok(Json(ApiResponse::success(account)))
}

/// POST /candidates
/// The created candidate is attributed to the actor's tenant root.
pub async fn create_candidate(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateCandidateRequest>,
) -> Result<Json<ApiResponse<Candidate>>, ApiError> {
    let actor_id = session_account_id(&session).await?;

    if payload.full_name.trim().is_empty() {
        return Err(ApiError::validation("Candidate name is required"));
    }

    let candidate = state
        .accounts
        .add_candidate(actor_id, &payload.full_name, &payload.email)
        .await?;

    Ok(Json(ApiResponse::success(candidate)))
}

/// GET /candidates
/// Lists only the actor's tenant's candidates.
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<Candidate>>>, ApiError> {
    let actor_id = session_account_id(&session).await?;
    let candidates = state.accounts.list_candidates(actor_id).await?;
    Ok(Json(ApiResponse::success(candidates)))
}
