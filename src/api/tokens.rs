use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct RedeemResponse {
    pub message: String,
}

/// POST /tokens/approve
/// Redeem an account-approval token. Resubmitting a redeemed token returns
/// 410 (already used), never a second approval.
pub async fn redeem_approval(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<ApiResponse<RedeemResponse>>, ApiError> {
    if payload.token.is_empty() {
        return Err(ApiError::validation("Token is required"));
    }

    state.tokens.redeem_approval(&payload.token).await?;

    Ok(Json(ApiResponse::success(RedeemResponse {
        message: "Account approved".to_string(),
    })))
}
