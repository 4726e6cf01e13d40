use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::MeResponse;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn get_me(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tokens = state
        .store
        .list_user_tokens(auth.user.id)
        .api_err("Failed to list tokens")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(MeResponse {
        user: auth.user,
        tokens,
    })))
}
