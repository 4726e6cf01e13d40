use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::info;

use crate::auth::{OptionalActor, RequireUser};
use crate::policy::{Action, Actor};
use crate::server::AppState;
use crate::server::dto::CollaboratorRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};

use super::access::require_project;

pub async fn list_collaborators(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_project(store, &actor, &headers, id, Action::View)?;

    let collaborators = store
        .list_collaborators(id)
        .api_err("Failed to list collaborators")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(collaborators)))
}

pub async fn set_collaborator(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(i64, i64)>,
    Json(req): Json<CollaboratorRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    let access = require_project(store, &actor, &headers, id, Action::Manage)?;

    let user = store
        .get_user(user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;
    if user.id == access.project.create_user {
        return Err(ApiError::bad_request(
            "The project creator cannot be a collaborator",
        ));
    }

    store
        .upsert_collaborator(id, user.id, req.role)
        .api_err("Failed to save collaborator")?;

    info!(project_id = id, collaborator = %user.username, role = ?req.role, "collaborator set");

    let collaborators = store
        .list_collaborators(id)
        .api_err("Failed to list collaborators")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(collaborators)))
}

pub async fn remove_collaborator(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    require_project(store, &actor, &headers, id, Action::Manage)?;

    if !store
        .remove_collaborator(id, user_id)
        .api_err("Failed to remove collaborator")?
    {
        return Err(ApiError::not_found("Collaborator not found"));
    }

    info!(project_id = id, user_id, "collaborator removed");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
