use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::{OptionalActor, RequireUser};
use crate::policy::{Action, Actor};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::store::tree::{
    TocNode, build_from_rows, decode_toc, plan_placements, unwrap_tree_body,
};

use super::access::require_project;

/// Returns the cached tree, falling back to live rows when no usable
/// cache exists.
pub async fn get_tree(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_project(store, &actor, &headers, id, Action::View)?;

    let cached = store
        .get_project_toc(id)
        .api_err("Failed to load tree")?
        .and_then(|raw| {
            let decoded = decode_toc(&raw);
            if decoded.is_none() {
                warn!(project_id = id, "cached tree is not decodable, rebuilding");
            }
            decoded
        });

    let tree: Vec<TocNode> = match cached {
        Some(tree) => tree,
        None => build_from_rows(store.list_tree_rows(id).api_err("Failed to load docs")?),
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(tree)))
}

/// Accepts either a bare list or `{"tree": [...]}` and stores the list.
pub async fn put_tree(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    require_project(store, &actor, &headers, id, Action::Update)?;

    let payload = unwrap_tree_body(body);
    let placements = plan_placements(&payload, state.config.max_tree_depth)?;
    store.apply_tree(id, &placements, &payload.to_string())?;

    info!(
        project_id = id,
        nodes = placements.len(),
        user = %auth.user.username,
        "tree applied"
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(payload)))
}
