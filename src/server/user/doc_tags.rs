use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::info;

use crate::auth::{OptionalActor, RequireUser};
use crate::policy::{Action, Actor};
use crate::server::AppState;
use crate::server::dto::{DocTagsRequest, DocTagsResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::tag_names;

use super::access::require_doc;

pub async fn list_doc_tags(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_doc(store, &actor, &headers, id, Action::View)?;

    let tags = store.list_doc_tags(id).api_err("Failed to list tags")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DocTagsResponse { doc_id: id, tags })))
}

/// Replaces the doc's tags with exactly the submitted names.
pub async fn set_doc_tags(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<DocTagsRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    require_doc(store, &actor, &headers, id, Action::Update)?;

    let names = tag_names(&req.tags)?;
    let tags = store.reconcile_doc_tags(id, &names, auth.user.id)?;

    info!(doc_id = id, count = tags.len(), "doc tags reconciled");

    Ok::<_, ApiError>(Json(ApiResponse::success(DocTagsResponse { doc_id: id, tags })))
}
