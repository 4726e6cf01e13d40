use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::{debug, info};

use crate::auth::{RequireUser, viewcode_for};
use crate::policy::{Action, Actor, share};
use crate::server::AppState;
use crate::server::dto::ShareRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{ShareSettings, ShareType};

use super::access::require_doc;

pub async fn get_doc_share(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    require_doc(store, &actor, &headers, id, Action::Update)?;

    let share = store.get_doc_share(id).api_err("Failed to get share")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(share)))
}

pub async fn set_doc_share(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ShareRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    require_doc(store, &actor, &headers, id, Action::Update)?;

    let share_value = req.share_value.filter(|v| !v.is_empty());
    if req.share_type == ShareType::Code && share_value.is_none() {
        return Err(ApiError::bad_request(
            "share_value is required for code-protected shares",
        ));
    }

    let share = store.upsert_doc_share(
        id,
        &ShareSettings {
            share_type: req.share_type,
            share_value,
            is_enable: req.is_enable,
        },
    )?;

    info!(doc_id = id, enabled = share.is_enable, "doc share saved");

    Ok::<_, ApiError>(Json(ApiResponse::success(share)))
}

/// Opens a shared doc by its token. Anything that does not open reads as
/// missing.
pub async fn open_share(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let share = store
        .get_doc_share_by_token(&token)
        .api_err("Failed to get share")?
        .or_not_found("Share not found")?;
    let doc = store
        .get_doc(share.doc_id)
        .api_err("Failed to get doc")?
        .or_not_found("Share not found")?;

    let viewcode = viewcode_for(&headers, doc.top_doc);
    if !share::can_open(&share, &doc, viewcode.as_deref()) {
        debug!(doc_id = doc.id, "share did not open");
        return Err(ApiError::not_found("Share not found"));
    }

    Ok::<_, ApiError>(Json(ApiResponse::success(doc)))
}
