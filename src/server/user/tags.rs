use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};

use crate::auth::{OptionalActor, RequireUser};
use crate::server::AppState;
use crate::server::dto::SearchParams;
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate, parse_cursor,
};
use crate::types::DocStatus;

use super::access::visible_project_ids;

pub async fn list_tags(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let cursor = parse_cursor(params.cursor.as_deref())?;
    let tags = state
        .store
        .list_tags(params.q.as_deref(), cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list tags")?;

    let (tags, next_cursor, has_more) =
        paginate(tags, DEFAULT_PAGE_SIZE as usize, |t| t.id.to_string());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(tags, next_cursor, has_more)))
}

/// Docs carrying the tag, limited to what the actor can read.
pub async fn list_tag_docs(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    store
        .get_tag(id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    let ids: Vec<i64> = visible_project_ids(store, &actor, &headers)?
        .into_iter()
        .collect();
    let docs: Vec<_> = store
        .list_tag_docs(id, &ids)
        .api_err("Failed to list tag docs")?
        .into_iter()
        .filter(|d| {
            d.status != DocStatus::Draft || actor.is_superuser() || actor.is(d.create_user)
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(docs)))
}
