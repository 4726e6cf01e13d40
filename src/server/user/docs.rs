use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::info;

use crate::auth::{OptionalActor, RequireUser};
use crate::policy::{Action, Actor};
use crate::server::AppState;
use crate::server::dto::{CreateDocRequest, ListDocsParams, SearchParams, UpdateDocRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreResultExt, paginate,
    parse_cursor,
};
use crate::server::validation::validate_doc_name;
use crate::store::{DocQuery, Store};
use crate::types::{Doc, DocChanges, DocStatus, NewDoc};

use super::access::{require_doc, require_project, visible_project_ids};

fn reject_deleted_status(status: Option<DocStatus>) -> Result<(), ApiError> {
    if status == Some(DocStatus::Deleted) {
        return Err(ApiError::bad_request("Use DELETE to remove a doc"));
    }
    Ok(())
}

fn page_of_docs(
    store: &dyn Store,
    query: &DocQuery,
    cursor: i64,
) -> Result<PaginatedResponse<Doc>, ApiError> {
    let docs = store
        .list_docs(query, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list docs")?;
    let (docs, next_cursor, has_more) =
        paginate(docs, DEFAULT_PAGE_SIZE as usize, |d| d.id.to_string());
    Ok(PaginatedResponse::new(docs, next_cursor, has_more))
}

/// Docs across every project the actor can currently read.
pub async fn list_docs(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListDocsParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let visible = visible_project_ids(store, &actor, &headers)?;
    let project_ids: Vec<i64> = match params.top_doc {
        Some(id) if visible.contains(&id) => vec![id],
        Some(_) => Vec::new(),
        None => visible.into_iter().collect(),
    };

    let query = DocQuery {
        project_ids,
        parent_doc: params.parent_doc,
        name_contains: params.q,
        draft_owner: actor.id(),
        all_drafts: actor.is_superuser(),
        include_deleted: false,
    };

    Ok::<_, ApiError>(Json(page_of_docs(store, &query, cursor)?))
}

pub async fn list_project_docs(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let cursor = parse_cursor(params.cursor.as_deref())?;
    require_project(store, &actor, &headers, id, Action::View)?;

    let query = DocQuery {
        project_ids: vec![id],
        name_contains: params.q,
        draft_owner: actor.id(),
        all_drafts: actor.is_superuser(),
        ..Default::default()
    };

    Ok::<_, ApiError>(Json(page_of_docs(store, &query, cursor)?))
}

pub async fn create_doc(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateDocRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);

    let project_id = req
        .top_doc
        .ok_or_else(|| ApiError::bad_request("top_doc is required"))?;
    validate_doc_name(&req.name)?;
    reject_deleted_status(Some(req.status))?;

    require_project(store, &actor, &headers, project_id, Action::Create)?;

    let doc = store.create_doc(&NewDoc {
        name: req.name.trim().to_string(),
        content: req.content,
        pre_content: req.pre_content,
        parent_doc: req.parent_doc,
        top_doc: project_id,
        sort: req.sort,
        status: req.status,
        editor_mode: req.editor_mode,
        open_children: req.open_children,
        show_children: req.show_children,
        create_user: auth.user.id,
    })?;

    info!(doc_id = doc.id, project_id, user = %auth.user.username, "doc created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(doc))))
}

pub async fn get_doc(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let access = require_doc(state.store.as_ref(), &actor, &headers, id, Action::View)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(access.doc)))
}

pub async fn update_doc(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateDocRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    let access = require_doc(store, &actor, &headers, id, Action::Update)?;

    if req.top_doc.is_some_and(|t| t != access.doc.top_doc) {
        return Err(ApiError::bad_request("A doc cannot move to another project"));
    }
    if let Some(name) = &req.name {
        validate_doc_name(name)?;
    }
    reject_deleted_status(req.status)?;

    let changes = DocChanges {
        name: req.name.map(|n| n.trim().to_string()),
        content: req.content,
        pre_content: req.pre_content,
        parent_doc: req.parent_doc,
        sort: req.sort,
        status: req.status,
        editor_mode: req.editor_mode,
        open_children: req.open_children,
        show_children: req.show_children,
    };
    let doc = store.update_doc(id, &changes, auth.user.id)?;

    info!(doc_id = id, user = %auth.user.username, "doc updated");

    Ok::<_, ApiError>(Json(ApiResponse::success(doc)))
}

pub async fn delete_doc(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);
    require_doc(store, &actor, &headers, id, Action::Delete)?;

    store.soft_delete_doc(id)?;

    info!(doc_id = id, user = %auth.user.username, "doc deleted");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_doc_history(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    require_doc(store, &actor, &headers, id, Action::View)?;

    let history = store
        .list_doc_history(id)
        .api_err("Failed to list history")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(history)))
}
