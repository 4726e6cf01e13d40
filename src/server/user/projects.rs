use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use crate::auth::{OptionalActor, RequireUser};
use crate::policy::{Action, Actor, project};
use crate::server::AppState;
use crate::server::dto::{
    CreateProjectRequest, ProjectResponse, SearchParams, UpdateProjectRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreResultExt, paginate,
    parse_cursor,
};
use crate::server::validation::validate_project_name;
use crate::store::Store;
use crate::types::{NewProject, Project};

use super::access::{ProjectAccess, require_project, visible_project_ids};

fn to_response(
    store: &dyn Store,
    actor: &Actor,
    access: ProjectAccess,
) -> Result<ProjectResponse, ApiError> {
    let doc_count = store
        .count_project_docs(access.project.id)
        .api_err("Failed to count docs")?;
    let collaborator_count = store
        .list_collaborators(access.project.id)
        .api_err("Failed to list collaborators")?
        .len();
    let reveal = project::can_manage(actor, &access.facts());

    Ok(ProjectResponse::new(
        access.project,
        doc_count,
        collaborator_count,
        reveal,
    ))
}

pub async fn list_projects(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let ids: Vec<i64> = visible_project_ids(store, &actor, &headers)?
        .into_iter()
        .collect();
    let projects = store
        .list_projects(&ids, params.q.as_deref(), cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list projects")?;

    let (projects, next_cursor, has_more) =
        paginate(projects, DEFAULT_PAGE_SIZE as usize, |p| p.id.to_string());

    let mut data = Vec::with_capacity(projects.len());
    for project in projects {
        let collaborator = match actor.id() {
            Some(user_id) => store
                .get_collaborator_role(project.id, user_id)
                .api_err("Failed to check collaborator")?,
            None => None,
        };
        data.push(to_response(
            store,
            &actor,
            ProjectAccess {
                project,
                collaborator,
            },
        )?);
    }

    Ok::<_, ApiError>(Json(PaginatedResponse::new(data, next_cursor, has_more)))
}

pub async fn create_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);

    validate_project_name(&req.name)?;

    let project = store
        .create_project(&NewProject {
            name: req.name.trim().to_string(),
            intro: req.intro,
            role: req.role,
            role_value: req.role_value,
            create_user: auth.user.id,
        })
        .api_err("Failed to create project")?;

    info!(project_id = project.id, user = %auth.user.username, "project created");

    let response = to_response(
        store,
        &actor,
        ProjectAccess {
            project,
            collaborator: None,
        },
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

pub async fn get_project(
    OptionalActor(actor): OptionalActor,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let access = require_project(store, &actor, &headers, id, Action::View)?;
    let response = to_response(store, &actor, access)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(response)))
}

pub async fn update_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);

    let action = if req.touches_visibility() {
        Action::Manage
    } else {
        Action::Update
    };
    let mut access = require_project(store, &actor, &headers, id, action)?;

    let project: &mut Project = &mut access.project;
    if let Some(name) = req.name {
        validate_project_name(&name)?;
        project.name = name.trim().to_string();
    }
    if let Some(intro) = req.intro {
        project.intro = intro;
    }
    if let Some(role) = req.role {
        project.role = role;
    }
    if let Some(role_value) = req.role_value {
        project.role_value = role_value;
    }
    project.modify_time = Utc::now();

    store.update_project(project)?;

    let response = to_response(store, &actor, access)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(response)))
}

pub async fn delete_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let actor = Actor::from(&auth.user);

    require_project(store, &actor, &headers, id, Action::Manage)?;

    if !store.delete_project(id).api_err("Failed to delete project")? {
        return Err(ApiError::not_found("Project not found"));
    }

    info!(project_id = id, user = %auth.user.username, "project deleted");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
