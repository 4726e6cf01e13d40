use std::collections::BTreeSet;

use axum::http::HeaderMap;
use tracing::debug;

use crate::auth::viewcode_for;
use crate::policy::{Action, Actor, Context, ProjectFacts, doc, project};
use crate::resolver::readable_projects;
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::{CollaboratorRole, Doc, DocStatus, Project};

/// A project loaded together with the actor's collaborator grant on it.
pub struct ProjectAccess {
    pub project: Project,
    pub collaborator: Option<CollaboratorRole>,
}

impl ProjectAccess {
    #[must_use]
    pub fn facts(&self) -> ProjectFacts<'_> {
        ProjectFacts::new(&self.project, self.collaborator)
    }
}

pub struct DocAccess {
    pub doc: Doc,
    /// `None` when the owning project no longer exists.
    pub project: Option<ProjectAccess>,
}

/// Denials for an actor who could see the resource: anonymous callers are
/// asked to authenticate, everyone else is refused.
fn denied(actor: &Actor, message: &str) -> ApiError {
    if actor.is_authenticated() {
        ApiError::forbidden(message)
    } else {
        ApiError::unauthorized("Authentication required")
    }
}

pub fn load_project(
    store: &dyn Store,
    actor: &Actor,
    project_id: i64,
) -> Result<Option<ProjectAccess>, ApiError> {
    let Some(project) = store
        .get_project(project_id)
        .api_err("Failed to get project")?
    else {
        return Ok(None);
    };

    let collaborator = match actor.id() {
        Some(user_id) => store
            .get_collaborator_role(project_id, user_id)
            .api_err("Failed to check collaborator")?,
        None => None,
    };

    Ok(Some(ProjectAccess {
        project,
        collaborator,
    }))
}

/// Loads a project the actor may see and checks `action` on it.
/// Projects the actor cannot see are reported as missing.
pub fn require_project(
    store: &dyn Store,
    actor: &Actor,
    headers: &HeaderMap,
    project_id: i64,
    action: Action,
) -> Result<ProjectAccess, ApiError> {
    let access =
        load_project(store, actor, project_id)?.or_not_found("Project not found")?;

    let viewcode = viewcode_for(headers, project_id);
    let ctx = Context::with_viewcode(viewcode.as_deref());
    let facts = access.facts();

    if !project::can_view(actor, &facts, &ctx) {
        debug!(project_id, ?actor, "project hidden from actor");
        return Err(ApiError::not_found("Project not found"));
    }
    if !project::allows(actor, &facts, action, &ctx) {
        debug!(project_id, ?action, ?actor, "project action denied");
        return Err(denied(actor, "Insufficient project permissions"));
    }

    Ok(access)
}

/// Loads a doc and checks `action` on it. Docs the actor can neither see
/// nor act on are reported as missing. Deleted docs are only reachable
/// for a repeated delete.
pub fn require_doc(
    store: &dyn Store,
    actor: &Actor,
    headers: &HeaderMap,
    doc_id: i64,
    action: Action,
) -> Result<DocAccess, ApiError> {
    let doc = store
        .get_doc(doc_id)
        .api_err("Failed to get doc")?
        .or_not_found("Doc not found")?;

    if doc.status == DocStatus::Deleted && action != Action::Delete {
        return Err(ApiError::not_found("Doc not found"));
    }

    let project = load_project(store, actor, doc.top_doc)?;
    let facts = project.as_ref().map(ProjectAccess::facts);
    let viewcode = viewcode_for(headers, doc.top_doc);
    let ctx = Context::with_viewcode(viewcode.as_deref());

    // A draft hidden from its editors can still be updated or deleted by them.
    let visible = doc::can_view(actor, &doc, facts.as_ref(), &ctx);
    if !doc::allows(actor, &doc, facts.as_ref(), action, &ctx) {
        if !visible {
            debug!(doc_id, ?action, ?actor, "doc hidden from actor");
            return Err(ApiError::not_found("Doc not found"));
        }
        debug!(doc_id, ?action, ?actor, "doc action denied");
        return Err(denied(actor, "Insufficient doc permissions"));
    }

    Ok(DocAccess { doc, project })
}

/// Projects the actor can list right now: the open readable set plus
/// link-gated projects whose viewcode the request presents.
pub fn visible_project_ids(
    store: &dyn Store,
    actor: &Actor,
    headers: &HeaderMap,
) -> Result<BTreeSet<i64>, ApiError> {
    let readable = readable_projects(store, actor).api_err("Failed to resolve projects")?;
    let mut ids = readable.open;

    for id in readable.link_gated {
        let Some(code) = viewcode_for(headers, id) else {
            continue;
        };
        let Some(project) = store.get_project(id).api_err("Failed to get project")? else {
            continue;
        };
        let facts = ProjectFacts::new(&project, None);
        if project::can_view(actor, &facts, &Context::with_viewcode(Some(&code))) {
            ids.insert(id);
        }
    }

    Ok(ids)
}
