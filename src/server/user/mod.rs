pub mod access;
mod collaborators;
mod doc_tags;
mod docs;
mod me;
mod projects;
mod shares;
mod tags;
mod tree;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(me::get_me))
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{id}/collaborators",
            get(collaborators::list_collaborators),
        )
        .route(
            "/projects/{id}/collaborators/{user_id}",
            put(collaborators::set_collaborator).delete(collaborators::remove_collaborator),
        )
        .route("/projects/{id}/docs", get(docs::list_project_docs))
        .route("/projects/{id}/tree", get(tree::get_tree).put(tree::put_tree))
        // Docs
        .route("/docs", get(docs::list_docs).post(docs::create_doc))
        .route(
            "/docs/{id}",
            get(docs::get_doc)
                .put(docs::update_doc)
                .delete(docs::delete_doc),
        )
        .route("/docs/{id}/history", get(docs::list_doc_history))
        .route(
            "/docs/{id}/tags",
            get(doc_tags::list_doc_tags).post(doc_tags::set_doc_tags),
        )
        .route(
            "/docs/{id}/share",
            get(shares::get_doc_share).post(shares::set_doc_share),
        )
        .route("/shares/{token}", get(shares::open_share))
        // Tags
        .route("/tags", get(tags::list_tags))
        .route("/tags/{id}/docs", get(tags::list_tag_docs))
}
