pub mod names;
mod schema;
mod sqlite;
pub mod tree;

pub use sqlite::SqliteStore;

use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::*;
use tree::{Placement, TreeRow};

/// Filters for listing docs.
#[derive(Debug, Clone, Default)]
pub struct DocQuery {
    /// Projects to search. An empty list matches nothing.
    pub project_ids: Vec<i64>,
    pub parent_doc: Option<i64>,
    pub name_contains: Option<String>,
    /// Drafts created by this user are included.
    pub draft_owner: Option<i64>,
    /// Include every draft regardless of author.
    pub all_drafts: bool,
    pub include_deleted: bool,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, is_superuser: bool) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: i64, limit: i32) -> Result<Vec<User>>;
    fn has_superuser(&self) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_user_tokens(&self, user_id: i64) -> Result<Vec<Token>>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Project operations
    fn create_project(&self, project: &NewProject) -> Result<Project>;
    fn get_project(&self, id: i64) -> Result<Option<Project>>;
    fn list_projects(
        &self,
        ids: &[i64],
        name_contains: Option<&str>,
        cursor: i64,
        limit: i32,
    ) -> Result<Vec<Project>>;
    fn update_project(&self, project: &Project) -> Result<()>;
    fn delete_project(&self, id: i64) -> Result<bool>;
    fn count_project_docs(&self, id: i64) -> Result<i64>;

    // Collaborator operations
    fn upsert_collaborator(&self, project_id: i64, user_id: i64, role: CollaboratorRole)
    -> Result<()>;
    fn remove_collaborator(&self, project_id: i64, user_id: i64) -> Result<bool>;
    fn get_collaborator_role(&self, project_id: i64, user_id: i64)
    -> Result<Option<CollaboratorRole>>;
    fn list_collaborators(&self, project_id: i64) -> Result<Vec<Collaborator>>;

    // Visibility resolver queries
    fn all_project_ids(&self) -> Result<BTreeSet<i64>>;
    fn project_ids_with_visibility(&self, visibility: Visibility) -> Result<BTreeSet<i64>>;
    fn created_project_ids(&self, user_id: i64) -> Result<BTreeSet<i64>>;
    fn collaborating_project_ids(&self, user_id: i64) -> Result<BTreeSet<i64>>;
    fn restricted_project_ids_listing(&self, username: &str) -> Result<BTreeSet<i64>>;

    // Doc operations
    fn create_doc(&self, doc: &NewDoc) -> Result<Doc>;
    fn get_doc(&self, id: i64) -> Result<Option<Doc>>;
    fn list_docs(&self, query: &DocQuery, cursor: i64, limit: i32) -> Result<Vec<Doc>>;
    /// Records the current `pre_content` in history, then applies the
    /// changes, in one transaction.
    fn update_doc(&self, id: i64, changes: &DocChanges, editor: i64) -> Result<Doc>;
    /// Marks the doc and its direct children deleted, in one transaction.
    fn soft_delete_doc(&self, id: i64) -> Result<()>;
    fn list_doc_history(&self, doc_id: i64) -> Result<Vec<DocHistory>>;

    // Tree operations
    fn list_tree_rows(&self, project_id: i64) -> Result<Vec<TreeRow>>;
    fn get_project_toc(&self, project_id: i64) -> Result<Option<String>>;
    /// Applies placements to docs of the project and caches the raw tree.
    fn apply_tree(&self, project_id: i64, placements: &[Placement], raw: &str) -> Result<()>;

    // Tag operations
    fn list_tags(&self, name_contains: Option<&str>, cursor: i64, limit: i32) -> Result<Vec<Tag>>;
    fn get_tag(&self, id: i64) -> Result<Option<Tag>>;
    fn list_doc_tags(&self, doc_id: i64) -> Result<Vec<Tag>>;
    fn list_tag_docs(&self, tag_id: i64, project_ids: &[i64]) -> Result<Vec<Doc>>;
    /// Makes the doc's tags exactly `names`, creating missing tags as `user_id`.
    fn reconcile_doc_tags(&self, doc_id: i64, names: &[String], user_id: i64) -> Result<Vec<Tag>>;

    // Share operations
    fn upsert_doc_share(&self, doc_id: i64, settings: &ShareSettings) -> Result<DocShare>;
    fn get_doc_share(&self, doc_id: i64) -> Result<Option<DocShare>>;
    fn get_doc_share_by_token(&self, token: &str) -> Result<Option<DocShare>>;
}
