use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    CollaboratorRole, DocStatus, Project, ShareType, Tag, Token, User, Visibility,
};

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListDocsParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub top_doc: Option<i64>,
    #[serde(default)]
    pub parent_doc: Option<i64>,
}

// Users and tokens

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: Token,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub tokens: Vec<Token>,
}

// Projects

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub role: Visibility,
    #[serde(default)]
    pub role_value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub role: Option<Visibility>,
    #[serde(default)]
    pub role_value: Option<String>,
}

impl UpdateProjectRequest {
    /// Visibility settings need manage rights; everything else needs write.
    #[must_use]
    pub fn touches_visibility(&self) -> bool {
        self.role.is_some() || self.role_value.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    pub intro: String,
    pub role: Visibility,
    /// Only revealed to actors who can manage the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_value: Option<String>,
    pub create_user: i64,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
    pub doc_count: i64,
    pub collaborator_count: usize,
}

impl ProjectResponse {
    #[must_use]
    pub fn new(
        project: Project,
        doc_count: i64,
        collaborator_count: usize,
        reveal_settings: bool,
    ) -> Self {
        Self {
            id: project.id,
            name: project.name,
            intro: project.intro,
            role: project.role,
            role_value: reveal_settings.then_some(project.role_value),
            create_user: project.create_user,
            create_time: project.create_time,
            modify_time: project.modify_time,
            doc_count,
            collaborator_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CollaboratorRequest {
    pub role: CollaboratorRole,
}

// Docs

#[derive(Debug, Deserialize)]
pub struct CreateDocRequest {
    pub name: String,
    /// Owning project. Optional here so a missing id is a 400, not a 422.
    #[serde(default)]
    pub top_doc: Option<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pre_content: String,
    #[serde(default)]
    pub parent_doc: i64,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub status: DocStatus,
    #[serde(default = "default_editor_mode")]
    pub editor_mode: i64,
    #[serde(default)]
    pub open_children: bool,
    #[serde(default)]
    pub show_children: bool,
}

fn default_editor_mode() -> i64 {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDocRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub top_doc: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub pre_content: Option<String>,
    #[serde(default)]
    pub parent_doc: Option<i64>,
    #[serde(default)]
    pub sort: Option<i64>,
    #[serde(default)]
    pub status: Option<DocStatus>,
    #[serde(default)]
    pub editor_mode: Option<i64>,
    #[serde(default)]
    pub open_children: Option<bool>,
    #[serde(default)]
    pub show_children: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DocTagsRequest {
    pub tags: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct DocTagsResponse {
    pub doc_id: i64,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    #[serde(default)]
    pub share_type: ShareType,
    #[serde(default)]
    pub share_value: Option<String>,
    #[serde(default = "default_enabled")]
    pub is_enable: bool,
}

fn default_enabled() -> bool {
    true
}
