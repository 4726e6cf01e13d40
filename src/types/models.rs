use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CollaboratorRole, DocStatus, ShareType, Visibility};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub intro: String,
    pub role: Visibility,
    /// Meaning depends on `role`: an allowlist for `RestrictedList`,
    /// the link token for `LinkProtected`, ignored otherwise.
    pub role_value: String,
    pub create_user: i64,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub intro: String,
    pub role: Visibility,
    pub role_value: String,
    pub create_user: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    pub project_id: i64,
    pub user_id: i64,
    pub username: String,
    pub role: CollaboratorRole,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doc {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub pre_content: String,
    /// 0 for a top-level doc.
    pub parent_doc: i64,
    /// Owning project id. Never changes after creation.
    pub top_doc: i64,
    pub sort: i64,
    pub status: DocStatus,
    pub editor_mode: i64,
    pub open_children: bool,
    pub show_children: bool,
    pub create_user: i64,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDoc {
    pub name: String,
    pub content: String,
    pub pre_content: String,
    pub parent_doc: i64,
    pub top_doc: i64,
    pub sort: i64,
    pub status: DocStatus,
    pub editor_mode: i64,
    pub open_children: bool,
    pub show_children: bool,
    pub create_user: i64,
}

/// Field changes applied by a doc update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DocChanges {
    pub name: Option<String>,
    pub content: Option<String>,
    pub pre_content: Option<String>,
    pub parent_doc: Option<i64>,
    pub sort: Option<i64>,
    pub status: Option<DocStatus>,
    pub editor_mode: Option<i64>,
    pub open_children: Option<bool>,
    pub show_children: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocHistory {
    pub id: i64,
    pub doc_id: i64,
    pub pre_content: String,
    pub create_user: i64,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocShare {
    pub doc_id: i64,
    pub token: String,
    pub share_type: ShareType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_value: Option<String>,
    pub is_enable: bool,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ShareSettings {
    pub share_type: ShareType,
    pub share_value: Option<String>,
    pub is_enable: bool,
}
