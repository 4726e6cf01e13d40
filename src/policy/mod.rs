//! Authorization decisions for projects and documents.
//!
//! Every predicate here is a pure function over an explicit actor, the
//! facts about the target resource, and the request context. Nothing in
//! this module touches the store; callers load the facts first.
//!
//! Precedence is layered the same way for every resource:
//! superuser, then creator, then collaborator role, then the project's
//! visibility mode.

pub mod doc;
pub mod project;
pub mod share;

use crate::types::{CollaboratorRole, Project, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Manage,
}

/// Whoever is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User {
        id: i64,
        username: String,
        is_superuser: bool,
    },
}

impl Actor {
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User { username, .. } => Some(username),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        matches!(
            self,
            Self::User {
                is_superuser: true,
                ..
            }
        )
    }

    /// True when this actor is the user with the given id.
    #[must_use]
    pub fn is(&self, user_id: i64) -> bool {
        self.id() == Some(user_id)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::User {
            id: user.id,
            username: user.username.clone(),
            is_superuser: user.is_superuser,
        }
    }
}

/// Caller-supplied context for a single check.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'a> {
    pub viewcode: Option<&'a str>,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn with_viewcode(viewcode: Option<&'a str>) -> Self {
        Self { viewcode }
    }
}

/// A project together with the acting user's collaborator grant on it.
#[derive(Debug, Clone, Copy)]
pub struct ProjectFacts<'a> {
    pub project: &'a Project,
    pub collaborator: Option<CollaboratorRole>,
}

impl<'a> ProjectFacts<'a> {
    #[must_use]
    pub fn new(project: &'a Project, collaborator: Option<CollaboratorRole>) -> Self {
        Self {
            project,
            collaborator,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use super::Actor;
    use crate::types::{Doc, DocStatus, Project, Visibility};

    pub fn user(id: i64, username: &str) -> Actor {
        Actor::User {
            id,
            username: username.to_string(),
            is_superuser: false,
        }
    }

    pub fn superuser(id: i64) -> Actor {
        Actor::User {
            id,
            username: "root".to_string(),
            is_superuser: true,
        }
    }

    pub fn project(id: i64, owner: i64, role: Visibility, role_value: &str) -> Project {
        let now = Utc::now();
        Project {
            id,
            name: format!("project-{id}"),
            intro: String::new(),
            role,
            role_value: role_value.to_string(),
            create_user: owner,
            create_time: now,
            modify_time: now,
        }
    }

    pub fn doc(id: i64, project: i64, author: i64, status: DocStatus) -> Doc {
        let now = Utc::now();
        Doc {
            id,
            name: format!("doc-{id}"),
            content: String::new(),
            pre_content: String::new(),
            parent_doc: 0,
            top_doc: project,
            sort: 0,
            status,
            editor_mode: 1,
            open_children: false,
            show_children: false,
            create_user: author,
            create_time: now,
            modify_time: now,
        }
    }
}
