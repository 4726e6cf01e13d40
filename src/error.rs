use thiserror::Error;

use crate::types::UnknownCode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("token hashing failed: {0}")]
    Hashing(String),

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("parent doc {parent} does not belong to project {project}")]
    ParentOutsideProject { parent: i64, project: i64 },

    #[error("doc {0} cannot be placed below itself")]
    ParentLoop(i64),

    #[error("invalid tree: {0}")]
    InvalidTree(String),
}

pub type Result<T> = std::result::Result<T, Error>;
