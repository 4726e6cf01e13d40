mod models;
mod role;

pub use models::*;
pub use role::{CollaboratorRole, DocStatus, ShareType, UnknownCode, Visibility};
