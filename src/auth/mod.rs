mod helpers;
mod middleware;
mod token;

pub use helpers::{VIEWCODE_HEADER, viewcode_for};
pub use middleware::{AuthError, OptionalActor, RequireSuperuser, RequireUser};
pub use token::{IssuedToken, TokenGenerator, parse_token};
