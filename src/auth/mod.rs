mod credential;
mod middleware;
mod token;

pub use credential::CredentialHasher;
pub use middleware::{AuthError, RequireStaff, validate_token};
pub use token::{TokenGenerator, parse_token};
