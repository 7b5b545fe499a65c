mod server;

pub use server::{DEFAULT_ADMIN_EMAIL, MAX_TOKEN_TTL_HOURS, ServerConfig};
