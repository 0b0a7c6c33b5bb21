pub mod auth;
pub mod contract;
pub mod types;

pub use auth::{authorization_header, verify_shared_secret};
pub use contract::{deploy_kind, env, headers, routes};
pub use types::*;
