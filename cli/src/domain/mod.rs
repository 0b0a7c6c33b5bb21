//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod daemon;
pub mod deploy;
pub mod error;
pub mod exapp;
pub mod registration;
pub mod scopes;

#[allow(unused_imports)]
pub use config::{ExappConfig, validate_config_key, validate_config_value};
#[allow(unused_imports)]
pub use error::{
    ConfigError, DockerApiError, DockerStage, NegotiationError, PersistenceError,
    TransportConfigError, ValidationError,
};
#[allow(unused_imports)]
pub use registration::{RegistrationError, RegistrationReport, RegistrationState, SagaStage};
