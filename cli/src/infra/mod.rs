//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: Docker Engine API calls,
//! ExApp callbacks, the JSON registry, the YAML config file and terminal
//! prompts.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod confirm;
pub mod docker;
pub mod exapp_client;
pub mod store;
pub mod transport;
