//! Unit tests for the exapp CLI
//!
//! Services run against in-memory and recording port implementations, so
//! these tests need no Docker daemon and no network.

mod mocks;

mod deploy_actions;
mod exapp_info;
