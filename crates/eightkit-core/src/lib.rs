//! Core types and utilities for the 8kit workflow nodes
//!
//! # Modules
//!
//! - `config`: Credentials, client tuning and environment loading
//! - `endpoint`: REST endpoint paths
//! - `error`: Error types and Result alias
//! - `selector`: Field selection for value metadata
//! - `types`: Wire types shared by the client and the nodes
//! - `validation`: Name, value and key checks

pub mod config;
pub mod endpoint;
pub mod error;
pub mod selector;
pub mod types;
pub mod validation;

// Re-exports
pub use config::{load_environment, ClientConfig, Credentials};
pub use error::{Error, Result};
pub use selector::FieldSelector;
pub use types::*;
