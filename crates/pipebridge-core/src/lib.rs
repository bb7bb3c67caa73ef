//! `pipebridge` Core Library
//!
//! Shared functionality for `pipebridge` components:
//! - Diagnostic decoding of the child's line-oriented wire protocol
//! - Bridge configuration and defaults
//! - Common error types

pub mod config;
pub mod error;
pub mod tracing_init;
pub mod wire;

pub use config::BridgeConfig;
pub use error::{Error, Result};
