//! BobCoin CLI Library
//!
//! Configuration loading, the named-operation dispatcher, and the handlers
//! behind each `bob` subcommand. State lives in two JSON snapshot files under
//! the configured data directory, one per namespace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Subcommand handlers
pub mod commands;

/// CLI configuration
pub mod config;

/// Named-operation dispatcher
pub mod dispatch;

pub use config::{CliConfig, ConfigError};
pub use dispatch::{Dispatcher, Function, Invocation, Namespace};
