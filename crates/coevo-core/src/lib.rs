//! Core types, configuration, and error handling for coevo.
//!
//! This crate provides the shared foundation used by the mining engine and
//! the command-line collaborator:
//! - [`CoevoError`]: unified error type using `thiserror`, classified by [`ErrorKind`]
//! - [`CoevoConfig`]: configuration loaded from `.coevo.toml`
//! - Shared types: [`VcsFormat`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{CoevoConfig, CouplingConfig, MiningConfig, ThresholdConfig};
pub use error::{CoevoError, ErrorKind};
pub use types::{OutputFormat, VcsFormat};

/// A convenience `Result` type for coevo operations.
pub type Result<T> = std::result::Result<T, CoevoError>;
