//! Subcommand implementations.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod wishlist;

use std::io::{self, Write};

use sstashed_storefront::{ConfigError, GatewayError, OpResult};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The gateway call failed.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// The command needs an account but no credentials are configured.
    #[error("Not signed in: set SSTASHED_TOKEN or SSTASHED_EMAIL and SSTASHED_PASSWORD")]
    NotAuthenticated,

    /// A synchronizer operation reported failure.
    #[error("{0}")]
    Operation(String),

    /// An argument could not be understood.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),

    /// Output could not be serialized.
    #[error("Output error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turn a failed [`OpResult`] into an error so the process exits non-zero.
pub fn ensure_success(result: OpResult) -> Result<(), CliError> {
    match result {
        OpResult::Success => Ok(()),
        OpResult::Failure { message } => Err(CliError::Operation(message)),
    }
}

/// Write one line to stdout.
pub fn line(text: impl std::fmt::Display) -> Result<(), CliError> {
    writeln!(io::stdout().lock(), "{text}")?;
    Ok(())
}

/// Write a value as pretty JSON to stdout.
pub fn json(value: &impl serde::Serialize) -> Result<(), CliError> {
    line(serde_json::to_string_pretty(value)?)
}
