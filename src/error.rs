//! Error types for rust-sqldeploy

use std::path::PathBuf;
use thiserror::Error;

use crate::connection::ConnectionStringError;

/// Errors that can occur while resolving inputs or executing a deployment
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Invalid connection string")]
    InvalidConnectionString {
        #[source]
        source: ConnectionStringError,
    },

    #[error("Missing server name or address in the configuration")]
    MissingServerName,

    #[error("Invalid {expected} file path provided as input: {path}")]
    InvalidArtifactExtension { path: PathBuf, expected: &'static str },

    #[error("Required SQL file, DACPAC package, or database project file to execute action")]
    NoArtifactSpecified,

    #[error("Failed to resolve file path: {input} ({message})")]
    FileResolution { input: String, message: String },

    #[error("Failed to read SQL file: {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to {server}:{port}")]
    ConnectError {
        server: String,
        port: u16,
        #[source]
        source: tiberius::error::Error,
    },

    #[error("Timed out connecting to {server}:{port} after {timeout_secs}s")]
    ConnectTimeout {
        server: String,
        port: u16,
        timeout_secs: u64,
    },

    #[error("Failed to begin transaction")]
    BeginTransactionError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("SQL batch failed{}", format_rollback(.rollback_error))]
    BatchError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        rollback_error: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to commit transaction")]
    CommitError {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("SqlPackage CLI not found in PATH or .NET global tools")]
    SqlPackageNotFound,

    #[error("Failed to build database project {path}: {message}")]
    BuildFailed { path: PathBuf, message: String },

    #[error("Built dacpac not found at expected path: {path}")]
    BuiltDacpacMissing { path: PathBuf },

    #[error("Failed to publish {path}: {message}")]
    PublishFailed { path: PathBuf, message: String },
}

fn format_rollback(error: &Option<Box<dyn std::error::Error + Send + Sync>>) -> String {
    match error {
        Some(e) => format!(" (rollback also failed: {e})"),
        None => String::new(),
    }
}

impl From<ConnectionStringError> for DeployError {
    fn from(source: ConnectionStringError) -> Self {
        DeployError::InvalidConnectionString { source }
    }
}
