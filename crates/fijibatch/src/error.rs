use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FijibatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid placeholder pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}

/// Malformed caller input. Surfaced synchronously, before any document is
/// touched, and never retried.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("keyword input must contain at least one non-empty string")]
    EmptyKeywords,

    #[error("invalid channel token '{token}' in channel specification '{spec}'")]
    ChannelSpec { spec: String, token: String },

    #[error("unknown macro placeholder '{{{name}}}'; known placeholders: {known}")]
    UnknownPlaceholder { name: String, known: String },
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid tool executable: {0}")]
    InvalidExecutable(PathBuf),

    #[error("Failed to write macro file: {0}")]
    MacroFile(#[source] std::io::Error),

    #[error("Failed to spawn '{executable}': {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture tool output: {0}")]
    Capture(#[source] std::io::Error),

    #[error("Tool process failed: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Tool process timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Tool process cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FijibatchError>;
