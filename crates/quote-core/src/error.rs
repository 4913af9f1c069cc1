//! Error types for quote-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quote-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a source file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source could not be decoded into rows
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A listed source file does not exist
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Failed to write the destination asset
    #[error("failed to write asset '{path}': {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid conversion configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while decoding CSV text into raw rows
#[derive(Debug, Error)]
pub enum DecodeError {
    /// CSV syntax or encoding error from the csv crate
    #[error("CSV error in '{source_name}': {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    /// Source bytes are not valid UTF-8
    #[error("invalid UTF-8 in '{source_name}': {source}")]
    Encoding {
        source_name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The header row lacks a required column
    #[error("missing column '{column}' in header of '{source_name}'")]
    MissingHeader { source_name: String, column: String },

    /// The text has no header row at all
    #[error("no header row in '{source_name}'")]
    EmptyHeader { source_name: String },
}

impl DecodeError {
    /// Name of the source that failed to decode
    pub fn source_name(&self) -> &str {
        match self {
            DecodeError::Csv { source_name, .. }
            | DecodeError::Encoding { source_name, .. }
            | DecodeError::MissingHeader { source_name, .. }
            | DecodeError::EmptyHeader { source_name } => source_name,
        }
    }
}
