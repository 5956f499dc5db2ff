//! Error types for loading service configuration
//!
//! Every error is fatal to the load call that raised it; an import tree is
//! unwound to the outermost caller.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure reported by a [`Decode`](crate::decode::Decode) implementation
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    #[error("Unsupported value: {0}")]
    Unsupported(String),
}

/// Main error type for the loader
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Schema, shape or reference violation found in a document
    #[error("{message}")]
    InvalidConfiguration {
        message: String,
        file: PathBuf,
        #[source]
        source: Option<DecodeError>,
    },

    /// The host environment lacks something the loader needs (e.g. a decoder)
    #[error("{0}")]
    UnsupportedFeature(String),

    #[error("The file \"{resource}\" does not exist (in: {searched}).")]
    ResourceNotFound { resource: String, searched: String },

    #[error("Circular reference detected in \"{file}\" (\"{chain}\").", file = .file.display())]
    CircularImport { file: PathBuf, chain: String },

    #[error("I/O error reading {path}: {error}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl LoaderError {
    pub fn invalid(file: &Path, message: impl Into<String>) -> Self {
        LoaderError::InvalidConfiguration {
            message: message.into(),
            file: file.to_path_buf(),
            source: None,
        }
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, LoaderError::InvalidConfiguration { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoaderError::ResourceNotFound { .. })
    }
}

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;
