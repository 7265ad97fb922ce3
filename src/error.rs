//! Error handling and custom error types
//!
//! Provides unified error handling across the conversion pipeline using thiserror.
//! Each variant maps to the pipeline stage that raised it; see [`Error::stage`].

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    #[error("Storage read failed: {0}")]
    StorageReadFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The part of the system an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Request,
    Model,
    Normalize,
    Commit,
    Fetch,
    Startup,
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::InvalidRequest(_) => Stage::Request,
            Error::ModelUnavailable(_) | Error::ModelError(_) => Stage::Model,
            Error::MalformedModelOutput(_) => Stage::Normalize,
            Error::StorageWriteFailed(_) => Stage::Commit,
            Error::StorageReadFailed(_) => Stage::Fetch,
            Error::Config(_) | Error::Io(_) => Stage::Startup,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Request => "request",
            Stage::Model => "model",
            Stage::Normalize => "normalize",
            Stage::Commit => "commit",
            Stage::Fetch => "fetch",
            Stage::Startup => "startup",
        };
        f.write_str(name)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            Error::ModelUnavailable(e.to_string())
        } else {
            Error::ModelError(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
