//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    /// Any failure to obtain a reply from an inference backend, including
    /// empty or malformed output.
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Input closed before the conversation finished")]
    InputClosed,

    #[error("Session already completed its {0} requested turns")]
    SessionFinished(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Fold an arbitrary failure into [`Error::Backend`].
    pub fn into_backend(self) -> Self {
        match self {
            Error::Backend(_) => self,
            other => Error::Backend(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
