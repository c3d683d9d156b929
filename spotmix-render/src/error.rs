//! Request-boundary error type for spotmix-render
//!
//! Every failure in a render request ends up as a [`RenderError`]. The full
//! error is logged; the caller gets a short plain-text message and a status.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::engine::{MixExecutionError, ProbeError};
use crate::tts::ProviderError;

/// Render request errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Bad or missing request field
    #[error("{0}")]
    Validation(String),

    /// Deployment is missing the credential or the music asset
    #[error("{0}")]
    Configuration(String),

    /// Text-to-speech call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Voice clip could not be measured
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Mix invocation failed
    #[error(transparent)]
    MixExecution(#[from] MixExecutionError),

    /// Scratch file handling failed
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using RenderError
pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    pub fn status(&self) -> StatusCode {
        match self {
            RenderError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Concise message for the caller
    pub fn public_message(&self) -> String {
        match self {
            RenderError::Validation(msg) | RenderError::Configuration(msg) => msg.clone(),
            RenderError::Provider(e) => e.public_message(),
            RenderError::Probe(e) => {
                format!("Could not read the synthesized voice clip: {}", first_line(e))
            }
            RenderError::MixExecution(e) => format!("Mixing the spot failed: {}", first_line(e)),
            RenderError::Io(_) => "Server error".to_string(),
        }
    }
}

/// Engine diagnostics can run to many lines; callers get the first one
fn first_line(error: &dyn std::error::Error) -> String {
    error
        .to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.public_message(),
        )
            .into_response()
    }
}
