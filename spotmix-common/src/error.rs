//! Common error types for spotmix

use thiserror::Error;

/// Common result type for spotmix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the spotmix crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error for a configuration file
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Timeline parameters violate their invariants
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    /// Mix graph is not a well-formed single-sink DAG
    #[error("Invalid mix graph: {0}")]
    InvalidGraph(String),
}
