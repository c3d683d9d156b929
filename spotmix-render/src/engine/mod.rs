//! Audio Processing Engine adapter
//!
//! [`AudioEngine`] is the narrow seam between the render pipeline and the
//! external engine: measure a clip, run a mix graph. [`FfmpegEngine`] is the
//! production implementation over ffprobe/ffmpeg.

pub mod ffmpeg;
pub mod process;

use async_trait::async_trait;
use spotmix_common::MixGraph;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use ffmpeg::FfmpegEngine;
pub use process::{CommandRunner, ProcessOutput, TokioCommandRunner};

/// Duration probe failures
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Probe program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Probe exited non-zero
    #[error("Probe exited with {exit}: {stderr}")]
    Failed { exit: String, stderr: String },

    /// Output was not a positive finite number of seconds
    #[error("Could not read duration from probe output: \"{0}\"")]
    InvalidDuration(String),
}

/// Mix invocation failures
#[derive(Debug, Error)]
pub enum MixExecutionError {
    /// Engine program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Engine exited non-zero; carries its diagnostic output
    #[error("Mix exited with {exit}: {diagnostics}")]
    Failed { exit: String, diagnostics: String },

    /// Graph rejected before invoking the engine
    #[error("Refusing to run mix graph: {0}")]
    InvalidGraph(#[from] spotmix_common::Error),

    /// Finished output could not be read back
    #[error("Failed to read mix output: {0}")]
    Output(#[source] std::io::Error),

    /// Engine reported success but wrote nothing
    #[error("Mix produced an empty output file")]
    EmptyOutput,
}

/// Files handed to one mix invocation
#[derive(Debug, Clone)]
pub struct MixInputs {
    /// Engine input 0
    pub voice: PathBuf,
    /// Engine input 1, looped for as long as the graph reads it
    pub background: PathBuf,
    /// Request-scoped directory for the encoded output
    pub scratch_dir: PathBuf,
}

/// Narrow interface to the external audio engine
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Length of a decodable audio file, in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError>;

    /// Run `graph` over `inputs` and return the encoded result
    ///
    /// Either the complete output is returned or an error; no partial file
    /// is left behind in the scratch directory.
    async fn run_graph(
        &self,
        inputs: &MixInputs,
        graph: &MixGraph,
    ) -> Result<Vec<u8>, MixExecutionError>;
}
