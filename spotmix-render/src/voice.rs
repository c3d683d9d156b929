//! Synthesized voice clips and the duration prober

use std::path::{Path, PathBuf};

use crate::engine::{AudioEngine, ProbeError};

/// A voice clip on disk with its measured length
///
/// Lives inside a request's scratch directory and is removed with it.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceClip {
    path: PathBuf,
    duration_seconds: f64,
}

impl VoiceClip {
    /// Measure the clip at `path`
    ///
    /// The engine result is checked again here so that nothing but a positive
    /// finite duration ever reaches the planner, whatever engine is plugged in.
    pub async fn probe(engine: &dyn AudioEngine, path: PathBuf) -> Result<Self, ProbeError> {
        let duration_seconds = engine.probe_duration(&path).await?;
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return Err(ProbeError::InvalidDuration(duration_seconds.to_string()));
        }
        Ok(Self {
            path,
            duration_seconds,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}
