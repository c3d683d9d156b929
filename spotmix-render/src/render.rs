//! Request-scoped render pipeline
//!
//! text → TTS → scratch voice file → probe → plan → mix graph → engine →
//! encoded spot. Strictly sequential; each step needs the previous result.
//!
//! All intermediate files live in one scratch directory per request, created
//! only after validation and the configuration checks pass, and removed when
//! the request finishes on any path.

use serde_json::Value;
use spotmix_common::config::TomlConfig;
use spotmix_common::timeline::{self, SegmentPlan, TimelineConfig};
use spotmix_common::graph;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::{AudioEngine, MixInputs};
use crate::error::{RenderError, Result};
use crate::tts::{SpeechSynthesizer, SPEECH_FILE_EXTENSION};
use crate::voice::VoiceClip;

/// Environment variable carrying the TTS credential
pub const API_KEY_ENV_VAR: &str = "ELEVENLABS_API_KEY";

/// Synthesized speech is always MPEG, whatever the output encoding
fn voice_file_name() -> String {
    format!("voice.{}", SPEECH_FILE_EXTENSION)
}

/// A validated render request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub text: String,
    pub voice_id: String,
}

impl RenderRequest {
    /// Check the fields of a render request
    ///
    /// `text` must contain something other than whitespace; it is passed on
    /// unmodified. `voice_id` becomes a URL path segment, so it is limited to
    /// ASCII letters, digits, `-` and `_`.
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let voice_id = voice_id.into();

        if text.trim().is_empty() {
            return Err(RenderError::Validation("No text provided".to_string()));
        }
        if voice_id.is_empty() {
            return Err(RenderError::Validation("No voiceId provided".to_string()));
        }
        if !voice_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(RenderError::Validation("Invalid voiceId".to_string()));
        }

        Ok(Self { text, voice_id })
    }

    /// Parse a JSON body `{ "text": ..., "voiceId": ... }`
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RenderError::Validation(format!("Invalid JSON body: {}", e)))?;

        let text = match value.get("text") {
            Some(Value::String(text)) => text.clone(),
            _ => return Err(RenderError::Validation("No text provided".to_string())),
        };
        let voice_id = match value.get("voiceId") {
            Some(Value::String(voice_id)) => voice_id.clone(),
            _ => return Err(RenderError::Validation("No voiceId provided".to_string())),
        };

        Self::new(text, voice_id)
    }
}

/// A finished spot
#[derive(Debug, Clone)]
pub struct RenderedSpot {
    pub audio: Vec<u8>,
    pub plan: SegmentPlan,
}

/// Runs the render pipeline against its two external collaborators
pub struct SpotRenderer {
    /// `None` when no credential is configured
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    engine: Arc<dyn AudioEngine>,
    timeline: TimelineConfig,
    background_music: PathBuf,
    work_dir: PathBuf,
}

impl SpotRenderer {
    pub fn new(
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        engine: Arc<dyn AudioEngine>,
        config: &TomlConfig,
    ) -> Self {
        Self {
            synthesizer,
            engine,
            timeline: config.timeline.clone(),
            background_music: config.assets.background_music.clone(),
            work_dir: config.assets.work_dir.clone(),
        }
    }

    /// Whether a TTS credential was configured at startup
    pub fn has_synthesizer(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn background_music(&self) -> &Path {
        &self.background_music
    }

    /// Render one spot
    pub async fn render(&self, request: &RenderRequest) -> Result<RenderedSpot> {
        let started = Instant::now();

        let synthesizer = self.synthesizer.as_ref().ok_or_else(|| {
            RenderError::Configuration(format!("Missing {}", API_KEY_ENV_VAR))
        })?;
        if !tokio::fs::try_exists(&self.background_music)
            .await
            .unwrap_or(false)
        {
            return Err(RenderError::Configuration(format!(
                "Missing {}",
                self.background_music.display()
            )));
        }

        let speech = synthesizer
            .synthesize(&request.text, &request.voice_id)
            .await?;
        debug!(bytes = speech.len(), "Received synthesized speech");

        let scratch = tempfile::Builder::new()
            .prefix("spot-")
            .tempdir_in(&self.work_dir)?;
        let voice_path = scratch.path().join(voice_file_name());
        tokio::fs::write(&voice_path, &speech).await?;

        let clip = VoiceClip::probe(self.engine.as_ref(), voice_path).await?;
        let plan = timeline::plan(clip.duration_seconds(), &self.timeline);

        info!(
            voice_seconds = clip.duration_seconds(),
            total_seconds = plan.total_seconds,
            voice_trim_seconds = plan.voice_trim_seconds,
            voice_tempo = plan.voice_tempo,
            fade_curve = %plan.fade_out_curve,
            "Planned spot"
        );
        if plan.is_speech_truncated() {
            warn!(
                truncated_seconds = plan.truncated_speech_seconds,
                max_total_seconds = self.timeline.max_total_seconds,
                "Speech does not fit the spot and will be cut off"
            );
        }

        let graph = graph::build(&plan);
        let inputs = MixInputs {
            voice: clip.path().to_path_buf(),
            background: self.background_music.clone(),
            scratch_dir: scratch.path().to_path_buf(),
        };
        let audio = self.engine.run_graph(&inputs, &graph).await?;

        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory: {}", e);
        }

        info!(
            bytes = audio.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Spot rendered"
        );

        Ok(RenderedSpot { audio, plan })
    }
}
