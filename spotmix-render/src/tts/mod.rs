//! Text-to-speech provider seam

pub mod elevenlabs;

use async_trait::async_trait;
use thiserror::Error;

pub use elevenlabs::ElevenLabsClient;

/// Media type every synthesizer is asked to return
pub const SPEECH_CONTENT_TYPE: &str = "audio/mpeg";

/// File extension matching [`SPEECH_CONTENT_TYPE`]
pub const SPEECH_FILE_EXTENSION: &str = "mp3";

/// TTS provider failures
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request never got a response
    #[error("TTS request failed: {0}")]
    Network(String),

    /// Provider answered with an error status
    #[error("TTS provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Provider answered 2xx without audio
    #[error("TTS provider returned no audio")]
    EmptyAudio,
}

impl ProviderError {
    /// Text safe to show the caller: the provider's own message where there is one
    pub fn public_message(&self) -> String {
        match self {
            ProviderError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Turns text into an encoded audio stream
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ProviderError>;
}
