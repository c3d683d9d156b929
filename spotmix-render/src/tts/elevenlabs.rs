//! ElevenLabs text-to-speech client
//!
//! `POST {base_url}/v1/text-to-speech/{voice_id}` with the text, model id and
//! fixed voice settings; the response body is MPEG audio.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Serialize;
use spotmix_common::config::TtsConfig;
use std::time::Duration;
use tracing::debug;

use super::{ProviderError, SpeechSynthesizer, SPEECH_CONTENT_TYPE};

const USER_AGENT: &str = concat!("spotmix/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "xi-api-key";

/// Voice quality parameters sent with every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
    pub use_speaker_boost: bool,
}

impl From<&TtsConfig> for VoiceSettings {
    fn from(config: &TtsConfig) -> Self {
        Self {
            stability: config.stability,
            similarity_boost: config.similarity_boost,
            style: config.style,
            use_speaker_boost: config.use_speaker_boost,
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// ElevenLabs API client
pub struct ElevenLabsClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    pub fn new(api_key: String, config: &TtsConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model_id: config.model_id.clone(),
            voice_settings: VoiceSettings::from(config),
        })
    }

    pub fn synthesis_url(&self, voice_id: &str) -> String {
        format!("{}/v1/text-to-speech/{}", self.base_url, voice_id)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        let body = SynthesisRequest {
            text,
            model_id: &self.model_id,
            voice_settings: &self.voice_settings,
        };

        debug!(voice_id, chars = text.chars().count(), "Requesting speech synthesis");

        let response = self
            .http_client
            .post(self.synthesis_url(voice_id))
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, SPEECH_CONTENT_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let message = if message.trim().is_empty() {
                "TTS failed".to_string()
            } else {
                message
            };
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if audio.is_empty() {
            return Err(ProviderError::EmptyAudio);
        }

        debug!(bytes = audio.len(), "Speech synthesis complete");
        Ok(audio.to_vec())
    }
}
