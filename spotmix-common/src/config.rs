//! Bootstrap configuration loading and config file resolution
//!
//! All settings are fixed at process start. Every field has a built-in
//! default, so a missing config file is not an error.

use crate::timeline::TimelineConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SPOTMIX_CONFIG";

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// This file was requested but does not exist; defaults are in use
    NotFound(PathBuf),
    /// No config file was requested or found
    Defaults,
}

impl ConfigSource {
    /// Log where the configuration came from
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::NotFound(path) => {
                warn!("Config file {} not found, using defaults", path.display())
            }
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
        }
    }
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub assets: AssetConfig,
    pub timeline: TimelineConfig,
    pub tts: TtsConfig,
    pub engine: EngineConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([127, 0, 0, 1]),
            port: 5790,
        }
    }
}

/// Static asset and scratch locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Looping music bed under every spot
    pub background_music: PathBuf,
    /// Parent directory for request-scoped scratch directories
    pub work_dir: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            background_music: PathBuf::from("public/audio/bgm.mp3"),
            work_dir: std::env::temp_dir(),
        }
    }
}

/// Text-to-speech provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Provider credential; usually supplied through the environment instead
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
    pub stability: f64,
    pub similarity_boost: f64,
    pub style: f64,
    pub use_speaker_boost: bool,
    pub timeout_seconds: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.elevenlabs.io".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.45,
            similarity_boost: 0.85,
            style: 0.6,
            use_speaker_boost: true,
            timeout_seconds: 60,
        }
    }
}

/// Audio engine program locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Encoding of the finished spot
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub codec: String,
    pub bitrate: String,
    /// File extension, also used for the download filename
    pub extension: String,
    pub content_type: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".to_string(),
            bitrate: "192k".to_string(),
            extension: "mp3".to_string(),
            content_type: "audio/mpeg".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the resolved config file, falling back to defaults when none exists
    ///
    /// A file that exists but cannot be parsed is still an error. Nothing is
    /// logged here; the caller reports the returned [`ConfigSource`] once
    /// logging is up.
    pub fn load_or_default(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match path {
            Some(path) if path.exists() => {
                let config = Self::load(path)?;
                Ok((config, ConfigSource::File(path.to_path_buf())))
            }
            Some(path) => Ok((Self::default(), ConfigSource::NotFound(path.to_path_buf()))),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    /// Check values that would make every render fail
    pub fn validate(&self) -> Result<()> {
        self.timeline.validate()?;

        let output_fields = [
            ("output.codec", &self.output.codec),
            ("output.bitrate", &self.output.bitrate),
            ("output.extension", &self.output.extension),
            ("output.content_type", &self.output.content_type),
        ];
        for (name, value) in output_fields {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }

        if self.tts.base_url.trim().is_empty() {
            return Err(Error::Config("tts.base_url must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `<user config dir>/spotmix/config.toml`
/// 4. `/etc/spotmix/config.toml` (Linux only)
///
/// Returns `None` when no candidate exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3/4: platform config locations
    default_config_candidates()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("spotmix").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/spotmix/config.toml"));
    }
    candidates
}
