//! Shared fakes for spotmix-render integration tests
//!
//! `FakeSynthesizer` and `FakeEngine` stand in for the TTS provider and the
//! audio engine, counting calls and recording what they were handed.

#![allow(dead_code)]

use async_trait::async_trait;
use spotmix_common::config::TomlConfig;
use spotmix_common::MixGraph;
use spotmix_render::engine::{AudioEngine, MixExecutionError, MixInputs, ProbeError};
use spotmix_render::tts::{ProviderError, SpeechSynthesizer};
use spotmix_render::SpotRenderer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const FAKE_SPEECH: &[u8] = b"ID3-fake-speech";
pub const FAKE_SPOT: &[u8] = b"ID3-fake-spot";

#[derive(Clone, Copy, Debug)]
pub enum SynthBehavior {
    Speech,
    ApiError,
}

pub struct FakeSynthesizer {
    behavior: SynthBehavior,
    pub calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn new(behavior: SynthBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SynthBehavior::Speech => Ok(FAKE_SPEECH.to_vec()),
            SynthBehavior::ApiError => Err(ProviderError::Api {
                status: 401,
                message: "invalid_api_key".to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ProbeBehavior {
    Seconds(f64),
    NonNumeric,
    Crash,
}

#[derive(Clone, Copy, Debug)]
pub enum MixBehavior {
    Succeed,
    Fail,
}

/// What the engine observed during a mix call
#[derive(Debug, Clone)]
pub struct SeenMix {
    pub graph: MixGraph,
    pub background: PathBuf,
    pub voice_file_name: String,
    pub voice_bytes: Vec<u8>,
}

pub struct FakeEngine {
    probe: ProbeBehavior,
    mix: MixBehavior,
    pub probe_calls: AtomicUsize,
    pub mix_calls: AtomicUsize,
    pub seen_mix: Mutex<Option<SeenMix>>,
}

impl FakeEngine {
    pub fn new(probe: ProbeBehavior, mix: MixBehavior) -> Arc<Self> {
        Arc::new(Self {
            probe,
            mix,
            probe_calls: AtomicUsize::new(0),
            mix_calls: AtomicUsize::new(0),
            seen_mix: Mutex::new(None),
        })
    }

    pub fn probe_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn mix_count(&self) -> usize {
        self.mix_calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Option<SeenMix> {
        self.seen_mix.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "voice file must exist while probing");
        match self.probe {
            ProbeBehavior::Seconds(seconds) => Ok(seconds),
            ProbeBehavior::NonNumeric => Err(ProbeError::InvalidDuration("N/A".to_string())),
            ProbeBehavior::Crash => Err(ProbeError::Failed {
                exit: "1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            }),
        }
    }

    async fn run_graph(
        &self,
        inputs: &MixInputs,
        graph: &MixGraph,
    ) -> Result<Vec<u8>, MixExecutionError> {
        self.mix_calls.fetch_add(1, Ordering::SeqCst);
        let voice_bytes = std::fs::read(&inputs.voice).expect("voice file readable during mix");
        *self.seen_mix.lock().unwrap() = Some(SeenMix {
            graph: graph.clone(),
            background: inputs.background.clone(),
            voice_file_name: inputs
                .voice
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            voice_bytes,
        });
        match self.mix {
            MixBehavior::Succeed => Ok(FAKE_SPOT.to_vec()),
            MixBehavior::Fail => Err(MixExecutionError::Failed {
                exit: "1".to_string(),
                diagnostics: "Error initializing complex filters.".to_string(),
            }),
        }
    }
}

/// Scratch space for one test: a work dir and a music bed file
pub struct TestDirs {
    _root: TempDir,
    pub work_dir: PathBuf,
    pub bgm: PathBuf,
}

impl TestDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let work_dir = root.path().join("work");
        std::fs::create_dir(&work_dir).unwrap();
        let bgm = root.path().join("bgm.mp3");
        std::fs::write(&bgm, b"ID3-fake-bed").unwrap();
        Self {
            _root: root,
            work_dir,
            bgm,
        }
    }

    pub fn config(&self) -> TomlConfig {
        let mut config = TomlConfig::default();
        config.assets.work_dir = self.work_dir.clone();
        config.assets.background_music = self.bgm.clone();
        config
    }

    /// Number of entries left in the work dir
    pub fn leftovers(&self) -> usize {
        std::fs::read_dir(&self.work_dir).unwrap().count()
    }
}

pub fn renderer(
    dirs: &TestDirs,
    synthesizer: Option<Arc<FakeSynthesizer>>,
    engine: Arc<FakeEngine>,
) -> SpotRenderer {
    let synthesizer = synthesizer.map(|s| s as Arc<dyn SpeechSynthesizer>);
    SpotRenderer::new(synthesizer, engine, &dirs.config())
}
