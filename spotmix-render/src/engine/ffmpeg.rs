//! ffprobe/ffmpeg implementation of [`AudioEngine`]

use async_trait::async_trait;
use spotmix_common::config::{EngineConfig, OutputConfig};
use spotmix_common::MixGraph;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{
    AudioEngine, CommandRunner, MixExecutionError, MixInputs, ProbeError, TokioCommandRunner,
};

/// Engine adapter invoking ffprobe for durations and ffmpeg for mixes
pub struct FfmpegEngine<R = TokioCommandRunner> {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    output: OutputConfig,
    runner: R,
}

impl FfmpegEngine<TokioCommandRunner> {
    pub fn new(engine: &EngineConfig, output: OutputConfig) -> Self {
        Self::with_runner(engine, output, TokioCommandRunner)
    }
}

impl<R: CommandRunner> FfmpegEngine<R> {
    pub fn with_runner(engine: &EngineConfig, output: OutputConfig, runner: R) -> Self {
        Self {
            ffmpeg: engine.ffmpeg.clone(),
            ffprobe: engine.ffprobe.clone(),
            output,
            runner,
        }
    }

    /// Where the encoded spot is written inside the scratch directory
    pub fn output_path(&self, scratch_dir: &Path) -> PathBuf {
        scratch_dir.join(format!("spot.{}", self.output.extension))
    }

    /// Arguments for a mix run
    ///
    /// Input 0 is the voice, input 1 the music bed looped indefinitely; the
    /// graph's output is capped at its duration limit.
    pub fn mix_args(&self, inputs: &MixInputs, graph: &MixGraph, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
            .iter()
            .map(OsString::from)
            .collect();

        args.push("-i".into());
        args.push(inputs.voice.clone().into_os_string());
        args.push("-stream_loop".into());
        args.push("-1".into());
        args.push("-i".into());
        args.push(inputs.background.clone().into_os_string());

        args.push("-filter_complex".into());
        args.push(graph.render().into());
        args.push("-map".into());
        args.push(graph.output.to_string().into());
        args.push("-t".into());
        args.push(format!("{:.3}", graph.duration_limit_seconds).into());
        args.push("-c:a".into());
        args.push(self.output.codec.clone().into());
        args.push("-b:a".into());
        args.push(self.output.bitrate.clone().into());
        args.push(output.as_os_str().to_os_string());
        args
    }
}

/// Arguments for a duration probe, printing only the container duration
pub fn probe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(path.as_os_str().to_os_string());
    args
}

/// Parse probe stdout into seconds
///
/// Anything other than a single positive finite number is rejected; the
/// probe prints `N/A` or nothing for corrupt and empty files.
pub fn parse_duration(stdout: &str) -> Result<f64, ProbeError> {
    let trimmed = stdout.trim();
    match trimmed.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(ProbeError::InvalidDuration(trimmed.to_string())),
    }
}

async fn discard_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial mix output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove partial mix output: {}", e),
    }
}

#[async_trait]
impl<R: CommandRunner> AudioEngine for FfmpegEngine<R> {
    async fn probe_duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = self
            .runner
            .run(&self.ffprobe, &probe_args(path))
            .await
            .map_err(|source| ProbeError::Spawn {
                program: self.ffprobe.display().to_string(),
                source,
            })?;

        if !output.success {
            return Err(ProbeError::Failed {
                exit: output.exit_label(),
                stderr: output.stderr_lossy().trim().to_string(),
            });
        }

        let seconds = parse_duration(&output.stdout_lossy())?;
        debug!(path = %path.display(), seconds, "Probed duration");
        Ok(seconds)
    }

    async fn run_graph(
        &self,
        inputs: &MixInputs,
        graph: &MixGraph,
    ) -> Result<Vec<u8>, MixExecutionError> {
        graph.validate()?;

        let output_path = self.output_path(&inputs.scratch_dir);
        let args = self.mix_args(inputs, graph, &output_path);

        let result = self.runner.run(&self.ffmpeg, &args).await;
        let output = match result {
            Ok(output) => output,
            Err(source) => {
                discard_partial_output(&output_path).await;
                return Err(MixExecutionError::Spawn {
                    program: self.ffmpeg.display().to_string(),
                    source,
                });
            }
        };

        if !output.success {
            discard_partial_output(&output_path).await;
            return Err(MixExecutionError::Failed {
                exit: output.exit_label(),
                diagnostics: output.stderr_lossy().trim().to_string(),
            });
        }

        let bytes = tokio::fs::read(&output_path)
            .await
            .map_err(MixExecutionError::Output)?;
        discard_partial_output(&output_path).await;

        if bytes.is_empty() {
            return Err(MixExecutionError::EmptyOutput);
        }

        debug!(bytes = bytes.len(), "Mix finished");
        Ok(bytes)
    }
}
