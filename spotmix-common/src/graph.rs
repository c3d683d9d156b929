//! Declarative mix graph
//!
//! A [`MixGraph`] is an ordered list of [`Stage`]s. Each stage reads one or
//! more labelled streams, runs a chain of [`Filter`]s and writes one labelled
//! stream. Engine inputs (`[0:a]` voice, `[1:a]` music bed) may be read by any
//! number of stages; every intermediate label is written once and read once.
//! The single unread label is the graph's output.
//!
//! The graph is a plain value so its shape can be inspected and tested;
//! [`MixGraph::render`] produces the engine's `-filter_complex` text.

use std::collections::HashSet;
use std::fmt;

use crate::fade_curves::FadeCurve;
use crate::timeline::{BedSegmentKind, SegmentPlan};
use crate::{Error, Result};

/// Engine input index of the synthesized voice
pub const VOICE_INPUT: usize = 0;
/// Engine input index of the looping music bed
pub const BED_INPUT: usize = 1;

/// A stream reference inside the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamLabel {
    /// Audio stream of engine input N
    Input(usize),
    /// Intermediate or output stream
    Named(String),
}

impl StreamLabel {
    pub fn named(name: impl Into<String>) -> Self {
        StreamLabel::Named(name.into())
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamLabel::Input(index) => write!(f, "[{}:a]", index),
            StreamLabel::Named(name) => write!(f, "[{}]", name),
        }
    }
}

/// How long a mixed stream lasts relative to its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixDuration {
    /// Length of the first input
    First,
    Longest,
    Shortest,
}

impl MixDuration {
    fn as_str(&self) -> &'static str {
        match self {
            MixDuration::First => "first",
            MixDuration::Longest => "longest",
            MixDuration::Shortest => "shortest",
        }
    }
}

/// A single processing step
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Change playback speed without changing pitch
    Tempo { factor: f64 },
    /// Keep `[start, end)` of the stream
    Trim { start_seconds: f64, end_seconds: f64 },
    /// Restart timestamps at zero after a trim
    ResetTimestamps,
    /// Linear gain
    Volume { gain: f64 },
    /// Prepend silence on every channel
    Delay { milliseconds: u64 },
    /// Join streams end to end, in input order
    Concat { segments: usize },
    /// Sum streams together
    Mix {
        inputs: usize,
        duration: MixDuration,
        dropout_transition_seconds: f64,
    },
    /// Fade to silence
    FadeOut {
        start_seconds: f64,
        duration_seconds: f64,
        curve: FadeCurve,
    },
}

impl Filter {
    /// Engine filter name
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Tempo { .. } => "atempo",
            Filter::Trim { .. } => "atrim",
            Filter::ResetTimestamps => "asetpts",
            Filter::Volume { .. } => "volume",
            Filter::Delay { .. } => "adelay",
            Filter::Concat { .. } => "concat",
            Filter::Mix { .. } => "amix",
            Filter::FadeOut { .. } => "afade",
        }
    }

    /// Number of input streams the filter expects
    pub fn arity(&self) -> usize {
        match self {
            Filter::Concat { segments } => *segments,
            Filter::Mix { inputs, .. } => *inputs,
            _ => 1,
        }
    }

    /// Engine filter text, e.g. `atrim=1.500:11.500`
    pub fn render(&self) -> String {
        match self {
            Filter::Tempo { factor } => format!("atempo={:.4}", factor),
            Filter::Trim {
                start_seconds,
                end_seconds,
            } => format!("atrim={:.3}:{:.3}", start_seconds, end_seconds),
            Filter::ResetTimestamps => "asetpts=N/SR/TB".to_string(),
            Filter::Volume { gain } => format!("volume={}", gain),
            Filter::Delay { milliseconds } => format!("adelay={0}|{0}", milliseconds),
            Filter::Concat { segments } => format!("concat=n={}:v=0:a=1", segments),
            Filter::Mix {
                inputs,
                duration,
                dropout_transition_seconds,
            } => format!(
                "amix=inputs={}:duration={}:dropout_transition={}",
                inputs,
                duration.as_str(),
                dropout_transition_seconds
            ),
            Filter::FadeOut {
                start_seconds,
                duration_seconds,
                curve,
            } => {
                let mut text = format!("afade=t=out:st={:.3}:d={:.3}", start_seconds, duration_seconds);
                if let Some(name) = curve.engine_curve_name() {
                    text.push_str(":curve=");
                    text.push_str(name);
                }
                text
            }
        }
    }
}

/// What a stage contributes to the spot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    /// Tempo, trim, timestamp reset and gain on the voice
    VoicePrep,
    /// Pre-roll silence in front of the voice
    VoiceDelay,
    /// One cut of the music bed
    BedCut(BedSegmentKind),
    /// Bed cuts joined into one continuous bed
    BedConcat,
    /// Bed and voice summed
    Mix,
    /// Closing fade-out
    FadeOut,
}

/// One filter chain with explicit input and output labels
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub role: StageRole,
    pub inputs: Vec<StreamLabel>,
    pub filters: Vec<Filter>,
    pub output: StreamLabel,
}

impl Stage {
    fn render(&self) -> String {
        let inputs: String = self.inputs.iter().map(ToString::to_string).collect();
        let filters: Vec<String> = self.filters.iter().map(Filter::render).collect();
        format!("{}{}{}", inputs, filters.join(","), self.output)
    }
}

/// Complete mix description for one spot
#[derive(Debug, Clone, PartialEq)]
pub struct MixGraph {
    pub stages: Vec<Stage>,
    /// The graph's single sink, mapped to the encoded output
    pub output: StreamLabel,
    /// Hard limit on the encoded output length
    pub duration_limit_seconds: f64,
}

impl MixGraph {
    /// First stage with the given role
    pub fn stage(&self, role: StageRole) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.role == role)
    }

    /// Engine `-filter_complex` text
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(Stage::render)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Check that the stages form a DAG with exactly one sink
    ///
    /// Stages must be in dependency order: a named label can only be read
    /// after the stage writing it.
    pub fn validate(&self) -> Result<()> {
        let mut produced: HashSet<&StreamLabel> = HashSet::new();
        let mut consumed: HashSet<&StreamLabel> = HashSet::new();

        for stage in &self.stages {
            let first = stage.filters.first().ok_or_else(|| {
                Error::InvalidGraph(format!("stage writing {} has no filters", stage.output))
            })?;
            if first.arity() != stage.inputs.len() {
                return Err(Error::InvalidGraph(format!(
                    "{} expects {} inputs, stage writing {} has {}",
                    first.name(),
                    first.arity(),
                    stage.output,
                    stage.inputs.len()
                )));
            }

            for input in &stage.inputs {
                if let StreamLabel::Named(_) = input {
                    if !produced.contains(input) {
                        return Err(Error::InvalidGraph(format!(
                            "{} is read before it is written",
                            input
                        )));
                    }
                    if !consumed.insert(input) {
                        return Err(Error::InvalidGraph(format!("{} is read twice", input)));
                    }
                }
            }

            if let StreamLabel::Input(_) = stage.output {
                return Err(Error::InvalidGraph(format!(
                    "stage writes to engine input {}",
                    stage.output
                )));
            }
            if !produced.insert(&stage.output) {
                return Err(Error::InvalidGraph(format!(
                    "{} is written twice",
                    stage.output
                )));
            }
        }

        let sinks: Vec<&&StreamLabel> = produced.difference(&consumed).collect();
        match sinks.as_slice() {
            [sink] if **sink == &self.output => Ok(()),
            [sink] => Err(Error::InvalidGraph(format!(
                "sink is {} but output is {}",
                sink, self.output
            ))),
            [] => Err(Error::InvalidGraph("graph has no sink".to_string())),
            many => Err(Error::InvalidGraph(format!(
                "graph has {} sinks",
                many.len()
            ))),
        }
    }
}

/// Build the mix graph for a planned spot
///
/// Stage order: voice prep, voice delay, the three bed cuts, bed concat,
/// mix (duration follows the bed), fade-out. The output is additionally
/// limited to the plan's total length.
pub fn build(plan: &SegmentPlan) -> MixGraph {
    let voice = StreamLabel::named("v");
    let delayed_voice = StreamLabel::named("vdel");
    let full_bed = StreamLabel::named("bgmfull");
    let mixed = StreamLabel::named("m");
    let out = StreamLabel::named("out");

    let mut stages = Vec::with_capacity(8);

    let mut voice_filters = Vec::with_capacity(4);
    if plan.voice_tempo != 1.0 {
        voice_filters.push(Filter::Tempo {
            factor: plan.voice_tempo,
        });
    }
    voice_filters.push(Filter::Trim {
        start_seconds: 0.0,
        end_seconds: plan.voice_trim_seconds,
    });
    voice_filters.push(Filter::ResetTimestamps);
    voice_filters.push(Filter::Volume {
        gain: plan.voice_volume,
    });
    stages.push(Stage {
        role: StageRole::VoicePrep,
        inputs: vec![StreamLabel::Input(VOICE_INPUT)],
        filters: voice_filters,
        output: voice.clone(),
    });

    stages.push(Stage {
        role: StageRole::VoiceDelay,
        inputs: vec![voice],
        filters: vec![Filter::Delay {
            milliseconds: (plan.voice_delay_seconds * 1000.0).round() as u64,
        }],
        output: delayed_voice.clone(),
    });

    let mut cuts = Vec::with_capacity(plan.bed.len());
    for segment in &plan.bed {
        let label = StreamLabel::named(segment.kind.label());
        stages.push(Stage {
            role: StageRole::BedCut(segment.kind),
            inputs: vec![StreamLabel::Input(BED_INPUT)],
            filters: vec![
                Filter::Trim {
                    start_seconds: segment.start_seconds,
                    end_seconds: segment.end_seconds,
                },
                Filter::ResetTimestamps,
                Filter::Volume {
                    gain: segment.volume,
                },
            ],
            output: label.clone(),
        });
        cuts.push(label);
    }

    stages.push(Stage {
        role: StageRole::BedConcat,
        filters: vec![Filter::Concat {
            segments: cuts.len(),
        }],
        inputs: cuts,
        output: full_bed.clone(),
    });

    stages.push(Stage {
        role: StageRole::Mix,
        inputs: vec![full_bed, delayed_voice],
        filters: vec![Filter::Mix {
            inputs: 2,
            duration: MixDuration::First,
            dropout_transition_seconds: 0.0,
        }],
        output: mixed.clone(),
    });

    stages.push(Stage {
        role: StageRole::FadeOut,
        inputs: vec![mixed],
        filters: vec![Filter::FadeOut {
            start_seconds: plan.fade_out_start_seconds,
            duration_seconds: plan.fade_out_duration_seconds,
            curve: plan.fade_out_curve,
        }],
        output: out.clone(),
    });

    MixGraph {
        stages,
        output: out,
        duration_limit_seconds: plan.total_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{plan, LengthPolicy, TimelineConfig};

    fn graph_for(voice_seconds: f64, config: &TimelineConfig) -> MixGraph {
        build(&plan(voice_seconds, config))
    }

    #[test]
    fn test_renders_reference_graph() {
        let graph = graph_for(10.0, &TimelineConfig::default());
        let expected = concat!(
            "[0:a]atrim=0.000:10.000,asetpts=N/SR/TB,volume=0.8[v];",
            "[v]adelay=1500|1500[vdel];",
            "[1:a]atrim=0.000:1.500,asetpts=N/SR/TB,volume=0.55[bpre];",
            "[1:a]atrim=1.500:11.500,asetpts=N/SR/TB,volume=0.8[bdur];",
            "[1:a]atrim=11.500:13.000,asetpts=N/SR/TB,volume=0.55[bpost];",
            "[bpre][bdur][bpost]concat=n=3:v=0:a=1[bgmfull];",
            "[bgmfull][vdel]amix=inputs=2:duration=first:dropout_transition=0[m];",
            "[m]afade=t=out:st=11.500:d=1.500[out]",
        );
        assert_eq!(graph.render(), expected);
        assert_eq!(graph.duration_limit_seconds, 13.0);
    }

    #[test]
    fn test_stage_order_is_fixed() {
        let graph = graph_for(10.0, &TimelineConfig::default());
        let roles: Vec<StageRole> = graph.stages.iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![
                StageRole::VoicePrep,
                StageRole::VoiceDelay,
                StageRole::BedCut(BedSegmentKind::PreRoll),
                StageRole::BedCut(BedSegmentKind::During),
                StageRole::BedCut(BedSegmentKind::PostRoll),
                StageRole::BedConcat,
                StageRole::Mix,
                StageRole::FadeOut,
            ]
        );
    }

    #[test]
    fn test_built_graph_is_valid() {
        for voice in [0.05, 3.0, 10.0, 22.0, 30.0, 120.0] {
            let graph = graph_for(voice, &TimelineConfig::default());
            graph.validate().unwrap();
            assert_eq!(graph.output, StreamLabel::named("out"));
        }
    }

    #[test]
    fn test_mix_duration_follows_bed() {
        let graph = graph_for(10.0, &TimelineConfig::default());
        let mix = graph.stage(StageRole::Mix).unwrap();
        assert_eq!(mix.inputs[0], StreamLabel::named("bgmfull"));
        assert!(matches!(
            mix.filters[0],
            Filter::Mix {
                duration: MixDuration::First,
                ..
            }
        ));
    }

    #[test]
    fn test_capped_voice_is_trimmed() {
        let graph = graph_for(30.0, &TimelineConfig::default());
        let prep = graph.stage(StageRole::VoicePrep).unwrap();
        assert_eq!(
            prep.filters[0],
            Filter::Trim {
                start_seconds: 0.0,
                end_seconds: 22.0
            }
        );
        assert_eq!(graph.duration_limit_seconds, 25.0);
    }

    #[test]
    fn test_tempo_stage_only_when_compressing() {
        let plain = graph_for(30.0, &TimelineConfig::default());
        let prep = plain.stage(StageRole::VoicePrep).unwrap();
        assert!(prep.filters.iter().all(|f| f.name() != "atempo"));

        let config = TimelineConfig {
            length_policy: LengthPolicy::Compress { max_tempo: 1.25 },
            ..TimelineConfig::default()
        };
        let compressed = graph_for(24.2, &config);
        let prep = compressed.stage(StageRole::VoicePrep).unwrap();
        assert_eq!(prep.filters[0].name(), "atempo");
        assert_eq!(prep.filters[1].name(), "atrim");
        assert!(compressed.render().starts_with("[0:a]atempo=1.1000,atrim="));
    }

    #[test]
    fn test_fade_curve_rendered_when_not_linear() {
        let config = TimelineConfig {
            fade_out_curve: FadeCurve::SCurve,
            ..TimelineConfig::default()
        };
        let graph = graph_for(10.0, &config);
        assert!(graph
            .render()
            .ends_with("[m]afade=t=out:st=11.500:d=1.500:curve=hsin[out]"));
    }

    #[test]
    fn test_validate_rejects_unknown_label() {
        let mut graph = graph_for(10.0, &TimelineConfig::default());
        graph.stages[1].inputs = vec![StreamLabel::named("ghost")];
        assert!(matches!(graph.validate(), Err(Error::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_rejects_second_sink() {
        let mut graph = graph_for(10.0, &TimelineConfig::default());
        graph.stages.push(Stage {
            role: StageRole::BedCut(BedSegmentKind::PostRoll),
            inputs: vec![StreamLabel::Input(BED_INPUT)],
            filters: vec![Filter::Volume { gain: 1.0 }],
            output: StreamLabel::named("extra"),
        });
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_label_read_twice() {
        let mut graph = graph_for(10.0, &TimelineConfig::default());
        let mix = graph
            .stages
            .iter_mut()
            .find(|s| s.role == StageRole::Mix)
            .unwrap();
        mix.inputs[1] = StreamLabel::named("bgmfull");
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_arity_mismatch() {
        let mut graph = graph_for(10.0, &TimelineConfig::default());
        let concat = graph
            .stages
            .iter_mut()
            .find(|s| s.role == StageRole::BedConcat)
            .unwrap();
        concat.inputs.pop();
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_output() {
        let mut graph = graph_for(10.0, &TimelineConfig::default());
        graph.output = StreamLabel::named("m");
        assert!(graph.validate().is_err());
    }
}
