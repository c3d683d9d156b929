//! Timeline planning for a spot
//!
//! Turns a measured voice-clip duration and the static [`TimelineConfig`]
//! into a [`SegmentPlan`]: where the music bed is split, how loud each part
//! is, when the voice starts, and how long the finished clip runs.
//!
//! Layout of a planned spot:
//!
//! ```text
//! 0        pre                    pre+trim            total
//! |-- bed --|-------- bed ---------|-------- bed --------|
//! | pre vol |   during vol (duck)  |  pre/post vol, fade |
//!           |====== voice =========|
//! ```
//!
//! The cap on the total length is applied first and the voice slot is derived
//! backward from it, so pre-roll and post-roll never shrink.

use serde::Deserialize;

use crate::fade_curves::FadeCurve;
use crate::{Error, Result};

/// Shortest voice segment a plan will ever contain, in seconds
pub const MIN_VOICE_SECONDS: f64 = 0.1;

/// Upper bound accepted for `LengthPolicy::Compress::max_tempo`
pub const MAX_COMPRESS_TEMPO: f64 = 2.0;

fn default_max_tempo() -> f64 {
    1.25
}

/// What to do when speech does not fit between the bookends
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Cap the total length and cut the speech at the end of its slot
    #[default]
    Truncate,
    /// Speed the speech up (at most `max_tempo`) before cutting what remains
    Compress {
        #[serde(default = "default_max_tempo")]
        max_tempo: f64,
    },
    /// Ignore the cap and let the spot grow to fit the speech
    Extend,
}

/// Static timing and level configuration for every spot
///
/// Volumes are linear multipliers. Durations are seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Music-only intro before the voice starts
    pub pre_roll_seconds: f64,
    /// Music-only outro after the voice, faded out
    pub post_roll_seconds: f64,
    /// Cap on the finished clip length
    pub max_total_seconds: f64,
    /// Bed level during pre-roll and post-roll
    pub bgm_pre_post_volume: f64,
    /// Bed level while the voice is speaking (ducked)
    pub bgm_during_volume: f64,
    /// Voice track gain
    pub voice_volume: f64,
    /// Shape of the closing fade-out
    pub fade_out_curve: FadeCurve,
    /// Handling of speech longer than its slot
    pub length_policy: LengthPolicy,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            pre_roll_seconds: 1.5,
            post_roll_seconds: 1.5,
            max_total_seconds: 25.0,
            bgm_pre_post_volume: 0.55,
            bgm_during_volume: 0.80,
            voice_volume: 0.80,
            fade_out_curve: FadeCurve::Linear,
            length_policy: LengthPolicy::Truncate,
        }
    }
}

impl TimelineConfig {
    /// Check the configuration invariants
    ///
    /// - every duration and volume is finite and non-negative
    /// - `pre + post + MIN_VOICE_SECONDS <= max_total`, so a capped plan
    ///   always has room for its minimum voice segment
    /// - a compress policy tempo lies in `(1.0, MAX_COMPRESS_TEMPO]`
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("pre_roll_seconds", self.pre_roll_seconds),
            ("post_roll_seconds", self.post_roll_seconds),
            ("max_total_seconds", self.max_total_seconds),
            ("bgm_pre_post_volume", self.bgm_pre_post_volume),
            ("bgm_during_volume", self.bgm_during_volume),
            ("voice_volume", self.voice_volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidTimeline(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let bookends = self.pre_roll_seconds + self.post_roll_seconds;
        if bookends + MIN_VOICE_SECONDS > self.max_total_seconds {
            return Err(Error::InvalidTimeline(format!(
                "pre-roll + post-roll ({:.3}s) leaves no room for voice within {:.3}s",
                bookends, self.max_total_seconds
            )));
        }

        if let LengthPolicy::Compress { max_tempo } = self.length_policy {
            if !(max_tempo > 1.0 && max_tempo <= MAX_COMPRESS_TEMPO) {
                return Err(Error::InvalidTimeline(format!(
                    "compress max_tempo must be in (1.0, {}], got {}",
                    MAX_COMPRESS_TEMPO, max_tempo
                )));
            }
        }

        Ok(())
    }

    /// Longest voice segment that fits under the cap
    pub fn voice_slot_seconds(&self) -> f64 {
        (self.max_total_seconds - self.pre_roll_seconds - self.post_roll_seconds)
            .max(MIN_VOICE_SECONDS)
    }
}

/// Which part of the music bed a segment covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedSegmentKind {
    PreRoll,
    During,
    PostRoll,
}

impl BedSegmentKind {
    /// Short stream label used in the mix graph
    pub fn label(&self) -> &'static str {
        match self {
            BedSegmentKind::PreRoll => "bpre",
            BedSegmentKind::During => "bdur",
            BedSegmentKind::PostRoll => "bpost",
        }
    }
}

/// One cut of the looping music bed, `[start, end)` on the bed timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedSegment {
    pub kind: BedSegmentKind,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub volume: f64,
}

impl BedSegment {
    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Derived timing for one spot
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    /// Finished clip length
    pub total_seconds: f64,
    /// Voice duration actually used, on the output timeline
    pub voice_trim_seconds: f64,
    /// Playback speed applied to the voice before trimming (1.0 = unchanged)
    pub voice_tempo: f64,
    /// Voice gain
    pub voice_volume: f64,
    /// Silence prepended to the voice track
    pub voice_delay_seconds: f64,
    /// Pre-roll, during and post-roll bed cuts, in playback order
    pub bed: [BedSegment; 3],
    pub fade_out_start_seconds: f64,
    pub fade_out_duration_seconds: f64,
    pub fade_out_curve: FadeCurve,
    /// Source speech that will not be heard, in seconds of the original clip
    pub truncated_speech_seconds: f64,
}

impl SegmentPlan {
    /// Where the delayed voice track ends on the output timeline
    pub fn voice_end_seconds(&self) -> f64 {
        self.voice_delay_seconds + self.voice_trim_seconds
    }

    /// Sum of the three bed cut durations
    pub fn bed_seconds(&self) -> f64 {
        self.bed.iter().map(BedSegment::duration_seconds).sum()
    }

    pub fn is_speech_truncated(&self) -> bool {
        self.truncated_speech_seconds > 0.0
    }
}

/// Plan a spot around a voice clip of `voice_duration_seconds`
///
/// The duration must be positive and finite; callers reject anything else
/// before planning (the prober never produces such a value).
pub fn plan(voice_duration_seconds: f64, config: &TimelineConfig) -> SegmentPlan {
    debug_assert!(
        voice_duration_seconds.is_finite() && voice_duration_seconds > 0.0,
        "voice duration must be positive, got {}",
        voice_duration_seconds
    );

    let pre = config.pre_roll_seconds;
    let post = config.post_roll_seconds;
    let voice = voice_duration_seconds.max(MIN_VOICE_SECONDS);
    let slot = config.voice_slot_seconds();

    let (voice_trim, voice_tempo) = match config.length_policy {
        LengthPolicy::Extend => (voice, 1.0),
        LengthPolicy::Truncate => (voice.min(slot), 1.0),
        LengthPolicy::Compress { max_tempo } => {
            if voice <= slot {
                (voice, 1.0)
            } else {
                (slot, (voice / slot).min(max_tempo))
            }
        }
    };

    let total = match config.length_policy {
        LengthPolicy::Extend => pre + voice_trim + post,
        _ => (pre + voice_trim + post).min(config.max_total_seconds),
    };

    let during_end = pre + voice_trim;
    let bed = [
        BedSegment {
            kind: BedSegmentKind::PreRoll,
            start_seconds: 0.0,
            end_seconds: pre,
            volume: config.bgm_pre_post_volume,
        },
        BedSegment {
            kind: BedSegmentKind::During,
            start_seconds: pre,
            end_seconds: during_end,
            volume: config.bgm_during_volume,
        },
        BedSegment {
            kind: BedSegmentKind::PostRoll,
            start_seconds: during_end,
            end_seconds: total,
            volume: config.bgm_pre_post_volume,
        },
    ];

    let heard_source = voice_trim * voice_tempo;
    let truncated = (voice_duration_seconds - heard_source).max(0.0);

    SegmentPlan {
        total_seconds: total,
        voice_trim_seconds: voice_trim,
        voice_tempo,
        voice_volume: config.voice_volume,
        voice_delay_seconds: pre,
        bed,
        fade_out_start_seconds: (total - post).max(0.0),
        fade_out_duration_seconds: post,
        fade_out_curve: config.fade_out_curve,
        truncated_speech_seconds: truncated,
    }
}
