//! Planner properties and reference scenarios
//!
//! Tests cover:
//! - Total length never exceeds the cap, voice segment never below 0.1s
//! - Bed cuts always add up to the total length
//! - No truncation while the spot fits under the cap
//! - Fade-out ends exactly at the end of the spot
//! - Reference scenarios for a 10s and a 30s voice clip

use spotmix_common::graph::{self, StageRole};
use spotmix_common::timeline::{plan, BedSegmentKind, TimelineConfig, MIN_VOICE_SECONDS};

const TOLERANCE: f64 = 1e-9;

fn sample_configs() -> Vec<TimelineConfig> {
    vec![
        TimelineConfig::default(),
        TimelineConfig {
            pre_roll_seconds: 0.0,
            post_roll_seconds: 0.0,
            max_total_seconds: 10.0,
            ..TimelineConfig::default()
        },
        TimelineConfig {
            pre_roll_seconds: 3.0,
            post_roll_seconds: 4.5,
            max_total_seconds: 15.0,
            ..TimelineConfig::default()
        },
        TimelineConfig {
            pre_roll_seconds: 2.0,
            post_roll_seconds: 2.5,
            max_total_seconds: 5.0,
            ..TimelineConfig::default()
        },
    ]
}

fn sample_durations() -> Vec<f64> {
    vec![0.01, 0.1, 0.5, 1.0, 3.333, 7.25, 10.0, 19.99, 22.0, 22.001, 30.0, 95.5, 600.0]
}

#[test]
fn test_total_capped_and_voice_never_degenerate() {
    for config in sample_configs() {
        config.validate().unwrap();
        for voice in sample_durations() {
            let plan = plan(voice, &config);
            assert!(
                plan.total_seconds <= config.max_total_seconds + TOLERANCE,
                "voice {} gave total {} over cap {}",
                voice,
                plan.total_seconds,
                config.max_total_seconds
            );
            assert!(plan.voice_trim_seconds >= MIN_VOICE_SECONDS);
        }
    }
}

#[test]
fn test_bed_cuts_sum_to_total() {
    for config in sample_configs() {
        for voice in sample_durations() {
            let plan = plan(voice, &config);
            assert!(
                (plan.bed_seconds() - plan.total_seconds).abs() < TOLERANCE,
                "bed {} != total {} (voice {})",
                plan.bed_seconds(),
                plan.total_seconds,
                voice
            );
            assert_eq!(plan.bed[0].start_seconds, 0.0);
            assert_eq!(plan.bed[0].end_seconds, plan.bed[1].start_seconds);
            assert_eq!(plan.bed[1].end_seconds, plan.bed[2].start_seconds);
        }
    }
}

#[test]
fn test_voice_never_outlasts_spot() {
    for config in sample_configs() {
        for voice in sample_durations() {
            let plan = plan(voice, &config);
            assert!(plan.voice_end_seconds() <= plan.total_seconds + TOLERANCE);
        }
    }
}

#[test]
fn test_no_truncation_under_cap() {
    for config in sample_configs() {
        for voice in sample_durations() {
            let fits = config.pre_roll_seconds + voice + config.post_roll_seconds
                <= config.max_total_seconds;
            if fits && voice >= MIN_VOICE_SECONDS {
                let plan = plan(voice, &config);
                assert_eq!(plan.voice_trim_seconds, voice);
                assert!(!plan.is_speech_truncated());
            }
        }
    }
}

#[test]
fn test_fade_out_ends_at_total() {
    for config in sample_configs() {
        for voice in sample_durations() {
            let plan = plan(voice, &config);
            if plan.total_seconds >= config.post_roll_seconds {
                let end = plan.fade_out_start_seconds + plan.fade_out_duration_seconds;
                assert!((end - plan.total_seconds).abs() < TOLERANCE);
            }
        }
    }
}

#[test]
fn test_bookends_keep_their_length_when_capped() {
    let config = TimelineConfig::default();
    let plan = plan(300.0, &config);
    assert!((plan.bed[0].duration_seconds() - 1.5).abs() < TOLERANCE);
    assert!((plan.bed[2].duration_seconds() - 1.5).abs() < TOLERANCE);
}

#[test]
fn test_scenario_ten_second_voice() {
    let plan = plan(10.0, &TimelineConfig::default());
    assert!((plan.total_seconds - 13.0).abs() < TOLERANCE);
    assert!((plan.voice_trim_seconds - 10.0).abs() < TOLERANCE);
    assert!((plan.fade_out_start_seconds - 11.5).abs() < TOLERANCE);
    assert_eq!(plan.bed[1].kind, BedSegmentKind::During);
    assert!((plan.bed[1].end_seconds - 11.5).abs() < TOLERANCE);
}

#[test]
fn test_scenario_thirty_second_voice() {
    let plan = plan(30.0, &TimelineConfig::default());
    assert!((plan.total_seconds - 25.0).abs() < TOLERANCE);
    assert!((plan.voice_trim_seconds - 22.0).abs() < TOLERANCE);
    assert!((plan.fade_out_start_seconds - 23.5).abs() < TOLERANCE);
}

#[test]
fn test_graph_limit_matches_plan() {
    for voice in sample_durations() {
        let plan = plan(voice, &TimelineConfig::default());
        let graph = graph::build(&plan);
        graph.validate().unwrap();
        assert_eq!(graph.duration_limit_seconds, plan.total_seconds);
        assert!(graph.stage(StageRole::FadeOut).is_some());
    }
}
