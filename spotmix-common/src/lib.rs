//! # spotmix Common Library
//!
//! Shared code for the spotmix render service:
//! - Bootstrap configuration loading
//! - Timeline configuration and the segment planner
//! - Fade curve definitions
//! - The declarative mix graph and its builder
//!
//! Everything in this crate is pure: no process spawning, no network.

pub mod config;
pub mod error;
pub mod fade_curves;
pub mod graph;
pub mod timeline;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use graph::MixGraph;
pub use timeline::{LengthPolicy, SegmentPlan, TimelineConfig};
