//! # motility-rs - Trajectory Analysis for Motile Objects
//!
//! Offline batch pipeline that turns per-frame object detections into
//! persistent trajectories and per-trajectory motion statistics.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. **Association**: greedy nearest-neighbor matching of detections to
//!    tracks under strict frame-to-frame continuity ([`Tracker`])
//! 2. **Repair**: angle-based truncation of tracks corrupted by identity
//!    switches ([`repair_tracks`])
//! 3. **Analytics**: per-track velocity, speed category and straightness
//!    summaries with per-category aggregates ([`summarize_tracks`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use motility_rs::{Detection, MotilityPipeline};
//!
//! let detections = vec![
//!     Detection::new(0, 10.0, 10.0, 20.0, 20.0)?,
//!     Detection::new(1, 12.0, 10.0, 22.0, 20.0)?,
//!     Detection::new(2, 14.0, 10.0, 24.0, 20.0)?,
//! ];
//!
//! let pipeline = MotilityPipeline::default();
//! let report = pipeline.process(&detections, "sample_video")?;
//! ```

// Public modules
pub mod analytics;
pub mod detection;
pub mod matching;
pub mod pipeline;
pub mod repair;
pub mod track;
pub mod tracker;
pub mod utils;

// Re-exports for convenience
pub use analytics::{
    summarize_tracks, AnalyticsConfig, CategoryAggregate, MotilityReport, SpeedCategory,
    StepVelocity, TrackPoint, TrajectorySummary,
};
pub use detection::{Detection, TrackRow};
pub use pipeline::MotilityPipeline;
pub use repair::{repair_tracks, CleanTrack, RepairConfig};
pub use track::{Track, TrackSession, TrackState};
pub use tracker::{Tracker, TrackerConfig};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in the motility pipeline
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid record: {0}")]
        InvalidRecord(String),

        /// The repair filter discarded every track. Distinct from an
        /// empty-but-valid result on empty input.
        #[error("no valid tracks remain after filtering")]
        NoValidTracks,
    }

    /// Result type for motility operations
    pub type Result<T> = std::result::Result<T, Error>;
}
