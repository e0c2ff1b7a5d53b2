//! Three-stage convenience pipeline: associate, repair, summarize.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::{points_from_clean_tracks, summarize_tracks, AnalyticsConfig};
use crate::repair::{repair_tracks, RepairConfig};
use crate::tracker::{Tracker, TrackerConfig};
use crate::{Detection, MotilityReport, Result};

/// Bundled configuration for a full detection-to-report run.
///
/// Each stage remains callable on its own; this type only sequences them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotilityPipeline {
    pub tracker: TrackerConfig,
    pub repair: RepairConfig,
    pub analytics: AnalyticsConfig,
}

impl MotilityPipeline {
    pub fn new(tracker: TrackerConfig, repair: RepairConfig, analytics: AnalyticsConfig) -> Self {
        Self { tracker, repair, analytics }
    }

    /// Run the full pipeline over one recording's detections.
    ///
    /// `source_label` identifies the originating recording in the report
    /// rows. Propagates [`crate::Error::NoValidTracks`] when the repair
    /// stage discards every track.
    pub fn process(&self, detections: &[Detection], source_label: &str) -> Result<MotilityReport> {
        let rows = Tracker::new(self.tracker.clone())?.run(detections)?;
        debug!(rows = rows.len(), source = source_label, "association stage done");

        let cleaned = repair_tracks(&rows, &self.repair)?;
        debug!(tracks = cleaned.len(), source = source_label, "repair stage done");

        let points = points_from_clean_tracks(&cleaned);
        summarize_tracks(&points, source_label, &self.analytics)
    }
}
