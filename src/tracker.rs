//! Association Engine: frame-to-frame greedy association of detections
//! into tracks.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::matching::{claim_nearest, distance_matrix};
use crate::track::TrackSession;
use crate::{Detection, Error, Result, TrackRow};

/// Configuration for the Association Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Maximum distance for a valid match, in the same units as the
    /// detection coordinates. The comparison is strict (`distance <
    /// threshold`).
    pub distance_threshold: f64,
}

impl TrackerConfig {
    pub fn new(distance_threshold: f64) -> Self {
        Self { distance_threshold }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { distance_threshold: 30.0 }
    }
}

/// Greedy nearest-neighbor tracker with strict temporal continuity.
///
/// Association is a single pass over frames in increasing order. A track is
/// eligible for a frame only if it was matched in the immediately preceding
/// frame; missing one frame retires it permanently. Within a frame, tracks
/// claim detections in creation order, each taking its nearest unclaimed
/// detection below the distance threshold.
pub struct Tracker {
    config: TrackerConfig,
}

impl Tracker {
    /// Create a new tracker, validating the configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        if !config.distance_threshold.is_finite() || config.distance_threshold <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "distance_threshold must be finite and positive, got {}",
                config.distance_threshold
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Associate detections into identity-labeled rows.
    ///
    /// Input may arrive in any order; a working copy is sorted by frame
    /// (stably, so within-frame detection order is preserved). Track
    /// bookkeeping is internal to the call and discarded; only the rows
    /// are returned. Running twice on identical input yields identical
    /// output.
    ///
    /// Empty input produces empty output, not an error.
    pub fn run(&self, detections: &[Detection]) -> Result<Vec<TrackRow>> {
        for detection in detections {
            detection.validate()?;
        }

        let mut ordered: Vec<&Detection> = detections.iter().collect();
        ordered.sort_by_key(|d| d.frame);

        let mut session = TrackSession::new();
        let mut rows = Vec::with_capacity(detections.len());

        let mut start = 0;
        while start < ordered.len() {
            let frame = ordered[start].frame;
            let end = ordered[start..]
                .iter()
                .position(|d| d.frame != frame)
                .map_or(ordered.len(), |n| start + n);

            self.process_frame(&mut session, frame, &ordered[start..end], &mut rows);
            session.lock_stale(frame);

            start = end;
        }

        debug!(
            detections = detections.len(),
            tracks = session.tracks().len(),
            rows = rows.len(),
            "association complete"
        );
        Ok(rows)
    }

    fn process_frame(
        &self,
        session: &mut TrackSession,
        frame: i64,
        detections: &[&Detection],
        rows: &mut Vec<TrackRow>,
    ) {
        let eligible = session.eligible_indices(frame);
        let mut assigned = vec![false; detections.len()];

        if !eligible.is_empty() && !detections.is_empty() {
            let track_centers: Vec<Point2<f64>> = eligible
                .iter()
                .map(|&i| session.tracks()[i].center)
                .collect();
            let detection_centers: Vec<Point2<f64>> =
                detections.iter().map(|d| d.center()).collect();

            let distances = distance_matrix(&track_centers, &detection_centers);
            let matches = claim_nearest(&distances, self.config.distance_threshold);

            for (slot, matched) in eligible.iter().zip(matches.iter()) {
                if let Some(det_idx) = matched {
                    let track = &mut session.tracks_mut()[*slot];
                    track.extend(detections[*det_idx].clone());
                    rows.push(TrackRow::from_detection(detections[*det_idx], track.id));
                    assigned[*det_idx] = true;
                }
            }
        }

        for (idx, detection) in detections.iter().enumerate() {
            if !assigned[idx] {
                let id = session.spawn((*detection).clone());
                trace!(frame, track_id = id, "spawned track");
                rows.push(TrackRow::from_detection(detection, id));
            }
        }
    }
}
