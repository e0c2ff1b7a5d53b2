//! Track Repair Filter: excises identity switches visible as implausible
//! direction reversals.
//!
//! Greedy association can silently jump a track onto a nearby unrelated
//! object. The switch shows up geometrically as an abrupt turn, so the
//! filter truncates each track at the first turning angle above the
//! threshold and drops tracks left too short to be useful.

use std::collections::BTreeMap;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, TrackRow};

/// Guard against division by zero for near-stationary steps.
const DISPLACEMENT_EPSILON: f64 = 1e-6;

/// Configuration for the Track Repair Filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Turning angle (degrees) above which a track is truncated.
    pub angle_threshold_degrees: f64,

    /// Minimum surviving length, in points; shorter tracks are dropped.
    pub min_frames: usize,
}

impl RepairConfig {
    pub fn new(angle_threshold_degrees: f64, min_frames: usize) -> Self {
        Self { angle_threshold_degrees, min_frames }
    }

    fn validate(&self) -> Result<()> {
        if !(self.angle_threshold_degrees > 0.0 && self.angle_threshold_degrees <= 180.0) {
            return Err(Error::InvalidConfig(format!(
                "angle_threshold_degrees must be in (0, 180], got {}",
                self.angle_threshold_degrees
            )));
        }
        if self.min_frames < 2 {
            return Err(Error::InvalidConfig(format!(
                "min_frames must be at least 2, got {}",
                self.min_frames
            )));
        }
        Ok(())
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self { angle_threshold_degrees: 120.0, min_frames: 3 }
    }
}

/// A structurally-cleaned track: its surviving rows in frame order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanTrack {
    pub track_id: u32,
    pub rows: Vec<TrackRow>,
}

impl CleanTrack {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Repair raw tracks by truncating at the first implausible turn.
///
/// Rows are grouped by `track_id` (ascending) and sorted by frame. A track
/// shorter than `min_frames` is dropped before any angle work; a surviving
/// track shorter than `min_frames` after truncation is dropped too.
///
/// Empty input returns an empty, valid result. A non-empty input whose
/// tracks are all dropped returns [`Error::NoValidTracks`] so the caller
/// can distinguish "nothing survived" from "nothing to do".
pub fn repair_tracks(rows: &[TrackRow], config: &RepairConfig) -> Result<Vec<CleanTrack>> {
    config.validate()?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut grouped: BTreeMap<u32, Vec<TrackRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.track_id).or_default().push(row.clone());
    }

    let mut survivors = Vec::new();
    for (track_id, mut group) in grouped {
        group.sort_by_key(|r| r.frame);

        if group.len() < config.min_frames {
            continue;
        }

        let keep = cut_at_sharp_turn(&group, config.angle_threshold_degrees);
        if keep < group.len() {
            debug!(track_id, kept = keep, original = group.len(), "truncated track");
            group.truncate(keep);
        }

        if group.len() >= config.min_frames {
            survivors.push(CleanTrack { track_id, rows: group });
        }
    }

    if survivors.is_empty() {
        return Err(Error::NoValidTracks);
    }
    Ok(survivors)
}

/// Number of leading points to keep: everything up to and including the
/// vertex of the first sharp turn, or the full length if no turning angle
/// exceeds the threshold.
fn cut_at_sharp_turn(rows: &[TrackRow], angle_threshold_degrees: f64) -> usize {
    let units: Vec<Vector2<f64>> = rows
        .windows(2)
        .map(|pair| {
            let delta = pair[1].center() - pair[0].center();
            delta / (delta.norm() + DISPLACEMENT_EPSILON)
        })
        .collect();

    for i in 0..units.len().saturating_sub(1) {
        let dot = units[i].dot(&units[i + 1]).clamp(-1.0, 1.0);
        let angle = dot.acos().to_degrees();
        if angle > angle_threshold_degrees {
            // Angle i compares the displacements into and out of point
            // i + 1, so the turn vertex is the last point kept.
            return i + 2;
        }
    }
    rows.len()
}
