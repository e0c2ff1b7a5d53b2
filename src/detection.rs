//! Detection and tracked-row records, the wire types of the pipeline.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single frame's observed bounding box for one object, with no
/// persistent identity.
///
/// Coordinates are the box corners `(x1, y1)` top-left and `(x2, y2)`
/// bottom-right, in the same units the detector emits. Detections are
/// immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Frame index this detection was observed in.
    pub frame: i64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Detection {
    /// Create a new detection, validating that all coordinates are finite.
    pub fn new(frame: i64, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidRecord(format!(
                "detection at frame {} has non-finite coordinates ({}, {}, {}, {})",
                frame, x1, y1, x2, y2
            )));
        }
        Ok(Self { frame, x1, y1, x2, y2 })
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Validate an already-constructed detection (e.g. one deserialized
    /// from an external source).
    pub fn validate(&self) -> Result<()> {
        if ![self.x1, self.y1, self.x2, self.y2].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidRecord(format!(
                "detection at frame {} has non-finite coordinates",
                self.frame
            )));
        }
        Ok(())
    }
}

/// An identity-labeled detection: one row of the Association Engine's
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub frame: i64,
    pub track_id: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl TrackRow {
    pub(crate) fn from_detection(detection: &Detection, track_id: u32) -> Self {
        Self {
            frame: detection.frame,
            track_id,
            x1: detection.x1,
            y1: detection.y1,
            x2: detection.x2,
            y2: detection.y2,
        }
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}
