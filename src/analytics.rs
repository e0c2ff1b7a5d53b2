//! Trajectory Analytics Engine: per-track kinematic summaries and
//! per-category aggregates.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::{euclidean, round_to};
use crate::{CleanTrack, Error, Result};

/// Configuration for speed classification.
///
/// Categories are half-open: `avg < slow_below` is slow, `avg <
/// medium_below` is medium, anything else is fast. Units match the
/// detection coordinates per frame step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub slow_below: f64,
    pub medium_below: f64,
}

impl AnalyticsConfig {
    pub fn new(slow_below: f64, medium_below: f64) -> Self {
        Self { slow_below, medium_below }
    }

    fn validate(&self) -> Result<()> {
        if !(self.slow_below > 0.0 && self.slow_below < self.medium_below) {
            return Err(Error::InvalidConfig(format!(
                "speed thresholds must satisfy 0 < slow_below < medium_below, got {} / {}",
                self.slow_below, self.medium_below
            )));
        }
        Ok(())
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { slow_below: 4.0, medium_below: 12.0 }
    }
}

/// Coarse classification of a track's average velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedCategory {
    Slow,
    Medium,
    Fast,
}

impl SpeedCategory {
    /// All categories in their fixed reporting order.
    pub const ALL: [SpeedCategory; 3] =
        [SpeedCategory::Slow, SpeedCategory::Medium, SpeedCategory::Fast];

    fn classify(avg_velocity: f64, config: &AnalyticsConfig) -> Self {
        if avg_velocity < config.slow_below {
            SpeedCategory::Slow
        } else if avg_velocity < config.medium_below {
            SpeedCategory::Medium
        } else {
            SpeedCategory::Fast
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedCategory::Slow => "slow",
            SpeedCategory::Medium => "medium",
            SpeedCategory::Fast => "fast",
        }
    }
}

impl fmt::Display for SpeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analytics input point. The analytics engine accepts any source of
/// per-frame centers, not just the repair filter's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub frame: i64,
    pub track_id: u32,
    pub x_center: f64,
    pub y_center: f64,
}

impl TrackPoint {
    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.x_center, self.y_center)
    }

    fn validate(&self) -> Result<()> {
        if !(self.x_center.is_finite() && self.y_center.is_finite()) {
            return Err(Error::InvalidRecord(format!(
                "track {} frame {} has non-finite center",
                self.track_id, self.frame
            )));
        }
        Ok(())
    }
}

impl From<&crate::TrackRow> for TrackPoint {
    fn from(row: &crate::TrackRow) -> Self {
        let center = row.center();
        Self { frame: row.frame, track_id: row.track_id, x_center: center.x, y_center: center.y }
    }
}

/// A defined frame-to-frame velocity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepVelocity {
    pub frame_a: i64,
    pub frame_b: i64,
    /// Rounded to 2 decimal places.
    pub velocity: f64,
}

/// Descriptive statistics for one track. Write-once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub track_id: u32,
    /// Centers rounded to 1 decimal place, in frame order.
    pub coordinate_sequence: Vec<(f64, f64)>,
    /// Count of distinct frame indices present.
    pub duration_frames: usize,
    pub frame_list: Vec<i64>,
    pub per_step_velocities: Vec<StepVelocity>,
    /// Mean of defined velocities, rounded to 2 decimal places.
    pub avg_velocity: f64,
    /// Maximum defined velocity, rounded to 2 decimal places.
    pub max_velocity: f64,
    pub speed_category: SpeedCategory,
    /// Mean perpendicular distance to the endpoint line, rounded to 2
    /// decimal places.
    pub curvature_deviation: f64,
    pub source_label: String,
}

/// Mean statistics over all tracks of one speed category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    /// `mean_<category>`, distinct from any real track id.
    pub label: String,
    pub mean_avg_velocity: f64,
    pub mean_max_velocity: f64,
    pub mean_curvature_deviation: f64,
    pub mean_duration_frames: f64,
}

/// Full output of the analytics engine: one summary per track plus up to
/// three aggregate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotilityReport {
    pub summaries: Vec<TrajectorySummary>,
    pub aggregates: Vec<CategoryAggregate>,
}

/// Summarize cleaned tracks into per-track statistics and category
/// aggregates.
///
/// Points are grouped by `track_id` (ascending) and re-sorted by frame
/// even when already ordered. Empty input yields an empty report.
pub fn summarize_tracks(
    points: &[TrackPoint],
    source_label: &str,
    config: &AnalyticsConfig,
) -> Result<MotilityReport> {
    config.validate()?;
    for point in points {
        point.validate()?;
    }

    let mut grouped: BTreeMap<u32, Vec<&TrackPoint>> = BTreeMap::new();
    for point in points {
        grouped.entry(point.track_id).or_default().push(point);
    }

    let mut summaries = Vec::with_capacity(grouped.len());
    for (track_id, mut group) in grouped {
        group.sort_by_key(|p| p.frame);
        summaries.push(summarize_one(track_id, &group, source_label, config));
    }

    let aggregates = aggregate_by_category(&summaries);
    debug!(
        tracks = summaries.len(),
        aggregates = aggregates.len(),
        source = source_label,
        "analytics complete"
    );
    Ok(MotilityReport { summaries, aggregates })
}

/// Convenience adapter from the repair filter's output.
pub fn points_from_clean_tracks(tracks: &[CleanTrack]) -> Vec<TrackPoint> {
    tracks
        .iter()
        .flat_map(|t| t.rows.iter().map(TrackPoint::from))
        .collect()
}

fn summarize_one(
    track_id: u32,
    group: &[&TrackPoint],
    source_label: &str,
    config: &AnalyticsConfig,
) -> TrajectorySummary {
    let centers: Vec<Point2<f64>> = group.iter().map(|p| p.center()).collect();
    let frames: Vec<i64> = group.iter().map(|p| p.frame).collect();

    let velocities: Vec<f64> =
        centers.windows(2).map(|pair| euclidean(&pair[0], &pair[1])).collect();

    let per_step_velocities: Vec<StepVelocity> = velocities
        .iter()
        .enumerate()
        .map(|(i, &v)| StepVelocity {
            frame_a: frames[i],
            frame_b: frames[i + 1],
            velocity: round_to(v, 2),
        })
        .collect();

    // Classification uses the unrounded mean; the summary stores the
    // rounded value.
    let avg_velocity = if velocities.is_empty() {
        0.0
    } else {
        velocities.iter().sum::<f64>() / velocities.len() as f64
    };
    let max_velocity = velocities.iter().cloned().fold(0.0, f64::max);
    let speed_category = SpeedCategory::classify(avg_velocity, config);

    let mut distinct_frames = frames.clone();
    distinct_frames.sort_unstable();
    distinct_frames.dedup();

    TrajectorySummary {
        track_id,
        coordinate_sequence: centers
            .iter()
            .map(|c| (round_to(c.x, 1), round_to(c.y, 1)))
            .collect(),
        duration_frames: distinct_frames.len(),
        frame_list: frames,
        per_step_velocities,
        avg_velocity: round_to(avg_velocity, 2),
        max_velocity: round_to(max_velocity, 2),
        speed_category,
        curvature_deviation: curvature_deviation(&centers),
        source_label: source_label.to_string(),
    }
}

/// Mean perpendicular distance of the trajectory's points from the
/// straight line through its endpoints, rounded to 2 decimal places.
///
/// Degenerate cases are explicit branches, never an error: fewer than 3
/// points or coincident endpoints give 0.0.
fn curvature_deviation(centers: &[Point2<f64>]) -> f64 {
    if centers.len() < 3 {
        return 0.0;
    }
    let p0 = centers[0];
    let line: Vector2<f64> = centers[centers.len() - 1] - p0;
    let line_len = line.norm();
    if line_len == 0.0 {
        return 0.0;
    }
    let unit = line / line_len;

    let total: f64 = centers
        .iter()
        .map(|pt| {
            let offset = pt - p0;
            let projected = p0 + unit * offset.dot(&unit);
            euclidean(pt, &projected)
        })
        .sum();
    round_to(total / centers.len() as f64, 2)
}

/// One aggregate row per non-empty category, in the fixed
/// slow/medium/fast order. Means are taken over the already-rounded
/// per-track values and rounded again to 2 decimal places.
fn aggregate_by_category(summaries: &[TrajectorySummary]) -> Vec<CategoryAggregate> {
    SpeedCategory::ALL
        .iter()
        .filter_map(|category| {
            let members: Vec<&TrajectorySummary> =
                summaries.iter().filter(|s| s.speed_category == *category).collect();
            if members.is_empty() {
                return None;
            }

            let n = members.len() as f64;
            Some(CategoryAggregate {
                label: format!("mean_{}", category),
                mean_avg_velocity: round_to(
                    members.iter().map(|s| s.avg_velocity).sum::<f64>() / n,
                    2,
                ),
                mean_max_velocity: round_to(
                    members.iter().map(|s| s.max_velocity).sum::<f64>() / n,
                    2,
                ),
                mean_curvature_deviation: round_to(
                    members.iter().map(|s| s.curvature_deviation).sum::<f64>() / n,
                    2,
                ),
                mean_duration_frames: round_to(
                    members.iter().map(|s| s.duration_frames as f64).sum::<f64>() / n,
                    2,
                ),
            })
        })
        .collect()
}
