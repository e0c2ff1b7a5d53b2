//! Track identity and the per-run session that owns the id counter.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Detection;

/// Association state of a track.
///
/// The transition is one-way: a track goes `Active -> Locked` at most once
/// and a locked track never accepts another detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackState {
    /// Still eligible for association, provided continuity holds.
    Active,
    /// Permanently retired after missing a frame.
    Locked,
}

/// A persistent identity formed by associating detections across frames.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique id, assigned in increasing order of first appearance (>= 1).
    pub id: u32,

    /// Current association state.
    pub state: TrackState,

    /// Center of the most recently matched detection.
    pub center: Point2<f64>,

    /// Frame of the most recently matched detection.
    pub last_seen_frame: i64,

    /// Number of detections associated so far.
    pub age: u32,

    /// Member detections, ordered by strictly increasing frame.
    pub detections: Vec<Detection>,
}

impl Track {
    /// Spawn a new track from its first detection.
    pub fn spawn(id: u32, detection: Detection) -> Self {
        Self {
            id,
            state: TrackState::Active,
            center: detection.center(),
            last_seen_frame: detection.frame,
            age: 1,
            detections: vec![detection],
        }
    }

    /// Whether this track may claim a detection at `frame`.
    ///
    /// Continuity must be unbroken: only an active track seen exactly one
    /// frame earlier is eligible. A track that misses even a single frame
    /// is never eligible again.
    pub fn is_eligible(&self, frame: i64) -> bool {
        self.state == TrackState::Active && self.last_seen_frame == frame - 1
    }

    /// Extend this track with a matched detection.
    ///
    /// Callers must only extend eligible tracks; this is enforced with a
    /// debug assertion rather than a runtime error since the tracker is the
    /// only caller.
    pub(crate) fn extend(&mut self, detection: Detection) {
        debug_assert!(self.is_eligible(detection.frame));
        self.center = detection.center();
        self.last_seen_frame = detection.frame;
        self.age += 1;
        self.detections.push(detection);
    }

    /// Permanently retire this track from association.
    pub(crate) fn lock(&mut self) {
        self.state = TrackState::Locked;
    }
}

/// Track registry owned by a single Association Engine invocation.
///
/// Holds the next-id counter and the track collection; deliberately not a
/// process-wide singleton, so two runs over the same detections produce
/// identical ids.
#[derive(Debug, Default)]
pub struct TrackSession {
    tracks: Vec<Track>,
    next_id: u32,
}

impl TrackSession {
    pub fn new() -> Self {
        Self { tracks: Vec::new(), next_id: 1 }
    }

    /// All tracks, in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    /// Indices of tracks eligible for association at `frame`, in creation
    /// order. Creation order is the documented tie-break policy of the
    /// greedy matcher.
    pub(crate) fn eligible_indices(&self, frame: i64) -> Vec<usize> {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_eligible(frame))
            .map(|(i, _)| i)
            .collect()
    }

    /// Spawn a new track with the next sequential id.
    pub(crate) fn spawn(&mut self, detection: Detection) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.tracks.push(Track::spawn(id, detection));
        id
    }

    /// Lock every active track not seen at `frame`.
    pub(crate) fn lock_stale(&mut self, frame: i64) {
        for track in &mut self.tracks {
            if track.state == TrackState::Active && track.last_seen_frame < frame {
                track.lock();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(frame: i64, x: f64, y: f64) -> Detection {
        Detection::new(frame, x - 1.0, y - 1.0, x + 1.0, y + 1.0).unwrap()
    }

    // ===== Track lifecycle =====

    #[test]
    fn test_spawn_initial_state() {
        let track = Track::spawn(1, det(4, 10.0, 20.0));

        assert_eq!(track.id, 1);
        assert_eq!(track.state, TrackState::Active);
        assert_eq!(track.last_seen_frame, 4);
        assert_eq!(track.age, 1);
        assert_eq!(track.detections.len(), 1);
        assert_eq!(track.center, Point2::new(10.0, 20.0));
    }

    #[test]
    fn test_eligibility_requires_consecutive_frame() {
        let track = Track::spawn(1, det(4, 0.0, 0.0));

        assert!(track.is_eligible(5), "seen at 4, eligible at 5");
        assert!(!track.is_eligible(6), "a one-frame gap ends eligibility");
        assert!(!track.is_eligible(4), "not eligible for its own frame");
    }

    #[test]
    fn test_locked_track_never_eligible() {
        let mut track = Track::spawn(1, det(4, 0.0, 0.0));
        track.lock();

        assert_eq!(track.state, TrackState::Locked);
        assert!(!track.is_eligible(5));
    }

    #[test]
    fn test_extend_updates_bookkeeping() {
        let mut track = Track::spawn(1, det(0, 0.0, 0.0));
        track.extend(det(1, 3.0, 4.0));

        assert_eq!(track.age, 2);
        assert_eq!(track.last_seen_frame, 1);
        assert_eq!(track.center, Point2::new(3.0, 4.0));
        assert_eq!(track.detections.len(), 2);
        // frames strictly increasing across members
        assert!(track.detections.windows(2).all(|w| w[0].frame < w[1].frame));
    }

    // ===== TrackSession =====

    #[test]
    fn test_session_ids_sequential_from_one() {
        let mut session = TrackSession::new();

        assert_eq!(session.spawn(det(0, 0.0, 0.0)), 1);
        assert_eq!(session.spawn(det(0, 50.0, 50.0)), 2);
        assert_eq!(session.spawn(det(1, 90.0, 90.0)), 3);

        let ids: Vec<u32> = session.tracks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_session_lock_stale() {
        let mut session = TrackSession::new();
        session.spawn(det(0, 0.0, 0.0));
        session.spawn(det(1, 50.0, 50.0));

        session.lock_stale(1);

        assert_eq!(session.tracks()[0].state, TrackState::Locked);
        assert_eq!(session.tracks()[1].state, TrackState::Active);
    }

    #[test]
    fn test_eligible_indices_preserve_creation_order() {
        let mut session = TrackSession::new();
        session.spawn(det(0, 0.0, 0.0));
        session.spawn(det(1, 50.0, 50.0)); // gap for track 1 below
        session.spawn(det(1, 90.0, 90.0));

        // At frame 2, tracks seen at frame 1 are eligible, in creation order.
        assert_eq!(session.eligible_indices(2), vec![1, 2]);
    }
}
