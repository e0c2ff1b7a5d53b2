//! Greedy track-to-detection matching for one frame.

use nalgebra::{DMatrix, Point2};

/// Compute the full pairwise Euclidean distance matrix between track
/// centers (rows) and detection centers (columns).
pub fn distance_matrix(tracks: &[Point2<f64>], detections: &[Point2<f64>]) -> DMatrix<f64> {
    let n_tracks = tracks.len();
    let n_detections = detections.len();

    let mut result = DMatrix::zeros(n_tracks, n_detections);
    for (i, track) in tracks.iter().enumerate() {
        for (j, detection) in detections.iter().enumerate() {
            result[(i, j)] = nalgebra::distance(track, detection);
        }
    }
    result
}

/// Greedily match each track row to its nearest unclaimed detection.
///
/// Rows are visited top to bottom (track creation order) and each selects
/// the minimum-distance column not yet claimed by an earlier row, accepted
/// only if the distance is strictly below `threshold`. An earlier row
/// claims its nearest detection even when a later row is closer to it.
/// This first-come tie-break is the documented policy; it is weaker than
/// a globally optimal assignment.
///
/// Returns one entry per row: `Some(detection_index)` or `None`.
pub fn claim_nearest(distances: &DMatrix<f64>, threshold: f64) -> Vec<Option<usize>> {
    let n_tracks = distances.nrows();
    let n_detections = distances.ncols();

    let mut claimed = vec![false; n_detections];
    let mut matches = vec![None; n_tracks];

    for i in 0..n_tracks {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..n_detections {
            if claimed[j] {
                continue;
            }
            let dist = distances[(i, j)];
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((j, dist));
            }
        }

        if let Some((j, dist)) = best {
            if dist < threshold {
                claimed[j] = true;
                matches[i] = Some(j);
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    // ===== Distance matrix =====

    #[test]
    fn test_distance_matrix_values() {
        let tracks = vec![p(0.0, 0.0), p(10.0, 0.0)];
        let detections = vec![p(3.0, 4.0)];

        let matrix = distance_matrix(&tracks, &detections);

        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 1);
        assert_relative_eq!(matrix[(0, 0)], 5.0, epsilon = 1e-10);
        assert_relative_eq!(matrix[(1, 0)], (49.0f64 + 16.0).sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_distance_matrix_empty() {
        let matrix = distance_matrix(&[], &[p(1.0, 1.0)]);
        assert_eq!(matrix.nrows(), 0);
        assert_eq!(matrix.ncols(), 1);
    }

    // ===== Greedy claiming =====

    #[test]
    fn test_claim_all_below_threshold() {
        let distances = DMatrix::from_row_slice(2, 2, &[
            1.0, 9.0,
            9.0, 2.0,
        ]);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_claim_threshold_is_strict() {
        let distances = DMatrix::from_row_slice(1, 1, &[30.0]);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![None], "distance equal to threshold must not match");

        let distances = DMatrix::from_row_slice(1, 1, &[29.999]);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![Some(0)]);
    }

    #[test]
    fn test_first_track_wins_contended_detection() {
        // Both tracks are nearest to detection 0; the later track is even
        // closer to it, but the earlier track claims it first and the later
        // one falls back to detection 1.
        let distances = DMatrix::from_row_slice(2, 2, &[
            5.0, 20.0,
            1.0, 6.0,
        ]);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_fallback_detection_still_bounded_by_threshold() {
        // Track 1's fallback is out of range, so it stays unmatched.
        let distances = DMatrix::from_row_slice(2, 2, &[
            5.0, 20.0,
            1.0, 50.0,
        ]);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![Some(0), None]);
    }

    #[test]
    fn test_more_tracks_than_detections() {
        let distances = DMatrix::from_row_slice(3, 1, &[
            2.0,
            1.0,
            3.0,
        ]);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![Some(0), None, None]);
    }

    #[test]
    fn test_claim_empty_detections() {
        let distances = DMatrix::zeros(2, 0);
        let matches = claim_nearest(&distances, 30.0);
        assert_eq!(matches, vec![None, None]);
    }

    #[test]
    fn test_claim_no_tracks() {
        let distances = DMatrix::zeros(0, 3);
        let matches = claim_nearest(&distances, 30.0);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_one_to_one_mapping() {
        let distances = DMatrix::from_row_slice(3, 3, &[
            1.0, 2.0, 3.0,
            1.5, 2.5, 3.5,
            1.2, 2.2, 3.2,
        ]);
        let matches = claim_nearest(&distances, 30.0);

        let claimed: Vec<usize> = matches.iter().flatten().copied().collect();
        let mut deduped = claimed.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(claimed.len(), deduped.len(), "no detection claimed twice");
    }
}
