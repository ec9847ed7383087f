use ndarray::Array3;

use crate::filters::maximum_filter;
use crate::volume::CandidatePoint;

use super::{CandidateDetector, Detection, DetectionMethod};

/// Local-maxima detector with greedy minimum-distance suppression.
#[derive(Clone, Debug)]
pub struct LocalMaxima {
    pub min_distance: usize,
}

impl CandidateDetector for LocalMaxima {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::PeakLocalMax
    }

    fn detect(&self, data: &Array3<f32>, threshold: f32) -> Detection {
        Detection::points(find_local_maxima(data, threshold, self.min_distance))
    }
}

/// Voxels above `threshold` that equal the maximum of their
/// `(2 * min_distance + 1)^3` neighborhood, in descending intensity order.
///
/// A maximum closer than `min_distance` voxels to an already-accepted,
/// brighter one is suppressed. Ties are broken by raster order. A constant
/// volume has no maxima.
pub fn find_local_maxima(
    data: &Array3<f32>,
    threshold: f32,
    min_distance: usize,
) -> Vec<CandidatePoint> {
    let Some((min, max)) = crate::volume::intensity_range(data) else {
        return Vec::new();
    };
    if min == max {
        return Vec::new();
    }

    let filtered = maximum_filter(data, min_distance.max(1));

    let mut peaks: Vec<((usize, usize, usize), f32)> = data
        .indexed_iter()
        .zip(filtered.iter())
        .filter(|&((_, &v), &m)| v > threshold && v >= m)
        .map(|((idx, &v), _)| (idx, v))
        .collect();

    // Stable sort keeps raster order among equal intensities.
    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));

    let min_distance = min_distance as f64;
    let mut accepted: Vec<CandidatePoint> = Vec::new();
    for ((z, y, x), _) in peaks {
        let point = CandidatePoint::new(z as f64, y as f64, x as f64);
        if accepted.iter().all(|a| a.distance(&point) >= min_distance) {
            accepted.push(point);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_separate_peaks_brightest_first() {
        let mut data = Array3::<f32>::zeros((5, 20, 20));
        data[[2, 4, 4]] = 5.0;
        data[[2, 15, 15]] = 9.0;
        let peaks = find_local_maxima(&data, 1.0, 3);
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0], CandidatePoint::new(2.0, 15.0, 15.0));
        assert_eq!(peaks[1], CandidatePoint::new(2.0, 4.0, 4.0));
    }

    #[test]
    fn test_plateau_is_suppressed_to_one_peak() {
        let mut data = Array3::<f32>::zeros((3, 10, 10));
        data[[1, 5, 5]] = 4.0;
        data[[1, 5, 6]] = 4.0;
        let peaks = find_local_maxima(&data, 1.0, 2);
        assert_eq!(peaks, vec![CandidatePoint::new(1.0, 5.0, 5.0)]);
    }

    #[test]
    fn test_below_threshold_is_ignored() {
        let mut data = Array3::<f32>::zeros((3, 5, 5));
        data[[1, 2, 2]] = 0.5;
        assert!(find_local_maxima(&data, 1.0, 1).is_empty());
    }

    #[test]
    fn test_constant_volume_has_no_peaks() {
        let data = Array3::<f32>::from_elem((3, 3, 3), 2.0);
        assert!(find_local_maxima(&data, 0.0, 1).is_empty());
    }
}
