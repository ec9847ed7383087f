use ndarray::Array3;

use crate::volume::CandidatePoint;

use super::components::label_components;
use super::{CandidateDetector, Detection, DetectionMethod};

/// Connected-component centroid detector.
#[derive(Clone, Debug)]
pub struct CentroidDetector {
    /// Components with fewer voxels are discarded.
    pub min_voxels: usize,
}

impl CandidateDetector for CentroidDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Centroid
    }

    fn detect(&self, data: &Array3<f32>, threshold: f32) -> Detection {
        let mask = data.mapv(|v| v > threshold);
        let candidates = component_centroids(data, &mask, self.min_voxels);
        Detection {
            candidates,
            mask: Some(mask),
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Moments {
    weight: f64,
    z: f64,
    y: f64,
    x: f64,
}

/// Intensity-weighted centroid of every 26-connected component of `mask`,
/// in label order. Components whose voxels all have zero intensity fall back
/// to their geometric center.
pub fn component_centroids(
    data: &Array3<f32>,
    mask: &Array3<bool>,
    min_voxels: usize,
) -> Vec<CandidatePoint> {
    let labeled = label_components(mask);
    let n = labeled.components.len();
    let mut weighted = vec![Moments::default(); n];
    let mut geometric = vec![Moments::default(); n];

    for ((z, y, x), &label) in labeled.labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let i = label as usize - 1;
        let v = data[[z, y, x]].max(0.0) as f64;
        let (zf, yf, xf) = (z as f64, y as f64, x as f64);

        let w = &mut weighted[i];
        w.weight += v;
        w.z += v * zf;
        w.y += v * yf;
        w.x += v * xf;

        let g = &mut geometric[i];
        g.weight += 1.0;
        g.z += zf;
        g.y += yf;
        g.x += xf;
    }

    labeled
        .components
        .iter()
        .zip(weighted.iter().zip(geometric.iter()))
        .filter(|(stats, _)| stats.voxel_count >= min_voxels)
        .map(|(_, (w, g))| {
            let m = if w.weight > 0.0 { w } else { g };
            CandidatePoint::new(m.z / m.weight, m.y / m.weight, m.x / m.weight)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_centroid_pulls_toward_bright_voxel() {
        let mut data = Array3::<f32>::zeros((1, 1, 4));
        data[[0, 0, 1]] = 1.0;
        data[[0, 0, 2]] = 3.0;
        let detection = CentroidDetector { min_voxels: 1 }.detect(&data, 0.5);
        assert_eq!(detection.candidates.len(), 1);
        assert!((detection.candidates[0].x - 1.75).abs() < 1e-12);
        assert!(detection.mask.is_some());
    }

    #[test]
    fn test_small_components_are_dropped() {
        let mut data = Array3::<f32>::zeros((1, 1, 8));
        data[[0, 0, 0]] = 1.0;
        data[[0, 0, 4]] = 1.0;
        data[[0, 0, 5]] = 1.0;
        let detection = CentroidDetector { min_voxels: 2 }.detect(&data, 0.5);
        assert_eq!(detection.candidates, vec![CandidatePoint::new(0.0, 0.0, 4.5)]);
    }
}
