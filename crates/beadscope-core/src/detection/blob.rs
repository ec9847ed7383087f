use ndarray::{Array3, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::filters::{gaussian_blur_volume, maximum_filter, normalized_log};
use crate::volume::CandidatePoint;

use super::{CandidateDetector, Detection, DetectionMethod};

/// Scale-space operator used by the blob detectors.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleSpace {
    /// Scale-normalized Laplacian of Gaussian at `num_scales` evenly spaced
    /// sigmas in `[min_sigma, max_sigma]`.
    LaplacianOfGaussian {
        min_sigma: f64,
        max_sigma: f64,
        num_scales: usize,
    },
    /// Differences of Gaussians at sigmas `min_sigma * ratio^i` up to
    /// `max_sigma`, normalized by `ratio - 1`.
    DifferenceOfGaussians {
        min_sigma: f64,
        max_sigma: f64,
        sigma_ratio: f64,
    },
}

/// A blob response layer: the scale it was computed at and its values.
struct Layer {
    sigma: f64,
    response: Array3<f32>,
}

impl ScaleSpace {
    /// Scales (in voxels) at which a response layer is produced.
    pub fn sigmas(&self) -> Vec<f64> {
        match *self {
            ScaleSpace::LaplacianOfGaussian {
                min_sigma,
                max_sigma,
                num_scales,
            } => {
                if num_scales <= 1 || max_sigma <= min_sigma {
                    return vec![max_sigma];
                }
                let step = (max_sigma - min_sigma) / (num_scales - 1) as f64;
                (0..num_scales)
                    .map(|i| min_sigma + step * i as f64)
                    .collect()
            }
            ScaleSpace::DifferenceOfGaussians {
                min_sigma,
                max_sigma,
                sigma_ratio,
            } => {
                if max_sigma <= min_sigma {
                    return vec![max_sigma];
                }
                let k = ((max_sigma / min_sigma).ln() / sigma_ratio.ln()).floor() as i32 + 1;
                (0..k).map(|i| min_sigma * sigma_ratio.powi(i)).collect()
            }
        }
    }

    fn layers(&self, data: &Array3<f32>) -> Vec<Layer> {
        let sigmas = self.sigmas();
        match *self {
            ScaleSpace::LaplacianOfGaussian { .. } => sigmas
                .par_iter()
                .map(|&sigma| Layer {
                    sigma,
                    response: normalized_log(data, sigma),
                })
                .collect(),
            ScaleSpace::DifferenceOfGaussians { sigma_ratio, .. } => {
                let norm = (1.0 / (sigma_ratio - 1.0)) as f32;
                sigmas
                    .par_iter()
                    .map(|&sigma| {
                        let fine = gaussian_blur_volume(data, sigma);
                        let coarse = gaussian_blur_volume(data, sigma * sigma_ratio);
                        let mut response = fine;
                        Zip::from(&mut response)
                            .and(&coarse)
                            .for_each(|r, &c| *r = (*r - c) * norm);
                        Layer { sigma, response }
                    })
                    .collect()
            }
        }
    }
}

/// Multiscale blob detector. Only blob centers are reported; the scale at
/// which each blob was found is used for overlap pruning and then dropped.
#[derive(Clone, Debug)]
pub struct BlobDetector {
    pub space: ScaleSpace,
}

impl CandidateDetector for BlobDetector {
    fn method(&self) -> DetectionMethod {
        match self.space {
            ScaleSpace::LaplacianOfGaussian { .. } => DetectionMethod::BlobLog,
            ScaleSpace::DifferenceOfGaussians { .. } => DetectionMethod::BlobDog,
        }
    }

    fn detect(&self, data: &Array3<f32>, threshold: f32) -> Detection {
        Detection::points(find_blobs(data, &self.space, threshold))
    }
}

struct Blob {
    point: CandidatePoint,
    sigma: f64,
    response: f32,
}

/// Centers of blobs whose scale-space response exceeds `threshold`.
///
/// A blob is a maximum of the response over its 3x3x3 spatial neighborhood
/// and the two adjacent scales. Blobs are accepted strongest first; a blob
/// whose center lies within `sqrt(3) * sigma` of an accepted blob is
/// dropped as an overlap.
pub fn find_blobs(data: &Array3<f32>, space: &ScaleSpace, threshold: f32) -> Vec<CandidatePoint> {
    if data.is_empty() {
        return Vec::new();
    }

    let layers = space.layers(data);
    let spatial_max: Vec<Array3<f32>> = layers
        .par_iter()
        .map(|layer| maximum_filter(&layer.response, 1))
        .collect();

    let mut blobs: Vec<Blob> = Vec::new();
    for (i, layer) in layers.iter().enumerate() {
        let below = i.checked_sub(1).map(|j| &spatial_max[j]);
        let above = spatial_max.get(i + 1);
        for ((z, y, x), &r) in layer.response.indexed_iter() {
            if r <= threshold || r < spatial_max[i][[z, y, x]] {
                continue;
            }
            if below.is_some_and(|b| r < b[[z, y, x]]) || above.is_some_and(|a| r < a[[z, y, x]]) {
                continue;
            }
            blobs.push(Blob {
                point: CandidatePoint::new(z as f64, y as f64, x as f64),
                sigma: layer.sigma,
                response: r,
            });
        }
    }
    let raw = blobs.len();

    blobs.sort_by(|a, b| b.response.total_cmp(&a.response));
    let mut accepted: Vec<Blob> = Vec::new();
    for blob in blobs {
        let overlaps = accepted
            .iter()
            .any(|a| a.point.distance(&blob.point) < 3f64.sqrt() * a.sigma.max(blob.sigma));
        if !overlaps {
            accepted.push(blob);
        }
    }

    debug!(
        scales = layers.len(),
        raw_peaks = raw,
        blobs = accepted.len(),
        "Blob search finished"
    );
    accepted.into_iter().map(|b| b.point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sigmas_are_evenly_spaced() {
        let space = ScaleSpace::LaplacianOfGaussian {
            min_sigma: 1.0,
            max_sigma: 3.0,
            num_scales: 5,
        };
        assert_eq!(space.sigmas(), vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn test_dog_sigmas_grow_geometrically() {
        let space = ScaleSpace::DifferenceOfGaussians {
            min_sigma: 1.0,
            max_sigma: 3.0,
            sigma_ratio: 1.6,
        };
        let sigmas = space.sigmas();
        assert_eq!(sigmas.len(), 3);
        assert!((sigmas[1] - 1.6).abs() < 1e-12);
        assert!((sigmas[2] - 2.56).abs() < 1e-12);
    }

    #[test]
    fn test_single_scale_when_max_below_min() {
        let space = ScaleSpace::LaplacianOfGaussian {
            min_sigma: 2.0,
            max_sigma: 1.0,
            num_scales: 10,
        };
        assert_eq!(space.sigmas(), vec![1.0]);
    }
}
