use super::blob::{BlobDetector, ScaleSpace};
use super::centroid::CentroidDetector;
use super::local_maxima::LocalMaxima;
use super::{CandidateDetector, DetectionConfig, DetectionMethod};

/// Build the detector selected by `config.method`.
pub fn detector_for(config: &DetectionConfig) -> Box<dyn CandidateDetector> {
    match config.method {
        DetectionMethod::PeakLocalMax => Box::new(LocalMaxima {
            min_distance: config.min_distance,
        }),
        DetectionMethod::BlobLog => Box::new(BlobDetector {
            space: ScaleSpace::LaplacianOfGaussian {
                min_sigma: config.min_sigma,
                max_sigma: config.sigma,
                num_scales: config.num_scales,
            },
        }),
        DetectionMethod::BlobDog => Box::new(BlobDetector {
            space: ScaleSpace::DifferenceOfGaussians {
                min_sigma: config.min_sigma,
                max_sigma: config.sigma,
                sigma_ratio: config.sigma_ratio,
            },
        }),
        DetectionMethod::Centroid => Box::new(CentroidDetector {
            min_voxels: config.min_voxels,
        }),
    }
}
