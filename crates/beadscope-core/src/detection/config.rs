use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BLOB_MIN_SIGMA, DEFAULT_BLOB_SIGMA, DEFAULT_DOG_SIGMA_RATIO, DEFAULT_LOG_NUM_SCALES,
    DEFAULT_MIN_COMPONENT_VOXELS, DEFAULT_MIN_DISTANCE, DEFAULT_REL_THRESHOLD,
};
use crate::error::{BeadError, Result};
use crate::threshold::{validate_fraction, AutoThreshold, ThresholdMode};

/// Candidate-generation method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Local intensity maxima with greedy minimum-distance suppression.
    #[default]
    PeakLocalMax,
    /// Multiscale Laplacian-of-Gaussian blob search.
    BlobLog,
    /// Multiscale Difference-of-Gaussians blob search.
    BlobDog,
    /// Intensity-weighted centroids of 26-connected components.
    Centroid,
}

impl DetectionMethod {
    pub const ALL: [DetectionMethod; 4] = [
        DetectionMethod::PeakLocalMax,
        DetectionMethod::BlobLog,
        DetectionMethod::BlobDog,
        DetectionMethod::Centroid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DetectionMethod::PeakLocalMax => "peak_local_max",
            DetectionMethod::BlobLog => "blob_log",
            DetectionMethod::BlobDog => "blob_dog",
            DetectionMethod::Centroid => "centroid",
        }
    }

    /// Map the numeric tool index used by saved parameter files (0..=3).
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL.get(index).copied().ok_or_else(|| {
            BeadError::InvalidConfig(format!("detection tool index {index} is not in 0..=3"))
        })
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DetectionMethod {
    type Err = BeadError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == lowered)
            .ok_or_else(|| {
                BeadError::InvalidConfig(format!(
                    "unknown detection method '{s}' (expected peak_local_max, blob_log, blob_dog or centroid)"
                ))
            })
    }
}

/// Parameters for candidate detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub method: DetectionMethod,
    /// Minimum separation between accepted local maxima, in voxels.
    pub min_distance: usize,
    /// Largest blob scale searched, in voxels.
    pub sigma: f64,
    /// Smallest blob scale searched, in voxels.
    pub min_sigma: f64,
    /// Number of Laplacian-of-Gaussian scales between `min_sigma` and `sigma`.
    pub num_scales: usize,
    /// Ratio between successive Difference-of-Gaussians scales.
    pub sigma_ratio: f64,
    /// Threshold as a fraction of the volume maximum.
    pub rel_threshold: f64,
    /// Use `threshold_choice` instead of `rel_threshold`.
    pub auto_threshold: bool,
    pub threshold_choice: AutoThreshold,
    /// Connected components smaller than this are dropped by the centroid method.
    pub min_voxels: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            method: DetectionMethod::default(),
            min_distance: DEFAULT_MIN_DISTANCE,
            sigma: DEFAULT_BLOB_SIGMA,
            min_sigma: DEFAULT_BLOB_MIN_SIGMA,
            num_scales: DEFAULT_LOG_NUM_SCALES,
            sigma_ratio: DEFAULT_DOG_SIGMA_RATIO,
            rel_threshold: DEFAULT_REL_THRESHOLD,
            auto_threshold: false,
            threshold_choice: AutoThreshold::default(),
            min_voxels: DEFAULT_MIN_COMPONENT_VOXELS,
        }
    }
}

impl DetectionConfig {
    /// The thresholding mode selected by `auto_threshold`.
    pub fn threshold_mode(&self) -> ThresholdMode {
        if self.auto_threshold {
            ThresholdMode::Auto(self.threshold_choice)
        } else {
            ThresholdMode::Relative(self.rel_threshold)
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_fraction(self.rel_threshold)?;
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(BeadError::InvalidConfig(format!(
                "blob sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.min_sigma.is_finite() && self.min_sigma > 0.0) {
            return Err(BeadError::InvalidConfig(format!(
                "blob min_sigma must be positive, got {}",
                self.min_sigma
            )));
        }
        if self.num_scales == 0 {
            return Err(BeadError::InvalidConfig(
                "num_scales must be at least 1".into(),
            ));
        }
        if !(self.sigma_ratio.is_finite() && self.sigma_ratio > 1.0) {
            return Err(BeadError::InvalidConfig(format!(
                "sigma_ratio must be greater than 1, got {}",
                self.sigma_ratio
            )));
        }
        Ok(())
    }
}
