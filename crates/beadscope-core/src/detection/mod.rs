//! Candidate bead detection.
//!
//! Every method implements [`CandidateDetector`]: given a volume and a scalar
//! threshold it produces candidate coordinates. [`detect`] computes the
//! threshold from the configuration and dispatches through the registry.

pub mod blob;
pub mod centroid;
pub mod components;
pub mod config;
pub mod job;
pub mod local_maxima;
pub mod registry;

use ndarray::Array3;
use tracing::{debug, info};

use crate::error::Result;
use crate::threshold::compute_threshold;
use crate::volume::{CandidatePoint, Volume};

pub use config::{DetectionConfig, DetectionMethod};
pub use job::{spawn_detection, DetectionJob};
pub use registry::detector_for;

/// Produce candidate coordinates from a volume and a threshold.
pub trait CandidateDetector: Send + Sync {
    fn method(&self) -> DetectionMethod;

    fn detect(&self, data: &Array3<f32>, threshold: f32) -> Detection;
}

/// Raw output of a detector.
#[derive(Clone, Debug, Default)]
pub struct Detection {
    pub candidates: Vec<CandidatePoint>,
    /// Binary mask, for methods that binarize the volume.
    pub mask: Option<Array3<bool>>,
}

impl Detection {
    pub fn points(candidates: Vec<CandidatePoint>) -> Self {
        Self {
            candidates,
            mask: None,
        }
    }
}

/// Result of one detection pass.
#[derive(Clone, Debug)]
pub struct DetectionOutcome {
    pub method: DetectionMethod,
    pub threshold: f32,
    pub candidates: Vec<CandidatePoint>,
    pub mask: Option<Array3<bool>>,
}

impl DetectionOutcome {
    /// True when no candidate cleared the threshold. This is a normal
    /// outcome, not an error.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Threshold the volume per `config` and run the configured detector.
pub fn detect(volume: &Volume, config: &DetectionConfig) -> Result<DetectionOutcome> {
    config.validate()?;
    let threshold = compute_threshold(&volume.data, &config.threshold_mode())?;
    Ok(detect_with_threshold(volume, config, threshold))
}

/// Run the configured detector with an explicit threshold.
pub fn detect_with_threshold(
    volume: &Volume,
    config: &DetectionConfig,
    threshold: f32,
) -> DetectionOutcome {
    let detector = detector_for(config);
    debug!(method = %detector.method(), threshold, "Running detector");
    let Detection { candidates, mask } = detector.detect(&volume.data, threshold);
    info!(
        method = %config.method,
        candidates = candidates.len(),
        "Detection complete"
    );
    DetectionOutcome {
        method: config.method,
        threshold,
        candidates,
        mask,
    }
}
