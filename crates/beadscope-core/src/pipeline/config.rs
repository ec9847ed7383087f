use serde::{Deserialize, Serialize};

use crate::background::BackgroundConfig;
use crate::detection::{DetectionConfig, DetectionMethod};
use crate::error::Result;
use crate::fit::FitConfig;
use crate::resolution::AcquisitionParams;
use crate::roi::RoiConfig;
use crate::threshold::AutoThreshold;
use crate::volume::PixelSpacing;

/// Everything one analysis run needs. Built once and never mutated while
/// the run is in progress; the `with_*` methods return a new value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub roi: RoiConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub fit: FitConfig,
    #[serde(default)]
    pub pixel_spacing: PixelSpacing,
    /// Optical setup; enables the theoretical resolution in the report.
    pub acquisition: Option<AcquisitionParams>,
}

impl AnalysisConfig {
    /// Reject out-of-range settings before any computation starts.
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.roi.validate()?;
        self.background.validate()?;
        self.fit.validate()?;
        self.pixel_spacing.validate()?;
        if let Some(acquisition) = &self.acquisition {
            acquisition.validate()?;
        }
        Ok(())
    }

    pub fn with_method(mut self, method: DetectionMethod) -> Self {
        self.detection.method = method;
        self
    }

    pub fn with_rel_threshold(mut self, fraction: f64) -> Self {
        self.detection.rel_threshold = fraction;
        self.detection.auto_threshold = false;
        self
    }

    pub fn with_auto_threshold(mut self, method: AutoThreshold) -> Self {
        self.detection.threshold_choice = method;
        self.detection.auto_threshold = true;
        self
    }

    pub fn with_min_distance(mut self, min_distance: usize) -> Self {
        self.detection.min_distance = min_distance;
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.detection.sigma = sigma;
        self
    }

    pub fn with_bead_size(mut self, bead_size: f64) -> Self {
        self.roi.bead_size = bead_size;
        self
    }

    pub fn with_crop_factor(mut self, crop_factor: f64) -> Self {
        self.roi.crop_factor = crop_factor;
        self
    }

    pub fn with_rejection_margin(mut self, margin: f64) -> Self {
        self.roi.rejection_margin = margin;
        self
    }

    pub fn with_annulus(mut self, inner: f64, thickness: f64) -> Self {
        self.background.annulus_inner = inner;
        self.background.annulus_thickness = thickness;
        self
    }

    pub fn with_pixel_spacing(mut self, spacing: PixelSpacing) -> Self {
        self.pixel_spacing = spacing;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.fit.workers = workers;
        self
    }

    pub fn with_acquisition(mut self, acquisition: AcquisitionParams) -> Self {
        self.acquisition = Some(acquisition);
        self
    }
}
