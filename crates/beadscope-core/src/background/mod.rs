//! Local background and signal-to-background ratio.
//!
//! Background is sampled in a full 3-D spherical shell around each bead,
//! measured in physical distance so anisotropic voxels give a round shell.

pub mod annulus;
pub mod sbr;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ANNULUS_INNER, DEFAULT_ANNULUS_THICKNESS};
use crate::error::{BeadError, Result};

pub use annulus::AnnulusSpec;
pub use sbr::{estimate_sbr, SbrMeasurement, SbrQuality, SbrReport};

/// Central statistic of the shell intensities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStatistic {
    #[default]
    Mean,
    Median,
}

impl BackgroundStatistic {
    /// `None` for an empty sample. May reorder `samples`.
    pub fn apply(self, samples: &mut [f32]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        match self {
            BackgroundStatistic::Mean => {
                Some(samples.iter().map(|&v| v as f64).sum::<f64>() / samples.len() as f64)
            }
            BackgroundStatistic::Median => {
                samples.sort_unstable_by(|a, b| a.total_cmp(b));
                let mid = samples.len() / 2;
                if samples.len() % 2 == 0 {
                    Some((samples[mid - 1] as f64 + samples[mid] as f64) / 2.0)
                } else {
                    Some(samples[mid] as f64)
                }
            }
        }
    }
}

/// Shell geometry and statistic. Lengths are physical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Gap between the bead surface and the inner edge of the shell.
    pub annulus_inner: f64,
    /// Radial thickness of the shell.
    pub annulus_thickness: f64,
    pub statistic: BackgroundStatistic,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            annulus_inner: DEFAULT_ANNULUS_INNER,
            annulus_thickness: DEFAULT_ANNULUS_THICKNESS,
            statistic: BackgroundStatistic::default(),
        }
    }
}

impl BackgroundConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.annulus_inner.is_finite() && self.annulus_inner >= 0.0) {
            return Err(BeadError::InvalidConfig(format!(
                "annulus_inner must be non-negative, got {}",
                self.annulus_inner
            )));
        }
        crate::roi::positive("annulus_thickness", self.annulus_thickness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        let mut odd = [3.0f32, 1.0, 2.0];
        assert_eq!(BackgroundStatistic::Median.apply(&mut odd), Some(2.0));
        let mut even = [4.0f32, 1.0, 3.0, 2.0];
        assert_eq!(BackgroundStatistic::Median.apply(&mut even), Some(2.5));
    }

    #[test]
    fn test_empty_sample_has_no_statistic() {
        assert_eq!(BackgroundStatistic::Mean.apply(&mut []), None);
    }
}
