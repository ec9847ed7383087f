//! Binarization thresholds for intensity volumes.
//!
//! A threshold is either a fraction of the volume maximum or the output of
//! one of five histogram-based automatic methods. All functions here are pure:
//! the same volume and mode always give the same value.

pub mod config;
pub mod histogram;
pub mod methods;

use ndarray::Array3;
use tracing::debug;

use crate::consts::THRESHOLD_HISTOGRAM_BINS;
use crate::error::{BeadError, Result};
use crate::volume::intensity_range;

pub use config::{AutoThreshold, ThresholdMode};
pub use histogram::Histogram;

/// Compute the threshold value using the configured mode.
///
/// * `Relative(f)` returns `f * max(volume)`; `f` must lie in [0, 1].
/// * `Auto(method)` fails with [`BeadError::DegenerateInput`] on an empty or
///   constant-valued volume.
pub fn compute_threshold(data: &Array3<f32>, mode: &ThresholdMode) -> Result<f32> {
    let threshold = match *mode {
        ThresholdMode::Relative(fraction) => relative_threshold(data, fraction)?,
        ThresholdMode::Auto(method) => auto_threshold(data, method)?,
    };
    debug!(mode = %mode, threshold, "Threshold computed");
    Ok(threshold)
}

/// `fraction * max(volume)`.
pub fn relative_threshold(data: &Array3<f32>, fraction: f64) -> Result<f32> {
    validate_fraction(fraction)?;
    let (_, max) = intensity_range(data)
        .ok_or_else(|| BeadError::DegenerateInput("volume is empty".into()))?;
    Ok((fraction * max as f64) as f32)
}

/// Histogram-based automatic threshold.
pub fn auto_threshold(data: &Array3<f32>, method: AutoThreshold) -> Result<f32> {
    let hist = Histogram::from_samples(data, THRESHOLD_HISTOGRAM_BINS)?;
    let t = methods::apply(method, &hist)?;
    Ok(t as f32)
}

pub(crate) fn validate_fraction(fraction: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(BeadError::InvalidConfig(format!(
            "relative threshold must be in [0, 1], got {fraction}"
        )));
    }
    Ok(())
}
