//! Gaussian profile fitting and PSF resolution metrics.
//!
//! For every bead, the crop is normalized to [0, 1] and the line through the
//! bead center is fitted along Z, Y and X independently. A failed axis is
//! recorded in place and never aborts the bead or the batch.

pub mod gaussian;
pub mod linear_solver;
pub mod lm;
pub mod profile;

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{BeadError, Result};
use crate::roi::CroppedBead;
use crate::volume::{Axis, PixelSpacing};

pub use gaussian::{GaussianParams, GaussianProfile};
pub use lm::LmConfig;
pub use profile::{extract_profile, fit_profile, normalize_crop, parameter_covariance, Profile};

/// Why one axis of one bead could not be fitted.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitFailure {
    #[error("profile has {samples} samples, too few for a 4-parameter fit")]
    TooFewSamples { samples: usize },

    #[error("profile has no contrast above its background")]
    FlatProfile,

    #[error("Jacobian is singular")]
    SingularJacobian,

    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("fit produced non-finite values")]
    NonFinite,
}

/// A successful single-axis fit. Positions and widths are physical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisFit {
    pub axis: Axis,
    pub params: GaussianParams,
    /// Parameter covariance, `inv(J^T J) * RSS / (n - 4)`; NaN when the
    /// normal matrix is singular.
    pub covariance: [[f64; 4]; 4],
    /// Square roots of the covariance diagonal, NaN where undefined.
    pub uncertainty: [f64; 4],
    pub fwhm: f64,
    pub fwhm_uncertainty: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    pub iterations: usize,
    pub samples: usize,
}

pub type AxisResult = std::result::Result<AxisFit, FitFailure>;

/// Fits of one bead, indexed by the candidate it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub index: usize,
    /// Z, Y, X.
    pub axes: [AxisResult; 3],
}

impl FitResult {
    pub fn axis(&self, axis: Axis) -> &AxisResult {
        &self.axes[axis.index()]
    }

    pub fn fwhm(&self) -> [Option<f64>; 3] {
        self.axes.each_ref().map(|a| a.as_ref().ok().map(|f| f.fwhm))
    }

    pub fn r_squared(&self) -> [Option<f64>; 3] {
        self.axes
            .each_ref()
            .map(|a| a.as_ref().ok().map(|f| f.r_squared))
    }

    /// True when all three axes were fitted.
    pub fn is_complete(&self) -> bool {
        self.axes.iter().all(|a| a.is_ok())
    }
}

/// Fitting settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Worker threads for per-bead fits; 0 uses one per core.
    pub workers: usize,
    pub optimizer: LmConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            optimizer: LmConfig::default(),
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.optimizer.max_iterations == 0 {
            return Err(BeadError::InvalidConfig(
                "fit max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Fit the three axis profiles of one bead.
pub fn fit_bead(bead: &CroppedBead, spacing: &PixelSpacing, config: &LmConfig) -> FitResult {
    let index = bead.source_index();
    let Some(normalized) = normalize_crop(&bead.data) else {
        return FitResult {
            index,
            axes: std::array::from_fn(|_| Err(FitFailure::FlatProfile)),
        };
    };

    let axes = Axis::ALL.map(|axis| {
        let profile = extract_profile(&normalized, &bead.centroid, axis, spacing)
            .ok_or(FitFailure::TooFewSamples { samples: 0 })?;
        let projected = bead.centroid.get(axis) * spacing.get(axis);
        fit_profile(&profile, projected, config)
    });
    FitResult { index, axes }
}

/// Fit every bead on a pool of `config.workers` threads.
///
/// Results come back in input order, each carrying its candidate index.
/// Calls `on_progress(beads_done)` as beads complete.
pub fn fit_profiles(
    beads: &[CroppedBead],
    spacing: &PixelSpacing,
    config: &FitConfig,
    on_progress: impl Fn(usize) + Send + Sync,
) -> Result<Vec<FitResult>> {
    config.validate()?;
    spacing.validate()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| BeadError::WorkerPool(e.to_string()))?;

    let done = AtomicUsize::new(0);
    let results: Vec<FitResult> = pool.install(|| {
        beads
            .par_iter()
            .map(|bead| {
                let result = fit_bead(bead, spacing, &config.optimizer);
                let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
                on_progress(completed);
                result
            })
            .collect()
    });

    for result in &results {
        for (axis, fit) in Axis::ALL.iter().zip(&result.axes) {
            if let Err(failure) = fit {
                warn!(index = result.index, %axis, %failure, "Profile fit failed");
            }
        }
    }
    info!(
        beads = results.len(),
        complete = results.iter().filter(|r| r.is_complete()).count(),
        "Profile fitting complete"
    );
    Ok(results)
}
