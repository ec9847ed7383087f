use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::SBR_BACKGROUND_FLOOR;
use crate::error::{BeadError, Result};
use crate::roi::CroppedBead;
use crate::volume::PixelSpacing;

use super::annulus::AnnulusSpec;
use super::{BackgroundConfig, BackgroundStatistic};

/// Data-quality flag attached to each SBR measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SbrQuality {
    Ok,
    /// Background was below the floor and was replaced by it. The SBR is
    /// finite but excluded from the mean.
    BackgroundFloored,
    /// The shell held no voxels; SBR is NaN and excluded from the mean.
    NoShellVoxels,
}

impl std::fmt::Display for SbrQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SbrQuality::Ok => write!(f, "ok"),
            SbrQuality::BackgroundFloored => write!(f, "background floored"),
            SbrQuality::NoShellVoxels => write!(f, "no shell voxels"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SbrMeasurement {
    /// Index of the candidate the bead came from.
    pub index: usize,
    pub signal: f64,
    pub background: f64,
    pub sbr: f64,
    pub shell_voxels: usize,
    pub quality: SbrQuality,
}

impl SbrMeasurement {
    /// Whether this measurement enters the batch mean.
    pub fn is_valid(&self) -> bool {
        self.quality == SbrQuality::Ok
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SbrReport {
    /// One entry per bead, in input order.
    pub per_bead: Vec<SbrMeasurement>,
    /// Mean over valid measurements, `None` if there are none.
    pub mean_sbr: Option<f64>,
}

/// Signal-to-background ratio of every cropped bead.
///
/// Signal is the peak inside the bead radius; background is the mean (or
/// median) of the shell voxels. Fails with [`BeadError::EmptyBatch`] when
/// `beads` is empty.
pub fn estimate_sbr(
    beads: &[CroppedBead],
    bead_radius: f64,
    config: &BackgroundConfig,
    spacing: &PixelSpacing,
) -> Result<SbrReport> {
    if beads.is_empty() {
        return Err(BeadError::EmptyBatch);
    }
    config.validate()?;
    spacing.validate()?;

    let annulus = AnnulusSpec {
        bead_radius,
        inner_gap: config.annulus_inner,
        thickness: config.annulus_thickness,
    };

    let per_bead: Vec<SbrMeasurement> = beads
        .par_iter()
        .map(|bead| measure(bead, &annulus, config.statistic, spacing))
        .collect();

    for m in per_bead.iter().filter(|m| m.quality != SbrQuality::Ok) {
        warn!(index = m.index, quality = %m.quality, "SBR data-quality condition");
    }

    let valid: Vec<f64> = per_bead
        .iter()
        .filter(|m| m.is_valid())
        .map(|m| m.sbr)
        .collect();
    let mean_sbr = if valid.is_empty() {
        None
    } else {
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    };

    info!(
        beads = per_bead.len(),
        valid = valid.len(),
        mean_sbr = mean_sbr.unwrap_or(f64::NAN),
        "SBR estimation complete"
    );
    Ok(SbrReport { per_bead, mean_sbr })
}

fn measure(
    bead: &CroppedBead,
    annulus: &AnnulusSpec,
    statistic: BackgroundStatistic,
    spacing: &PixelSpacing,
) -> SbrMeasurement {
    let signal = annulus
        .core_peak(&bead.data, &bead.centroid, spacing)
        .map_or(f64::NAN, |v| v as f64);
    let mut shell = annulus.shell_samples(&bead.data, &bead.centroid, spacing);
    let shell_voxels = shell.len();

    let Some(raw_background) = statistic.apply(&mut shell) else {
        return SbrMeasurement {
            index: bead.source_index(),
            signal,
            background: f64::NAN,
            sbr: f64::NAN,
            shell_voxels,
            quality: SbrQuality::NoShellVoxels,
        };
    };

    let (background, quality) = if raw_background < SBR_BACKGROUND_FLOOR {
        (SBR_BACKGROUND_FLOOR, SbrQuality::BackgroundFloored)
    } else {
        (raw_background, SbrQuality::Ok)
    };

    SbrMeasurement {
        index: bead.source_index(),
        signal,
        background,
        sbr: signal / background,
        shell_voxels,
        quality,
    }
}
