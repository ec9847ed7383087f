use std::ops::Range;

use tracing::{debug, info};

use crate::error::Result;
use crate::volume::{Axis, CandidatePoint, PixelSpacing, Volume};

use super::{Rejection, RejectionReason, Roi, RoiConfig, RoiExtraction};

/// Build one box per candidate and reject the ones that cannot be profiled.
///
/// Y and X half-extents are `bead_radius / spacing * crop_factor` voxels,
/// clipped to the volume. Z spans the full depth unless
/// `config.z_half_extent` is set. An empty candidate list yields an empty
/// extraction.
pub fn extract_rois(
    volume: &Volume,
    candidates: &[CandidatePoint],
    config: &RoiConfig,
    spacing: &PixelSpacing,
) -> Result<RoiExtraction> {
    config.validate()?;
    spacing.validate()?;

    let shape = volume.data.dim();
    let dims = [shape.0, shape.1, shape.2];
    let mut extraction = RoiExtraction::default();

    for (index, candidate) in candidates.iter().enumerate() {
        match roi_for(index, candidate, dims, config, spacing) {
            Ok(roi) => extraction.rois.push(roi),
            Err(reason) => {
                debug!(index, %reason, "Candidate rejected");
                extraction.rejected.push(Rejection {
                    index,
                    candidate: *candidate,
                    reason,
                });
            }
        }
    }

    for (i, a) in extraction.rois.iter().enumerate() {
        for b in &extraction.rois[i + 1..] {
            if a.overlaps(b) {
                extraction.overlaps.push((a.source_index, b.source_index));
            }
        }
    }

    info!(
        candidates = candidates.len(),
        retained = extraction.rois.len(),
        rejected = extraction.rejected.len(),
        overlapping_pairs = extraction.overlaps.len(),
        "ROI extraction complete"
    );
    Ok(extraction)
}

fn roi_for(
    index: usize,
    candidate: &CandidatePoint,
    dims: [usize; 3],
    config: &RoiConfig,
    spacing: &PixelSpacing,
) -> std::result::Result<Roi, RejectionReason> {
    for axis in Axis::ALL {
        let c = candidate.get(axis);
        let n = dims[axis.index()];
        if !c.is_finite() || n == 0 || c < 0.0 || c > (n - 1) as f64 {
            return Err(RejectionReason::OutsideVolume);
        }
    }

    let depth = dims[0];
    let cz = candidate.z;
    let to_top = cz * spacing.z;
    let to_bottom = ((depth - 1) as f64 - cz) * spacing.z;
    if to_top < config.rejection_margin || to_bottom < config.rejection_margin {
        return Err(RejectionReason::NearZFace);
    }

    let lateral = |axis: Axis| {
        let half = config.bead_radius() / spacing.get(axis) * config.crop_factor;
        clipped_span(candidate.get(axis), half, dims[axis.index()])
    };
    let z = match config.z_half_extent {
        Some(hz) => clipped_span(cz, hz / spacing.z, depth),
        None => 0..depth,
    };

    let roi = Roi {
        source_index: index,
        z,
        y: lateral(Axis::Y),
        x: lateral(Axis::X),
    };
    if roi.is_empty() {
        return Err(RejectionReason::EmptyBox);
    }
    Ok(roi)
}

/// `[floor(c - half), floor(c + half)]` as a half-open range clipped to `0..n`.
fn clipped_span(center: f64, half: f64, n: usize) -> Range<usize> {
    let start = (center - half).floor().max(0.0) as usize;
    let end = ((center + half).floor() + 1.0).clamp(0.0, n as f64) as usize;
    start.min(end)..end
}
