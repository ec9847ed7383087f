//! Per-bead regions of interest.
//!
//! Each retained candidate gets an axis-aligned box sized from the nominal
//! bead diameter and the crop factor. Candidates too close to the Z faces,
//! outside the volume, or with an empty box are rejected with a reason.
//! Rejection never reorders: every ROI keeps the index of the candidate it
//! came from.

pub mod crop;
pub mod extract;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BEAD_SIZE, DEFAULT_CROP_FACTOR, DEFAULT_REJECTION_MARGIN};
use crate::error::{BeadError, Result};
use crate::volume::{Axis, CandidatePoint};

pub use crop::{crop, crop_beads, CroppedBead};
pub use extract::extract_rois;

/// ROI sizing and rejection parameters. Lengths are physical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Nominal bead diameter.
    pub bead_size: f64,
    /// Multiplier on the bead radius giving the crop half-extent in Y and X.
    pub crop_factor: f64,
    /// Beads whose center is closer than this to the top or bottom Z face
    /// are rejected.
    pub rejection_margin: f64,
    /// Half-extent of the crop along Z. `None` keeps the full depth.
    pub z_half_extent: Option<f64>,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            bead_size: DEFAULT_BEAD_SIZE,
            crop_factor: DEFAULT_CROP_FACTOR,
            rejection_margin: DEFAULT_REJECTION_MARGIN,
            z_half_extent: None,
        }
    }
}

impl RoiConfig {
    pub fn validate(&self) -> Result<()> {
        positive("bead_size", self.bead_size)?;
        positive("crop_factor", self.crop_factor)?;
        if !(self.rejection_margin.is_finite() && self.rejection_margin >= 0.0) {
            return Err(BeadError::InvalidConfig(format!(
                "rejection_margin must be non-negative, got {}",
                self.rejection_margin
            )));
        }
        if let Some(hz) = self.z_half_extent {
            positive("z_half_extent", hz)?;
        }
        Ok(())
    }

    /// Bead radius in physical units.
    pub fn bead_radius(&self) -> f64 {
        self.bead_size / 2.0
    }
}

pub(crate) fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BeadError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// Axis-aligned box in voxel indices; ranges are half-open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    /// Index of the candidate this box was built for.
    pub source_index: usize,
    pub z: Range<usize>,
    pub y: Range<usize>,
    pub x: Range<usize>,
}

impl Roi {
    pub fn range(&self, axis: Axis) -> &Range<usize> {
        match axis {
            Axis::Z => &self.z,
            Axis::Y => &self.y,
            Axis::X => &self.x,
        }
    }

    /// (depth, height, width) of the box.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.z.len(), self.y.len(), self.x.len())
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty() || self.y.is_empty() || self.x.is_empty()
    }

    /// The three (y, x) corners describing the box in the image plane:
    /// origin, origin shifted to the X end, origin shifted to the Y end.
    /// End coordinates are exclusive.
    pub fn corners(&self) -> [(usize, usize); 3] {
        [
            (self.y.start, self.x.start),
            (self.y.start, self.x.end),
            (self.y.end, self.x.start),
        ]
    }

    /// True when the two boxes share at least one voxel.
    pub fn overlaps(&self, other: &Roi) -> bool {
        Axis::ALL.into_iter().all(|axis| {
            let (a, b) = (self.range(axis), other.range(axis));
            a.start < b.end && b.start < a.end
        })
    }

    /// Box origin as a point, for converting to crop-local coordinates.
    pub fn origin(&self) -> CandidatePoint {
        CandidatePoint::new(self.z.start as f64, self.y.start as f64, self.x.start as f64)
    }
}

/// Why a candidate did not get an ROI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Center not inside the volume (or not finite).
    OutsideVolume,
    /// Center within the rejection margin of the top or bottom Z face.
    NearZFace,
    /// Box has no voxels after clipping.
    EmptyBox,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::OutsideVolume => write!(f, "outside volume"),
            RejectionReason::NearZFace => write!(f, "too close to a Z face"),
            RejectionReason::EmptyBox => write!(f, "empty box after clipping"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub index: usize,
    pub candidate: CandidatePoint,
    pub reason: RejectionReason,
}

/// Output of [`extract_rois`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiExtraction {
    /// Retained boxes, in candidate order.
    pub rois: Vec<Roi>,
    pub rejected: Vec<Rejection>,
    /// Pairs of candidate indices whose retained boxes overlap. Overlapping
    /// boxes are both kept and cropped independently.
    pub overlaps: Vec<(usize, usize)>,
}

impl RoiExtraction {
    /// Indices into the original candidate list, one per retained ROI.
    pub fn retained_indices(&self) -> Vec<usize> {
        self.rois.iter().map(|r| r.source_index).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }
}
