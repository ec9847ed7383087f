use ndarray::{s, Array3};

use crate::volume::{CandidatePoint, Volume};

use super::{Roi, RoiExtraction};

/// Voxel data of one retained bead.
#[derive(Clone, Debug)]
pub struct CroppedBead {
    pub roi: Roi,
    pub data: Array3<f32>,
    /// Bead center in crop-local voxel coordinates.
    pub centroid: CandidatePoint,
}

impl CroppedBead {
    pub fn source_index(&self) -> usize {
        self.roi.source_index
    }
}

/// Copy the voxels inside `roi`.
pub fn crop(volume: &Volume, roi: &Roi) -> Array3<f32> {
    volume
        .data
        .slice(s![roi.z.clone(), roi.y.clone(), roi.x.clone()])
        .to_owned()
}

/// Crop every retained ROI, pairing each with its candidate shifted into
/// crop-local coordinates.
pub fn crop_beads(
    volume: &Volume,
    candidates: &[CandidatePoint],
    extraction: &RoiExtraction,
) -> Vec<CroppedBead> {
    extraction
        .rois
        .iter()
        .filter_map(|roi| {
            let c = candidates.get(roi.source_index)?;
            let origin = roi.origin();
            Some(CroppedBead {
                roi: roi.clone(),
                data: crop(volume, roi),
                centroid: CandidatePoint::new(c.z - origin.z, c.y - origin.y, c.x - origin.x),
            })
        })
        .collect()
}
