use ndarray::Array3;

use crate::volume::{CandidatePoint, PixelSpacing};

/// Hollow spherical shell around a bead, in physical units.
///
/// A voxel belongs to the shell when its physical distance `d` from the bead
/// center satisfies `inner_radius() <= d < outer_radius()`. The shell is
/// clipped to the crop: voxels that would fall outside are simply absent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnulusSpec {
    pub bead_radius: f64,
    /// Gap between the bead surface and the shell.
    pub inner_gap: f64,
    pub thickness: f64,
}

impl AnnulusSpec {
    pub fn inner_radius(&self) -> f64 {
        self.bead_radius + self.inner_gap
    }

    pub fn outer_radius(&self) -> f64 {
        self.inner_radius() + self.thickness
    }

    /// Intensities of the shell voxels of `data`.
    pub fn shell_samples(
        &self,
        data: &Array3<f32>,
        center: &CandidatePoint,
        spacing: &PixelSpacing,
    ) -> Vec<f32> {
        let (inner, outer) = (self.inner_radius(), self.outer_radius());
        data.indexed_iter()
            .filter(|&(idx, _)| {
                let d = physical_distance(idx, center, spacing);
                d >= inner && d < outer
            })
            .map(|(_, &v)| v)
            .collect()
    }

    /// Peak intensity inside the bead radius, falling back to the voxel
    /// nearest the center when the radius is smaller than one voxel.
    pub fn core_peak(
        &self,
        data: &Array3<f32>,
        center: &CandidatePoint,
        spacing: &PixelSpacing,
    ) -> Option<f32> {
        let core = data
            .indexed_iter()
            .filter(|&(idx, _)| physical_distance(idx, center, spacing) <= self.bead_radius)
            .map(|(_, &v)| v)
            .reduce(f32::max);
        core.or_else(|| nearest_voxel(data, center).map(|idx| data[idx]))
    }
}

pub(crate) fn physical_distance(
    (z, y, x): (usize, usize, usize),
    center: &CandidatePoint,
    spacing: &PixelSpacing,
) -> f64 {
    let dz = (z as f64 - center.z) * spacing.z;
    let dy = (y as f64 - center.y) * spacing.y;
    let dx = (x as f64 - center.x) * spacing.x;
    (dz * dz + dy * dy + dx * dx).sqrt()
}

/// Index of the voxel nearest `point`, clamped into the array.
pub(crate) fn nearest_voxel(data: &Array3<f32>, point: &CandidatePoint) -> Option<[usize; 3]> {
    if data.is_empty() {
        return None;
    }
    let (d, h, w) = data.dim();
    let clamp = |v: f64, n: usize| (v.round().max(0.0) as usize).min(n - 1);
    Some([clamp(point.z, d), clamp(point.y, h), clamp(point.x, w)])
}
