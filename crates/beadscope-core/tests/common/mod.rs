#![allow(dead_code)]

use ndarray::Array3;

use beadscope_core::background::BackgroundConfig;
use beadscope_core::pipeline::AnalysisConfig;
use beadscope_core::roi::RoiConfig;
use beadscope_core::volume::{CandidatePoint, Volume};

/// One synthetic bead: isotropic Gaussian of the given amplitude and sigma
/// (voxels) centered at `center`.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticBead {
    pub center: CandidatePoint,
    pub amplitude: f32,
    pub sigma: f64,
}

impl SyntheticBead {
    pub fn new(z: f64, y: f64, x: f64, amplitude: f32, sigma: f64) -> Self {
        Self {
            center: CandidatePoint::new(z, y, x),
            amplitude,
            sigma,
        }
    }
}

/// Volume of the given shape holding the sum of `beads` over a constant
/// `background`.
pub fn bead_volume(shape: (usize, usize, usize), beads: &[SyntheticBead], background: f32) -> Volume {
    let data = Array3::from_shape_fn(shape, |(z, y, x)| {
        let mut v = background;
        for b in beads {
            let dz = z as f64 - b.center.z;
            let dy = y as f64 - b.center.y;
            let dx = x as f64 - b.center.x;
            let r2 = dz * dz + dy * dy + dx * dx;
            v += b.amplitude * (-r2 / (2.0 * b.sigma * b.sigma)).exp() as f32;
        }
        v
    });
    Volume::new(data)
}

/// 20x50x50 zeros with one bead (amplitude 100, sigma 2) at (10, 25, 25).
pub fn single_bead_volume() -> Volume {
    bead_volume(
        (20, 50, 50),
        &[SyntheticBead::new(10.0, 25.0, 25.0, 100.0, 2.0)],
        0.0,
    )
}

/// Settings for the single-bead scenario: relative threshold 0.3,
/// min distance 3, bead size 6, crop factor 2, unit spacing.
pub fn single_bead_config() -> AnalysisConfig {
    AnalysisConfig {
        roi: RoiConfig {
            bead_size: 6.0,
            crop_factor: 2.0,
            rejection_margin: 2.0,
            z_half_extent: None,
        },
        background: BackgroundConfig {
            annulus_inner: 1.0,
            annulus_thickness: 2.0,
            ..BackgroundConfig::default()
        },
        ..AnalysisConfig::default()
    }
    .with_rel_threshold(0.3)
    .with_min_distance(3)
}

/// True when `a` and `b` are within `tol` voxels along every axis.
pub fn near(a: &CandidatePoint, b: &CandidatePoint, tol: f64) -> bool {
    (a.z - b.z).abs() <= tol && (a.y - b.y).abs() <= tol && (a.x - b.x).abs() <= tol
}
