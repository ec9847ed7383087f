use ndarray::{Array3, ArrayView3};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{BeadError, Result};

/// A 3-D intensity volume.
/// Samples are non-negative f32 values indexed (z, y, x).
#[derive(Clone, Debug)]
pub struct Volume {
    /// Voxel data, shape = (depth, height, width)
    pub data: Array3<f32>,
}

impl Volume {
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Build a volume from raw samples of any primitive numeric type.
    ///
    /// Samples that cannot be represented as f32 become 0.
    pub fn from_raw<T: ToPrimitive>(
        shape: (usize, usize, usize),
        samples: &[T],
    ) -> Result<Self> {
        let (depth, height, width) = shape;
        if samples.len() != depth * height * width {
            return Err(BeadError::InvalidDimensions {
                depth,
                height,
                width,
            });
        }
        let values: Vec<f32> = samples
            .iter()
            .map(|s| s.to_f32().unwrap_or(0.0))
            .collect();
        let data = Array3::from_shape_vec(shape, values).map_err(|_| {
            BeadError::InvalidDimensions {
                depth,
                height,
                width,
            }
        })?;
        Ok(Self { data })
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// (min, max) over all voxels, or `None` for an empty volume.
    pub fn intensity_range(&self) -> Option<(f32, f32)> {
        intensity_range(&self.data)
    }
}

/// (min, max) over all samples, or `None` for an empty array.
pub fn intensity_range(data: &Array3<f32>) -> Option<(f32, f32)> {
    if data.is_empty() {
        return None;
    }
    let (min, max) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    Some((min, max))
}

/// Physical voxel size along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    pub z: f64,
    pub y: f64,
    pub x: f64,
}

impl PixelSpacing {
    pub fn new(z: f64, y: f64, x: f64) -> Self {
        Self { z, y, x }
    }

    /// Same spacing along every axis.
    pub fn isotropic(size: f64) -> Self {
        Self::new(size, size, size)
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Z => self.z,
            Axis::Y => self.y,
            Axis::X => self.x,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.z, self.y, self.x]
    }

    pub fn validate(&self) -> Result<()> {
        for axis in Axis::ALL {
            let s = self.get(axis);
            if !(s.is_finite() && s > 0.0) {
                return Err(BeadError::InvalidConfig(format!(
                    "pixel spacing along {axis} must be positive, got {s}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for PixelSpacing {
    fn default() -> Self {
        Self::isotropic(1.0)
    }
}

/// A candidate bead position in voxel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidatePoint {
    pub z: f64,
    pub y: f64,
    pub x: f64,
}

impl CandidatePoint {
    pub fn new(z: f64, y: f64, x: f64) -> Self {
        Self { z, y, x }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Z => self.z,
            Axis::Y => self.y,
            Axis::X => self.x,
        }
    }

    /// Euclidean distance in voxel units.
    pub fn distance(&self, other: &CandidatePoint) -> f64 {
        let dz = self.z - other.z;
        let dy = self.y - other.y;
        let dx = self.x - other.x;
        (dz * dz + dy * dy + dx * dx).sqrt()
    }
}

/// Volume axis, in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Z,
    Y,
    X,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Z, Axis::Y, Axis::X];

    pub fn index(self) -> usize {
        match self {
            Axis::Z => 0,
            Axis::Y => 1,
            Axis::X => 2,
        }
    }

    pub fn ndarray_axis(self) -> ndarray::Axis {
        ndarray::Axis(self.index())
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Z => write!(f, "Z"),
            Axis::Y => write!(f, "Y"),
            Axis::X => write!(f, "X"),
        }
    }
}
