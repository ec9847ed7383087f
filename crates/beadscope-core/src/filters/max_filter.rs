use ndarray::{Array3, ArrayView1, ArrayViewMut1, Zip};

use crate::consts::PARALLEL_VOXEL_THRESHOLD;
use crate::volume::Axis;

/// Grey-level dilation with a cubic window of half-width `radius` voxels.
///
/// Computed as three separable 1-D running maxima, which for a box window is
/// exact. Borders use the nearest valid voxel.
pub fn maximum_filter(data: &Array3<f32>, radius: usize) -> Array3<f32> {
    maximum_filter_anisotropic(data, [radius, radius, radius])
}

/// Maximum filter with a separate half-width per axis.
pub fn maximum_filter_anisotropic(data: &Array3<f32>, radii: [usize; 3]) -> Array3<f32> {
    let mut result = data.clone();
    for axis in Axis::ALL {
        let r = radii[axis.index()];
        if r == 0 {
            continue;
        }
        result = max_along_axis(&result, r, axis);
    }
    result
}

fn max_along_axis(data: &Array3<f32>, radius: usize, axis: Axis) -> Array3<f32> {
    let mut result = Array3::<f32>::zeros(data.raw_dim());

    let max_lane = |mut dst: ArrayViewMut1<f32>, src: ArrayView1<f32>| {
        let n = src.len();
        for (i, out) in dst.iter_mut().enumerate() {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(n - 1);
            let mut m = f32::NEG_INFINITY;
            for j in lo..=hi {
                m = m.max(src[j]);
            }
            *out = m;
        }
    };

    let zip = Zip::from(result.lanes_mut(axis.ndarray_axis())).and(data.lanes(axis.ndarray_axis()));
    if data.len() >= PARALLEL_VOXEL_THRESHOLD {
        zip.par_for_each(max_lane);
    } else {
        zip.for_each(max_lane);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximum_filter_spreads_peak() {
        let mut data = Array3::<f32>::zeros((5, 5, 5));
        data[[2, 2, 2]] = 7.0;
        let filtered = maximum_filter(&data, 1);
        assert_eq!(filtered[[1, 1, 1]], 7.0);
        assert_eq!(filtered[[3, 3, 3]], 7.0);
        assert_eq!(filtered[[0, 2, 2]], 0.0);
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let data = Array3::from_shape_fn((2, 3, 4), |(z, y, x)| (z * 12 + y * 4 + x) as f32);
        assert_eq!(maximum_filter(&data, 0), data);
    }
}
