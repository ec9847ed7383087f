use ndarray::{Array3, ArrayView1, ArrayViewMut1, Zip};

use crate::consts::{GAUSSIAN_TRUNCATE, PARALLEL_VOXEL_THRESHOLD};
use crate::volume::Axis;

/// Apply an isotropic Gaussian blur (sigma in voxels) using separable 1D
/// convolution along Z, Y and X.
pub fn gaussian_blur_volume(data: &Array3<f32>, sigma: f64) -> Array3<f32> {
    gaussian_blur_anisotropic(data, [sigma, sigma, sigma])
}

/// Apply a Gaussian blur with a separate sigma (in voxels) per axis.
/// A non-positive sigma leaves that axis untouched.
pub fn gaussian_blur_anisotropic(data: &Array3<f32>, sigmas: [f64; 3]) -> Array3<f32> {
    let mut result = data.clone();
    for axis in Axis::ALL {
        let sigma = sigmas[axis.index()];
        if sigma <= 0.0 {
            continue;
        }
        let kernel = make_gaussian_kernel(sigma);
        result = convolve_axis(&result, &kernel, axis);
    }
    result
}

pub(crate) fn make_gaussian_kernel(sigma: f64) -> Vec<f32> {
    let radius = (sigma * GAUSSIAN_TRUNCATE).ceil().max(1.0) as usize;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f64 - radius as f64;
        *k = (-x * x / s2).exp() as f32;
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

/// Convolve every lane along `axis` with `kernel`, clamping at the borders.
pub(crate) fn convolve_axis(data: &Array3<f32>, kernel: &[f32], axis: Axis) -> Array3<f32> {
    let mut result = Array3::<f32>::zeros(data.raw_dim());
    let radius = kernel.len() / 2;

    let convolve_lane = |mut dst: ArrayViewMut1<f32>, src: ArrayView1<f32>| {
        let n = src.len() as isize;
        for (i, out) in dst.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let j = (i as isize + ki as isize - radius as isize).clamp(0, n - 1) as usize;
                sum += src[j] * kv;
            }
            *out = sum;
        }
    };

    let zip = Zip::from(result.lanes_mut(axis.ndarray_axis())).and(data.lanes(axis.ndarray_axis()));
    if data.len() >= PARALLEL_VOXEL_THRESHOLD {
        zip.par_for_each(convolve_lane);
    } else {
        zip.for_each(convolve_lane);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_normalized() {
        let k = make_gaussian_kernel(2.0);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(k.len() % 2, 1);
    }

    #[test]
    fn test_blur_preserves_constant() {
        let data = Array3::<f32>::from_elem((5, 6, 7), 3.0);
        let blurred = gaussian_blur_volume(&data, 1.5);
        assert!(blurred.iter().all(|&v| (v - 3.0).abs() < 1e-4));
    }

    #[test]
    fn test_blur_spreads_impulse_symmetrically() {
        let mut data = Array3::<f32>::zeros((9, 9, 9));
        data[[4, 4, 4]] = 1.0;
        let blurred = gaussian_blur_volume(&data, 1.0);
        assert!(blurred[[4, 4, 4]] < 1.0);
        assert!((blurred[[3, 4, 4]] - blurred[[5, 4, 4]]).abs() < 1e-6);
        assert!((blurred[[4, 3, 4]] - blurred[[4, 4, 5]]).abs() < 1e-6);
    }
}
