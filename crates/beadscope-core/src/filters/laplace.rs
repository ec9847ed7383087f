use ndarray::Array3;
use rayon::prelude::*;

use crate::consts::PARALLEL_VOXEL_THRESHOLD;

/// Discrete 3-D Laplacian (7-point stencil) with clamped borders.
pub fn laplacian(data: &Array3<f32>) -> Array3<f32> {
    let (d, h, w) = data.dim();
    if data.is_empty() {
        return data.clone();
    }

    let at = |z: isize, y: isize, x: isize| -> f32 {
        let z = z.clamp(0, d as isize - 1) as usize;
        let y = y.clamp(0, h as isize - 1) as usize;
        let x = x.clamp(0, w as isize - 1) as usize;
        data[[z, y, x]]
    };

    let plane = |z: usize| -> Vec<f32> {
        let mut out = Vec::with_capacity(h * w);
        let zi = z as isize;
        for y in 0..h as isize {
            for x in 0..w as isize {
                let centre = at(zi, y, x);
                let lap = at(zi - 1, y, x)
                    + at(zi + 1, y, x)
                    + at(zi, y - 1, x)
                    + at(zi, y + 1, x)
                    + at(zi, y, x - 1)
                    + at(zi, y, x + 1)
                    - 6.0 * centre;
                out.push(lap);
            }
        }
        out
    };

    let planes: Vec<Vec<f32>> = if data.len() >= PARALLEL_VOXEL_THRESHOLD {
        (0..d).into_par_iter().map(plane).collect()
    } else {
        (0..d).map(plane).collect()
    };

    let flat: Vec<f32> = planes.into_iter().flatten().collect();
    Array3::from_shape_vec((d, h, w), flat).unwrap_or_else(|_| Array3::zeros((d, h, w)))
}

/// Scale-normalized Laplacian-of-Gaussian response, `-sigma^2 * LoG`.
/// Bright blobs give positive peaks.
pub fn normalized_log(data: &Array3<f32>, sigma: f64) -> Array3<f32> {
    let blurred = super::gaussian_blur::gaussian_blur_volume(data, sigma);
    let scale = -(sigma * sigma) as f32;
    laplacian(&blurred).mapv_into(|v| v * scale)
}
