use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};
use ndarray::{s, Array2, Array3};
use tracing::{debug, info};

use crate::error::{BeadError, Result};
use crate::volume::Volume;

const SLICE_EXTENSIONS: [&str; 3] = ["tif", "tiff", "png"];

fn is_slice_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SLICE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// TIFF and PNG files in `dir`, sorted by file name.
pub fn list_slices(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_slice_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load one grayscale slice. Samples keep their raw 16-bit counts.
pub fn load_slice(path: &Path) -> Result<Array2<f32>> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    let values: Vec<f32> = gray.pixels().map(|p| p.0[0] as f32).collect();
    Array2::from_shape_vec((h as usize, w as usize), values).map_err(|_| {
        BeadError::InvalidDimensions {
            depth: 1,
            height: h as usize,
            width: w as usize,
        }
    })
}

/// Load a Z-stack from a directory with one 2-D image per slice.
pub fn load_stack(dir: &Path) -> Result<Volume> {
    let paths = list_slices(dir)?;
    if paths.is_empty() {
        return Err(BeadError::NoSlices(dir.to_path_buf()));
    }
    info!(dir = %dir.display(), slices = paths.len(), "Loading Z-stack");
    load_stack_files(&paths)
}

/// Load a Z-stack from explicit slice files, in the given order.
pub fn load_stack_files(paths: &[PathBuf]) -> Result<Volume> {
    let Some(first) = paths.first() else {
        return Err(BeadError::NoSlices(PathBuf::new()));
    };
    let first = load_slice(first)?;
    let (h, w) = first.dim();
    let mut data = Array3::<f32>::zeros((paths.len(), h, w));
    data.slice_mut(s![0, .., ..]).assign(&first);

    for (z, path) in paths.iter().enumerate().skip(1) {
        let slice = load_slice(path)?;
        if slice.dim() != (h, w) {
            return Err(BeadError::InvalidDimensions {
                depth: z + 1,
                height: slice.dim().0,
                width: slice.dim().1,
            });
        }
        data.slice_mut(s![z, .., ..]).assign(&slice);
    }
    debug!(depth = paths.len(), height = h, width = w, "Z-stack loaded");
    Ok(Volume::new(data))
}

/// Write a volume as 16-bit TIFF slices `{stem}_z000.tif`, `{stem}_z001.tif`, ...
///
/// Intensities are rounded and clamped to the 16-bit range.
pub fn save_stack(data: &Array3<f32>, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let (d, h, w) = data.dim();
    let mut written = Vec::with_capacity(d);

    for z in 0..d {
        let pixels: Vec<u16> = data
            .slice(s![z, .., ..])
            .iter()
            .map(|&v| v.round().clamp(0.0, 65535.0) as u16)
            .collect();
        let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
            .ok_or(BeadError::InvalidDimensions {
                depth: d,
                height: h,
                width: w,
            })?;
        let path = dir.join(format!("{stem}_z{z:03}.tif"));
        img.save(&path)?;
        written.push(path);
    }
    Ok(written)
}
