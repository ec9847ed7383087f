use ndarray::{s, Array3};

use crate::consts::{FWHM_PER_SIGMA, GAUSSIAN_PARAM_COUNT, MIN_PROFILE_CONTRAST};
use crate::volume::{Axis, CandidatePoint, PixelSpacing};

use super::gaussian::{GaussianParams, GaussianProfile};
use super::linear_solver::invert;
use super::lm::{hessian_gradient, optimize, LmConfig};
use super::{AxisFit, FitFailure};

/// Intensity line through a bead along one axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub axis: Axis,
    /// Sample positions in physical units from the crop origin.
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
}

impl Profile {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn step(&self) -> f64 {
        match self.positions.as_slice() {
            [a, b, ..] => b - a,
            _ => 1.0,
        }
    }
}

/// Min-max normalize a crop to [0, 1]. `None` for an empty or flat crop.
pub fn normalize_crop(data: &Array3<f32>) -> Option<Array3<f64>> {
    let (min, max) = crate::volume::intensity_range(data)?;
    let range = (max - min) as f64;
    if !(range.is_finite() && range > 0.0) {
        return None;
    }
    Some(data.mapv(|v| ((v - min) as f64 / range).max(0.0)))
}

/// Line through the voxel nearest `center` along `axis`.
pub fn extract_profile(
    normalized: &Array3<f64>,
    center: &CandidatePoint,
    axis: Axis,
    spacing: &PixelSpacing,
) -> Option<Profile> {
    if normalized.is_empty() {
        return None;
    }
    let (d, h, w) = normalized.dim();
    let clamp = |v: f64, n: usize| (v.round().max(0.0) as usize).min(n - 1);
    let (z, y, x) = (clamp(center.z, d), clamp(center.y, h), clamp(center.x, w));

    let line = match axis {
        Axis::Z => normalized.slice(s![.., y, x]),
        Axis::Y => normalized.slice(s![z, .., x]),
        Axis::X => normalized.slice(s![z, y, ..]),
    };
    let step = spacing.get(axis);
    let values: Vec<f64> = line.iter().copied().collect();
    let positions = (0..values.len()).map(|i| i as f64 * step).collect();
    Some(Profile {
        axis,
        positions,
        values,
    })
}

/// Linear-interpolated percentile (`q` in [0, 100]) of sorted data.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 100.0) / 100.0 * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    percentile(sorted, 50.0)
}

/// Starting point for the optimizer: `[amplitude, background, center, sigma]`.
///
/// Background is the median of the samples below the 25th percentile;
/// `projected_center` (physical) is used when it lies on the profile,
/// otherwise the brightest sample.
pub fn initial_guess(profile: &Profile, projected_center: f64) -> Result<[f64; 4], FitFailure> {
    if profile.len() <= GAUSSIAN_PARAM_COUNT {
        return Err(FitFailure::TooFewSamples {
            samples: profile.len(),
        });
    }

    let mut sorted = profile.values.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = percentile(&sorted, 25.0);
    let lower: Vec<f64> = sorted.iter().copied().filter(|&v| v < q1).collect();
    let background = if lower.is_empty() {
        sorted[0]
    } else {
        median(&lower)
    };

    let (peak_index, peak) = profile
        .values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or(FitFailure::TooFewSamples { samples: 0 })?;
    let amplitude = peak - background;
    if !amplitude.is_finite() || amplitude < MIN_PROFILE_CONTRAST {
        return Err(FitFailure::FlatProfile);
    }

    let first = profile.positions[0];
    let last = profile.positions[profile.len() - 1];
    let center = if projected_center.is_finite() && (first..=last).contains(&projected_center) {
        projected_center
    } else {
        profile.positions[peak_index]
    };

    let step = profile.step();
    let (mut sw, mut swx) = (0.0, 0.0);
    for (&x, &v) in profile.positions.iter().zip(&profile.values) {
        let w = (v - background).max(0.0);
        sw += w;
        swx += w * x;
    }
    let sigma = if sw > 0.0 {
        let mean = swx / sw;
        let var = profile
            .positions
            .iter()
            .zip(&profile.values)
            .map(|(&x, &v)| (v - background).max(0.0) * (x - mean).powi(2))
            .sum::<f64>()
            / sw;
        let s = var.sqrt();
        if s.is_finite() && s > 0.0 {
            s.max(step / 2.0)
        } else {
            step
        }
    } else {
        step
    };

    Ok([amplitude, background, center, sigma])
}

/// Covariance `inv(J^T J) * residual_variance` and the per-parameter
/// standard errors. A singular normal matrix gives NaN everywhere; a negative
/// variance gives a NaN uncertainty for that parameter.
pub fn parameter_covariance(
    hessian: &[[f64; 4]; 4],
    residual_variance: f64,
) -> ([[f64; 4]; 4], [f64; 4]) {
    let covariance = match invert(hessian) {
        Some(inv) => inv.map(|row| row.map(|v| v * residual_variance)),
        None => [[f64::NAN; 4]; 4],
    };
    let uncertainty = std::array::from_fn(|i| {
        let var = covariance[i][i];
        if var.is_finite() && var >= 0.0 {
            var.sqrt()
        } else {
            f64::NAN
        }
    });
    (covariance, uncertainty)
}

/// Fit a Gaussian plus offset to one profile and derive its metrics.
pub fn fit_profile(
    profile: &Profile,
    projected_center: f64,
    config: &LmConfig,
) -> Result<AxisFit, FitFailure> {
    let initial = initial_guess(profile, projected_center)?;
    let xs = &profile.positions;
    let ys = &profile.values;
    let outcome = optimize(&GaussianProfile, xs, ys, initial, config)?;
    if outcome.params.iter().any(|p| !p.is_finite()) {
        return Err(FitFailure::NonFinite);
    }

    let dof = (profile.len() - GAUSSIAN_PARAM_COUNT) as f64;
    let residual_variance = outcome.chi2 / dof;
    let (hessian, _) = hessian_gradient(&GaussianProfile, xs, ys, &outcome.params);
    let (covariance, uncertainty) = parameter_covariance(&hessian, residual_variance);

    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let total: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    let r_squared = if total > 0.0 {
        1.0 - outcome.chi2 / total
    } else {
        f64::NAN
    };

    let params = GaussianParams::from_array(outcome.params);
    Ok(AxisFit {
        axis: profile.axis,
        params,
        covariance,
        uncertainty,
        fwhm: params.fwhm(),
        fwhm_uncertainty: FWHM_PER_SIGMA * uncertainty[3],
        r_squared,
        iterations: outcome.iterations,
        samples: profile.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_matches_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
    }

    #[test]
    fn test_profile_along_each_axis() {
        let data = Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (z * 100 + y * 10 + x) as f64);
        let center = CandidatePoint::new(1.0, 2.0, 3.0);
        let spacing = PixelSpacing::new(2.0, 1.0, 0.5);

        let z = extract_profile(&data, &center, Axis::Z, &spacing).unwrap();
        assert_eq!(z.values, vec![23.0, 123.0, 223.0]);
        assert_eq!(z.positions, vec![0.0, 2.0, 4.0]);

        let x = extract_profile(&data, &center, Axis::X, &spacing).unwrap();
        assert_eq!(x.values, vec![120.0, 121.0, 122.0, 123.0, 124.0]);
        assert_eq!(x.positions[1], 0.5);
    }

    #[test]
    fn test_flat_profile_is_rejected() {
        let profile = Profile {
            axis: Axis::X,
            positions: (0..8).map(|i| i as f64).collect(),
            values: vec![0.5; 8],
        };
        assert_eq!(initial_guess(&profile, 3.0), Err(FitFailure::FlatProfile));
    }

    #[test]
    fn test_short_profile_is_rejected() {
        let profile = Profile {
            axis: Axis::Z,
            positions: vec![0.0, 1.0, 2.0],
            values: vec![0.0, 1.0, 0.0],
        };
        assert_eq!(
            initial_guess(&profile, 1.0),
            Err(FitFailure::TooFewSamples { samples: 3 })
        );
    }

    #[test]
    fn test_fit_recovers_sigma() {
        let truth = GaussianParams::from_array([0.9, 0.05, 7.3, 1.6]);
        let positions: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let values = positions.iter().map(|&x| truth.evaluate(x)).collect();
        let profile = Profile {
            axis: Axis::Y,
            positions,
            values,
        };
        let fit = fit_profile(&profile, 7.0, &LmConfig::default()).unwrap();
        assert!((fit.params.sigma - 1.6).abs() < 1e-4);
        assert!((fit.params.center - 7.3).abs() < 1e-4);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn test_singular_normal_matrix_gives_nan_uncertainty() {
        // With zero amplitude, center and sigma have no effect on the model,
        // so their Jacobian columns vanish and J^T J cannot be inverted.
        let positions: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let values = vec![0.5; 12];
        let params = [0.0, 0.5, 6.0, 1.5];
        let (hessian, _) = hessian_gradient(&GaussianProfile, &positions, &values, &params);

        let (covariance, uncertainty) = parameter_covariance(&hessian, 1e-3);
        assert!(covariance.iter().flatten().all(|v| v.is_nan()));
        assert!(uncertainty.iter().all(|u| u.is_nan()));
    }

    #[test]
    fn test_negative_variance_gives_nan_for_that_parameter() {
        let mut hessian = [[0.0; 4]; 4];
        for (i, row) in hessian.iter_mut().enumerate() {
            row[i] = 4.0;
        }
        let (_, uncertainty) = parameter_covariance(&hessian, -1.0);
        assert!(uncertainty.iter().all(|u| u.is_nan()));

        let (covariance, uncertainty) = parameter_covariance(&hessian, 1.0);
        assert_eq!(covariance[2][2], 0.25);
        assert_eq!(uncertainty, [0.5; 4]);
    }
}
