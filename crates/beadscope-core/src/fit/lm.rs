//! Levenberg-Marquardt least squares for 1-D profile models.

use serde::{Deserialize, Serialize};

use super::linear_solver::solve;
use super::FitFailure;

/// Damping beyond this means no downhill step exists at the current point.
const MAX_LAMBDA: f64 = 1e10;

/// Optimizer settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    pub max_iterations: usize,
    /// Stop when an accepted step lowers the residual sum of squares by
    /// less than this fraction.
    pub ftol: f64,
    /// Stop when every parameter changes by less than this fraction.
    pub xtol: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: crate::consts::DEFAULT_FIT_MAX_ITERATIONS,
            ftol: 1e-10,
            xtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
        }
    }
}

/// Converged optimizer state.
#[derive(Clone, Copy, Debug)]
pub struct LmOutcome<const N: usize> {
    pub params: [f64; N],
    /// Residual sum of squares at `params`.
    pub chi2: f64,
    pub iterations: usize,
}

/// A model `y = f(x; params)` with an analytic Jacobian.
pub trait ProfileModel<const N: usize> {
    fn evaluate(&self, x: f64, params: &[f64; N]) -> f64;

    fn jacobian_row(&self, x: f64, params: &[f64; N]) -> [f64; N];

    /// Project parameters back into their valid domain after a step.
    fn constrain(&self, _params: &mut [f64; N]) {}
}

/// Minimize the residual sum of squares of `model` over the samples.
pub fn optimize<const N: usize, M: ProfileModel<N>>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    initial: [f64; N],
    config: &LmConfig,
) -> Result<LmOutcome<N>, FitFailure> {
    let mut params = initial;
    let mut lambda = config.initial_lambda;
    let mut chi2 = residual_sum_of_squares(model, xs, ys, &params);
    if !chi2.is_finite() {
        return Err(FitFailure::NonFinite);
    }

    for iteration in 1..=config.max_iterations {
        if chi2 <= f64::MIN_POSITIVE {
            return Ok(LmOutcome {
                params,
                chi2,
                iterations: iteration - 1,
            });
        }

        let (hessian, gradient) = hessian_gradient(model, xs, ys, &params);
        let mut damped = hessian;
        for (i, row) in damped.iter_mut().enumerate() {
            row[i] *= 1.0 + lambda;
        }

        let Some(delta) = solve(&damped, &gradient) else {
            lambda *= config.lambda_up;
            if lambda > MAX_LAMBDA {
                return Err(FitFailure::SingularJacobian);
            }
            continue;
        };

        let mut trial = params;
        for (p, d) in trial.iter_mut().zip(delta.iter()) {
            *p += d;
        }
        model.constrain(&mut trial);
        let trial_chi2 = residual_sum_of_squares(model, xs, ys, &trial);

        if trial_chi2.is_finite() && trial_chi2 < chi2 {
            let relative_drop = (chi2 - trial_chi2) / chi2;
            let small_step = params
                .iter()
                .zip(trial.iter())
                .all(|(&old, &new)| (new - old).abs() <= config.xtol * (old.abs() + config.xtol));
            params = trial;
            chi2 = trial_chi2;
            lambda *= config.lambda_down;
            if relative_drop <= config.ftol || small_step {
                return Ok(LmOutcome {
                    params,
                    chi2,
                    iterations: iteration,
                });
            }
        } else {
            lambda *= config.lambda_up;
            if lambda > MAX_LAMBDA {
                // No downhill direction left: the current point is a minimum.
                return Ok(LmOutcome {
                    params,
                    chi2,
                    iterations: iteration,
                });
            }
        }
    }

    Err(FitFailure::NotConverged {
        iterations: config.max_iterations,
    })
}

pub fn residual_sum_of_squares<const N: usize, M: ProfileModel<N>>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    params: &[f64; N],
) -> f64 {
    xs.iter()
        .zip(ys.iter())
        .map(|(&x, &y)| {
            let r = y - model.evaluate(x, params);
            r * r
        })
        .sum()
}

/// `J^T J` and `J^T r` at `params`.
#[allow(clippy::needless_range_loop)]
pub fn hessian_gradient<const N: usize, M: ProfileModel<N>>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    params: &[f64; N],
) -> ([[f64; N]; N], [f64; N]) {
    let mut hessian = [[0.0f64; N]; N];
    let mut gradient = [0.0f64; N];

    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let row = model.jacobian_row(x, params);
        let r = y - model.evaluate(x, params);
        for i in 0..N {
            gradient[i] += row[i] * r;
            for j in i..N {
                hessian[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 1..N {
        for j in 0..i {
            hessian[i][j] = hessian[j][i];
        }
    }
    (hessian, gradient)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line;

    impl ProfileModel<2> for Line {
        fn evaluate(&self, x: f64, p: &[f64; 2]) -> f64 {
            p[0] * x + p[1]
        }

        fn jacobian_row(&self, x: f64, _p: &[f64; 2]) -> [f64; 2] {
            [x, 1.0]
        }
    }

    #[test]
    fn test_fits_line_exactly() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 2.0).collect();
        let out = optimize(&Line, &xs, &ys, [0.0, 0.0], &LmConfig::default()).unwrap();
        assert!((out.params[0] - 3.0).abs() < 1e-6);
        assert!((out.params[1] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_hessian_is_symmetric() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0, 2.0, 4.0];
        let (h, _) = hessian_gradient(&Line, &xs, &ys, &[1.0, 1.0]);
        assert_eq!(h[0][1], h[1][0]);
        assert_eq!(h[0][0], 5.0);
        assert_eq!(h[1][1], 3.0);
    }
}
