use serde::{Deserialize, Serialize};

use crate::consts::FWHM_PER_SIGMA;

use super::lm::ProfileModel;

/// Smallest sigma the optimizer may step to.
const MIN_SIGMA: f64 = 1e-9;

/// `background + amplitude * exp(-(x - center)^2 / (2 sigma^2))`.
///
/// Parameter order: amplitude, background, center, sigma.
pub struct GaussianProfile;

impl ProfileModel<4> for GaussianProfile {
    fn evaluate(&self, x: f64, p: &[f64; 4]) -> f64 {
        let [amplitude, background, center, sigma] = *p;
        let dx = x - center;
        background + amplitude * (-dx * dx / (2.0 * sigma * sigma)).exp()
    }

    fn jacobian_row(&self, x: f64, p: &[f64; 4]) -> [f64; 4] {
        let [amplitude, _, center, sigma] = *p;
        let dx = x - center;
        let s2 = sigma * sigma;
        let e = (-dx * dx / (2.0 * s2)).exp();
        [
            e,
            1.0,
            amplitude * e * dx / s2,
            amplitude * e * dx * dx / (s2 * sigma),
        ]
    }

    fn constrain(&self, p: &mut [f64; 4]) {
        p[3] = p[3].abs().max(MIN_SIGMA);
    }
}

/// Fitted Gaussian parameters, positions in physical units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianParams {
    pub amplitude: f64,
    pub background: f64,
    pub center: f64,
    pub sigma: f64,
}

impl GaussianParams {
    pub fn from_array([amplitude, background, center, sigma]: [f64; 4]) -> Self {
        Self {
            amplitude,
            background,
            center,
            sigma,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.amplitude, self.background, self.center, self.sigma]
    }

    pub fn fwhm(&self) -> f64 {
        FWHM_PER_SIGMA * self.sigma
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        GaussianProfile.evaluate(x, &self.to_array())
    }
}
