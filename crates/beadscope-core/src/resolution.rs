use serde::{Deserialize, Serialize};

use crate::error::{BeadError, Result};

/// Microscope modality, which sets the diffraction-limit prefactors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MicroscopeType {
    #[default]
    Widefield,
    Confocal,
}

impl MicroscopeType {
    /// (lateral, axial) FWHM prefactors.
    fn prefactors(self) -> (f64, f64) {
        match self {
            MicroscopeType::Widefield => (0.51, 0.88),
            MicroscopeType::Confocal => (0.37, 0.64),
        }
    }
}

impl std::fmt::Display for MicroscopeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MicroscopeType::Widefield => write!(f, "widefield"),
            MicroscopeType::Confocal => write!(f, "confocal"),
        }
    }
}

/// Optical setup the volume was acquired with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionParams {
    pub microscope: MicroscopeType,
    pub emission_wavelength_nm: f64,
    pub refractive_index: f64,
    pub numerical_aperture: f64,
}

impl Default for AcquisitionParams {
    fn default() -> Self {
        Self {
            microscope: MicroscopeType::default(),
            emission_wavelength_nm: 450.0,
            refractive_index: 1.45,
            numerical_aperture: 1.0,
        }
    }
}

/// Diffraction-limited PSF widths, in micrometres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TheoreticalResolution {
    pub lateral_um: f64,
    pub axial_um: f64,
}

impl AcquisitionParams {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("emission_wavelength_nm", self.emission_wavelength_nm),
            ("refractive_index", self.refractive_index),
            ("numerical_aperture", self.numerical_aperture),
        ] {
            crate::roi::positive(name, v)?;
        }
        if self.numerical_aperture >= self.refractive_index {
            return Err(BeadError::InvalidConfig(format!(
                "numerical aperture {} must be below the refractive index {}",
                self.numerical_aperture, self.refractive_index
            )));
        }
        Ok(())
    }

    /// Expected lateral and axial FWHM for a point source.
    ///
    /// Lateral: `k_l * lambda / NA`. Axial: `k_a * lambda / (n - sqrt(n^2 - NA^2))`.
    pub fn theoretical_resolution(&self) -> Result<TheoreticalResolution> {
        self.validate()?;
        let (k_lateral, k_axial) = self.microscope.prefactors();
        let lambda_um = self.emission_wavelength_nm / 1000.0;
        let n = self.refractive_index;
        let na = self.numerical_aperture;
        Ok(TheoreticalResolution {
            lateral_um: k_lateral * lambda_um / na,
            axial_um: k_axial * lambda_um / (n - (n * n - na * na).sqrt()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confocal_is_sharper_than_widefield() {
        let widefield = AcquisitionParams::default().theoretical_resolution().unwrap();
        let confocal = AcquisitionParams {
            microscope: MicroscopeType::Confocal,
            ..AcquisitionParams::default()
        }
        .theoretical_resolution()
        .unwrap();
        assert!(confocal.lateral_um < widefield.lateral_um);
        assert!(confocal.axial_um < widefield.axial_um);
    }
}
