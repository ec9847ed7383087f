use approx::assert_relative_eq;

use beadscope_core::error::BeadError;
use beadscope_core::resolution::{AcquisitionParams, MicroscopeType};

#[test]
fn test_widefield_default_resolution() {
    let r = AcquisitionParams::default().theoretical_resolution().unwrap();
    // 0.51 * 0.45 / 1.0
    assert_relative_eq!(r.lateral_um, 0.2295, epsilon = 1e-12);
    let axial = 0.88 * 0.45 / (1.45 - (1.45f64 * 1.45 - 1.0).sqrt());
    assert_relative_eq!(r.axial_um, axial, epsilon = 1e-12);
    assert!(r.axial_um > r.lateral_um);
}

#[test]
fn test_confocal_prefactors() {
    let params = AcquisitionParams {
        microscope: MicroscopeType::Confocal,
        emission_wavelength_nm: 520.0,
        refractive_index: 1.518,
        numerical_aperture: 1.4,
    };
    let r = params.theoretical_resolution().unwrap();
    assert_relative_eq!(r.lateral_um, 0.37 * 0.52 / 1.4, epsilon = 1e-12);
    let axial = 0.64 * 0.52 / (1.518 - (1.518f64 * 1.518 - 1.96).sqrt());
    assert_relative_eq!(r.axial_um, axial, epsilon = 1e-12);
}

#[test]
fn test_aperture_must_be_below_refractive_index() {
    let params = AcquisitionParams {
        numerical_aperture: 1.45,
        ..AcquisitionParams::default()
    };
    assert!(matches!(
        params.theoretical_resolution(),
        Err(BeadError::InvalidConfig(_))
    ));
}

#[test]
fn test_non_positive_wavelength_rejected() {
    let params = AcquisitionParams {
        emission_wavelength_nm: 0.0,
        ..AcquisitionParams::default()
    };
    assert!(params.validate().is_err());
}

#[test]
fn test_microscope_serializes_snake_case() {
    let json = serde_json::to_string(&MicroscopeType::Confocal).unwrap();
    assert_eq!(json, "\"confocal\"");
    assert_eq!(MicroscopeType::Widefield.to_string(), "widefield");
}
