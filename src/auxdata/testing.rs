//! Synthetic auxiliary data for unit tests

use ndarray::{Array2, Array3, ArrayD, IxDyn};

use super::{AuxDataBuilder, PressurePolynomials, PRESSURE_POLY_COEFFS};
use crate::interp::Lut;
use crate::types::{SurfaceType, NOMINAL_WAVELENGTHS, NUM_BANDS};

pub(crate) fn angles() -> Vec<f64> {
    vec![0.0, 90.0]
}

pub(crate) fn azimuths() -> Vec<f64> {
    vec![0.0, 180.0]
}

/// Pressure polynomial `P = c0 + c1 ηC` in every cell
pub(crate) fn linear_pressure_polynomials(c0: f64, c1: f64) -> PressurePolynomials {
    let mut coefficients = Array3::zeros((3, 3, PRESSURE_POLY_COEFFS));
    for shift in 0..3 {
        for air_mass in 0..3 {
            coefficients[[shift, air_mass, 0]] = c0;
            coefficients[[shift, air_mass, 1]] = c1;
        }
    }
    PressurePolynomials::new(vec![-1.0, 0.0, 1.0], vec![2.0, 4.0, 6.0], coefficients).unwrap()
}

/// Multiple-scattering table returning the single-scattering reflectance unchanged
pub(crate) fn single_scattering_lut() -> Lut {
    let values = ArrayD::from_shape_fn(IxDyn(&[3, 4, 2, 2]), |ix| if ix[1] == 0 { 1.0 } else { 0.0 });
    Lut::new(
        vec![vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0, 3.0], angles(), angles()],
        values,
    )
    .unwrap()
}

pub(crate) fn synthetic_builder(num_detectors: usize) -> AuxDataBuilder {
    let irradiance = Array2::from_shape_fn((NUM_BANDS, num_detectors), |(band, _)| {
        1800.0 - 60.0 * band as f64
    });
    let wavelengths =
        Array2::from_shape_fn((NUM_BANDS, num_detectors), |(band, _)| NOMINAL_WAVELENGTHS[band]);

    AuxDataBuilder::new()
        .seasonal_factor(1.0)
        .solar_irradiance(irradiance)
        .detector_wavelength(wavelengths)
        .correction_coeff(Lut::constant(vec![vec![1.0, 6.0], vec![0.0, 1.0]], 1.0).unwrap())
        .pressure_polynomials(linear_pressure_polynomials(5.0, 1.5))
        .dp_thresh(SurfaceType::Land, Lut::constant(vec![angles(), angles()], 50.0).unwrap())
        .dp_thresh(SurfaceType::Water, Lut::constant(vec![angles(), angles()], 50.0).unwrap())
        .rhorc_thresh(
            SurfaceType::Land,
            Lut::constant(vec![angles(), angles(), azimuths()], 0.2).unwrap(),
        )
        .rhorc_thresh(
            SurfaceType::Water,
            Lut::constant(vec![angles(), angles(), azimuths()], 0.2).unwrap(),
        )
        .rayleigh_scattering(single_scattering_lut())
        .rayleigh_albedo(Lut::from_vec(vec![vec![0.0, 0.5]], vec![0.0, 0.25]).unwrap())
        .glint_reflectance(
            Lut::constant(
                vec![azimuths(), angles(), azimuths(), vec![0.0, 20.0], angles()],
                0.0,
            )
            .unwrap(),
        )
        .rho_thresh_nir(Lut::constant(vec![angles(), angles(), azimuths()], 0.1).unwrap())
        .rho_thresh_red(Lut::constant(vec![angles(), angles(), azimuths()], 0.1).unwrap())
}
