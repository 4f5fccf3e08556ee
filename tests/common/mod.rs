#![allow(dead_code)]

use std::f64::consts::PI;

use meris_brr::auxdata::{AuxData, AuxDataBuilder, PressurePolynomials, PRESSURE_POLY_COEFFS};
use meris_brr::flags::{l1b, set_flag};
use meris_brr::interp::Lut;
use meris_brr::types::{
    BandImage, L1bScene, ScalarImage, Spectrum, SurfaceType, NOMINAL_WAVELENGTHS, NUM_BANDS,
};
use ndarray::{Array2, Array3, ArrayD, IxDyn};

pub const NUM_DETECTORS: usize = 3;

/// Clear ocean, 760 nm at 75% of 753 nm
pub const WATER: Spectrum = [
    0.100, 0.090, 0.075, 0.060, 0.045, 0.025, 0.018, 0.017, 0.014, 0.012, 0.009, 0.011, 0.010,
    0.009, 0.006,
];

/// Vegetated land
pub const LAND: Spectrum = [
    0.050, 0.055, 0.060, 0.065, 0.090, 0.070, 0.050, 0.055, 0.150, 0.300, 0.225, 0.310, 0.330,
    0.340, 0.220,
];

/// Bright, spectrally flat cloud top
pub const CLOUD: Spectrum = [
    0.80, 0.80, 0.80, 0.80, 0.80, 0.80, 0.80, 0.80, 0.80, 0.80, 0.76, 0.80, 0.80, 0.80, 0.80,
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn solar_irradiance(band: usize) -> f64 {
    1850.0 - 55.0 * band as f64
}

fn angle_axis() -> Vec<f64> {
    vec![0.0, 30.0, 60.0, 90.0]
}

fn azimuth_axis() -> Vec<f64> {
    vec![0.0, 90.0, 180.0]
}

fn threshold_lut(value: f64) -> Lut {
    Lut::constant(vec![angle_axis(), angle_axis(), azimuth_axis()], value).unwrap()
}

/// Auxiliary data with simple but physically ordered tables
pub fn aux_builder() -> AuxDataBuilder {
    let irradiance =
        Array2::from_shape_fn((NUM_BANDS, NUM_DETECTORS), |(band, _)| solar_irradiance(band));
    let wavelengths = Array2::from_shape_fn((NUM_BANDS, NUM_DETECTORS), |(band, detector)| {
        NOMINAL_WAVELENGTHS[band] + 0.2 * detector as f64
    });

    // P = 7.1 - ηC: stronger O2 absorption (smaller η) means higher pressure
    let mut coefficients = Array3::zeros((2, 2, PRESSURE_POLY_COEFFS));
    for shift in 0..2 {
        for air_mass in 0..2 {
            coefficients[[shift, air_mass, 0]] = 7.1;
            coefficients[[shift, air_mass, 1]] = -1.0;
        }
    }
    let polynomials =
        PressurePolynomials::new(vec![-1.0, 1.0], vec![2.0, 5.0], coefficients).unwrap();

    let scattering = ArrayD::from_shape_fn(IxDyn(&[3, 4, 4, 4]), |ix| {
        if ix[1] == 0 {
            1.0
        } else {
            0.0
        }
    });
    let scattering_axes = vec![
        vec![0.0, 1.0, 2.0],
        vec![0.0, 1.0, 2.0, 3.0],
        angle_axis(),
        angle_axis(),
    ];

    AuxDataBuilder::new()
        .seasonal_factor(1.0)
        .solar_irradiance(irradiance)
        .detector_wavelength(wavelengths)
        .correction_coeff(Lut::constant(vec![vec![1.0, 10.0], vec![0.0, 1.0]], 1.0).unwrap())
        .pressure_polynomials(polynomials)
        .dp_thresh(SurfaceType::Land, Lut::constant(vec![angle_axis(), angle_axis()], 50.0).unwrap())
        .dp_thresh(SurfaceType::Water, Lut::constant(vec![angle_axis(), angle_axis()], 40.0).unwrap())
        .rhorc_thresh(SurfaceType::Land, threshold_lut(0.25))
        .rhorc_thresh(SurfaceType::Water, threshold_lut(0.2))
        .rayleigh_scattering(Lut::new(scattering_axes, scattering).unwrap())
        .rayleigh_albedo(Lut::from_vec(vec![vec![0.0, 0.5]], vec![0.0, 0.25]).unwrap())
        .glint_reflectance(
            Lut::constant(
                vec![vec![0.0, 180.0], angle_axis(), azimuth_axis(), vec![0.0, 20.0], angle_axis()],
                0.0,
            )
            .unwrap(),
        )
        .rho_thresh_nir(threshold_lut(0.1))
        .rho_thresh_red(threshold_lut(0.1))
}

pub fn aux() -> AuxData {
    aux_builder().build().unwrap()
}

fn filled(height: usize, width: usize, value: f32) -> ScalarImage {
    ScalarImage::from_elem((height, width), value)
}

/// Scene with water in the left half and land in the right half
pub fn scene(height: usize, width: usize) -> L1bScene {
    let mut scene = L1bScene {
        radiance: BandImage::zeros((NUM_BANDS, height, width)),
        detector_index: Array2::from_shape_fn((height, width), |(_, x)| (x % NUM_DETECTORS) as i16),
        l1_flags: Array2::zeros((height, width)),
        sun_zenith: ScalarImage::from_shape_fn((height, width), |(y, _)| 25.0 + 0.2 * y as f32),
        sun_azimuth: filled(height, width, 135.0),
        view_zenith: ScalarImage::from_shape_fn((height, width), |(_, x)| 4.0 + 0.25 * x as f32),
        view_azimuth: filled(height, width, 300.0),
        altitude: filled(height, width, 0.0),
        zonal_wind: filled(height, width, 2.5),
        meridional_wind: filled(height, width, -4.0),
        ecmwf_pressure: filled(height, width, 1012.0),
        ozone: filled(height, width, 320.0),
        cloud_top_pressure: None,
    };

    for y in 0..height {
        for x in 0..width {
            if x >= width / 2 {
                scene.l1_flags[[y, x]] = set_flag(0u8, l1b::LAND_OCEAN, true);
                scene.altitude[[y, x]] = 250.0;
                set_reflectance(&mut scene, x, y, &LAND);
            } else {
                set_reflectance(&mut scene, x, y, &WATER);
            }
        }
    }
    scene
}

/// Write the radiance that converts back to `reflectance` at pixel (x, y)
pub fn set_reflectance(scene: &mut L1bScene, x: usize, y: usize, reflectance: &Spectrum) {
    let mu_s = (scene.sun_zenith[[y, x]] as f64).to_radians().cos();
    for band in 0..NUM_BANDS {
        scene.radiance[[band, y, x]] = (reflectance[band] * solar_irradiance(band) * mu_s / PI) as f32;
    }
}

pub fn mark_invalid(scene: &mut L1bScene, x: usize, y: usize) {
    scene.l1_flags[[y, x]] = set_flag(scene.l1_flags[[y, x]], l1b::INVALID, true);
}
