//! Cloud screening from the O2 absorption pressure, spectral slopes and brightness
//!
//! Each valid pixel gets an apparent pressure from the 760/753 nm ratio,
//! which is compared against the surface pressure. Together with brightness
//! and two spectral slope tests this forms an 8-bit index into the land or
//! water decision table.

use ndarray::Array2;

use crate::auxdata::decision_tables::CloudTests;
use crate::auxdata::AuxData;
use crate::core::geometry::PixelGeometry;
use crate::core::rayleigh::RayleighModel;
use crate::flags::{cloud, is_flag_set, set_flag};
use crate::types::{
    check_region_dim, spectrum_at, BandImage, L1bScene, MerisResult, Region, Spectrum,
    SurfaceType, BAD_VALUE, BB753, BB760, NUM_BANDS,
};

/// Magnitude beyond which `10^P` leaves the double range
const MAX_POLY_EXPONENT: f64 = 308.0;

/// Pressure estimate with its error flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureResult {
    /// Pressure in hPa
    pub pressure: f64,
    pub error: bool,
}

/// Outcome of the pressure threshold tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressureTests {
    pub low_nn: bool,
    pub low_poly: bool,
    pub confidence: bool,
}

/// Outcome of the brightness and spectral slope tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlopeTests {
    pub bright: bool,
    pub slope_1: bool,
    pub slope_2: bool,
}

pub struct CloudClassifier<'a> {
    aux: &'a AuxData,
    rayleigh: RayleighModel<'a>,
}

impl<'a> CloudClassifier<'a> {
    pub fn new(aux: &'a AuxData) -> Self {
        Self {
            aux,
            rayleigh: RayleighModel::new(aux),
        }
    }

    /// Apparent pressure from the O2 polynomial of one spectral-shift cell
    ///
    /// The polynomial yields `P = log10(airMass · p²)`; the air-mass cell is
    /// the nearest one.
    pub fn pressure_func(&self, eta_c: f64, air_mass: f64, shift_index: usize) -> PressureResult {
        let polynomials = self.aux.pressure_polynomials();
        let air_mass_index = polynomials
            .locate_air_mass(air_mass)
            .nearest()
            .min(polynomials.num_air_masses() - 1);
        let coefficients = polynomials.coefficients(shift_index, air_mass_index);

        let mut exponent = 0.0;
        for &c in coefficients.iter().rev() {
            exponent = exponent * eta_c + c;
        }

        if !(exponent.abs() <= MAX_POLY_EXPONENT) {
            return PressureResult { pressure: 0.0, error: true };
        }

        let pressure = (10f64.powf(exponent) / air_mass).sqrt();
        let max_pressure = self.aux.cloud_params().max_pressure;
        if pressure > max_pressure {
            PressureResult { pressure: max_pressure, error: true }
        } else {
            PressureResult { pressure, error: false }
        }
    }

    /// Apparent pressure of a pixel, blended over the detector's spectral shift
    pub fn comp_pressure(&self, rho_toa: &Spectrum, air_mass: f64, detector: usize) -> PressureResult {
        let rho_753 = rho_toa[BB753];
        let (eta, eta_error) = if rho_753 > 0.0 {
            (rho_toa[BB760] / rho_753, false)
        } else {
            (0.0, true)
        };
        let correction = self.aux.correction_coeff().lookup([air_mass, rho_753]);
        let eta_c = eta * correction;

        let polynomials = self.aux.pressure_polynomials();
        let shift = polynomials.locate_shift(self.aux.spectral_shift(detector));
        let lower = self.pressure_func(eta_c, air_mass, shift.index);
        let upper_index = (shift.index + 1).min(polynomials.num_shifts() - 1);
        let upper = self.pressure_func(eta_c, air_mass, upper_index);

        // a failed evaluation is replaced by the other one instead of being blended in
        let pressure = match (lower.error, upper.error) {
            (true, false) => upper.pressure,
            (false, true) => lower.pressure,
            _ => lower.pressure * (1.0 - shift.fraction) + upper.pressure * shift.fraction,
        };

        PressureResult {
            pressure,
            error: eta_error || lower.error || upper.error,
        }
    }

    /// Compare the apparent pressures against the surface pressure
    ///
    /// Without a neural-net cloud-top pressure the surface pressure is
    /// compared with itself, so the low-NN test stays false.
    pub fn press_thresh(
        &self,
        surface: SurfaceType,
        geometry: &PixelGeometry,
        poly_pressure: f64,
        cloud_top_pressure: Option<f64>,
    ) -> PressureTests {
        let threshold = self
            .aux
            .dp_thresh(surface)
            .lookup([geometry.sun_zenith, geometry.view_zenith]);
        let reference = geometry.surface_pressure;
        let nn_pressure = cloud_top_pressure.unwrap_or(reference);

        PressureTests {
            low_nn: nn_pressure < reference - threshold,
            low_poly: poly_pressure < reference - threshold,
            confidence: (reference - poly_pressure).abs()
                > self.aux.cloud_params().delta_pressure_threshold,
        }
    }

    /// Brightness and spectral slope tests on Rayleigh corrected reflectance
    pub fn spec_slopes(
        &self,
        surface: SurfaceType,
        geometry: &PixelGeometry,
        rho_toa: &Spectrum,
        radiance: &Spectrum,
    ) -> SlopeTests {
        let tau = self.rayleigh.tau_rayleigh(geometry.surface_pressure);
        let rho_r = self.rayleigh.reflectance(
            geometry.sun_zenith,
            geometry.view_zenith,
            geometry.delta_azimuth,
            &tau,
        );
        let mut rho_rc = [0.0; NUM_BANDS];
        for band in 0..NUM_BANDS {
            rho_rc[band] = rho_toa[band] - rho_r[band];
        }

        let params = self.aux.cloud_params();
        let threshold = self.aux.rhorc_thresh(surface).lookup([
            geometry.sun_zenith,
            geometry.view_zenith,
            geometry.delta_azimuth,
        ]);
        let band = params.bright_band;

        SlopeTests {
            bright: rho_rc[band] >= threshold || radiance[band] >= self.aux.saturation_radiance(band),
            slope_1: slope_test(&rho_rc, params.slope_1_bands, params.slope_1_range),
            slope_2: slope_test(&rho_rc, params.slope_2_bands, params.slope_2_range),
        }
    }

    pub fn is_cloudy(&self, surface: SurfaceType, tests: &CloudTests) -> bool {
        self.aux.decision_table(surface).is_cloudy(tests)
    }

    /// Full classification of one valid pixel
    pub fn classify_pixel(
        &self,
        geometry: &PixelGeometry,
        detector: usize,
        rho_toa: &Spectrum,
        radiance: &Spectrum,
        cloud_top_pressure: Option<f64>,
    ) -> u16 {
        let surface = SurfaceType::from_land_flag(geometry.is_land);
        let pressure = self.comp_pressure(rho_toa, geometry.air_mass, detector);
        let pressure_tests = self.press_thresh(surface, geometry, pressure.pressure, cloud_top_pressure);
        let slopes = self.spec_slopes(surface, geometry, rho_toa, radiance);

        let tests = CloudTests {
            bright: slopes.bright,
            low_pressure_nn: pressure_tests.low_nn,
            low_pressure_poly: pressure_tests.low_poly,
            delta_pressure: pressure_tests.confidence,
            pcd_nn: true,
            pcd_poly: pressure.error,
            slope_1: slopes.slope_1,
            slope_2: slopes.slope_2,
        };

        let mut flags = 0u16;
        flags = set_flag(flags, cloud::CLOUD, self.is_cloudy(surface, &tests));
        flags = set_flag(flags, cloud::BRIGHT, tests.bright);
        flags = set_flag(flags, cloud::LOW_NN_P, tests.low_pressure_nn);
        flags = set_flag(flags, cloud::PCD_NN_P, tests.pcd_nn);
        flags = set_flag(flags, cloud::LOW_POL_P, tests.low_pressure_poly);
        flags = set_flag(flags, cloud::PCD_POL_P, tests.pcd_poly);
        flags = set_flag(flags, cloud::CONFIDENCE_P, tests.delta_pressure);
        flags = set_flag(flags, cloud::SLOPE_1, tests.slope_1);
        flags = set_flag(flags, cloud::SLOPE_2, tests.slope_2);
        flags
    }

    /// Classify a region; `rho_toa` is region-sized, invalid pixels keep zero flags
    pub fn process(&self, scene: &L1bScene, rho_toa: &BandImage, region: Region) -> MerisResult<Array2<u16>> {
        scene.check_detectors(self.aux, &region)?;
        let (_, height, width) = rho_toa.dim();
        check_region_dim("rho_toa", (height, width), &region)?;
        log::info!(
            "Cloud classification for {}x{} region at ({}, {})",
            region.width, region.height, region.x, region.y
        );

        let scale_height = self.aux.press_scale_height();
        let mut flags = Array2::zeros(region.dim());

        for line in 0..region.height {
            for col in 0..region.width {
                let (x, y) = (region.x + col, region.y + line);
                let detector = match scene.detector(x, y) {
                    Some(detector) if !scene.is_invalid(x, y) => detector,
                    _ => continue,
                };
                if rho_toa[[0, line, col]] == BAD_VALUE {
                    continue;
                }

                let geometry = PixelGeometry::from_scene(scene, x, y, scale_height);
                let ctp = scene
                    .cloud_top_pressure
                    .as_ref()
                    .map(|ctp| ctp[[y, x]] as f64);
                flags[[line, col]] = self.classify_pixel(
                    &geometry,
                    detector,
                    &spectrum_at(rho_toa, col, line),
                    &scene.radiance_at(x, y),
                    ctp,
                );
            }
        }

        let cloudy = flags.iter().filter(|&&f| is_flag_set(f, cloud::CLOUD)).count();
        log::debug!("Cloud classification: {} of {} pixels cloudy", cloudy, region.pixel_count());
        Ok(flags)
    }
}

/// `low ≤ ρ[num] / ρ[den] ≤ high`, false for a non-positive denominator
fn slope_test(rho: &Spectrum, bands: [usize; 2], range: [f64; 2]) -> bool {
    let denominator = rho[bands[1]];
    if denominator <= 0.0 {
        return false;
    }
    let ratio = rho[bands[0]] / denominator;
    ratio >= range[0] && ratio <= range[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auxdata::decision_tables::DecisionTable;
    use crate::auxdata::testing::{linear_pressure_polynomials, synthetic_builder};
    use crate::auxdata::PressurePolynomials;
    use crate::core::test_scene::uniform_scene;
    use crate::flags::l1b;
    use crate::interp::Lut;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn geometry(is_land: bool) -> PixelGeometry {
        let scene = uniform_scene(1, 1, is_land);
        PixelGeometry::from_scene(&scene, 0, 0, 8000.0)
    }

    #[test]
    fn test_pressure_func_inverts_log_transform() {
        let aux = synthetic_builder(1)
            .pressure_polynomials(linear_pressure_polynomials(5.0, 0.5))
            .build()
            .unwrap();
        let classifier = CloudClassifier::new(&aux);

        let result = classifier.pressure_func(0.6, 3.0, 1);
        assert!(!result.error);
        let p = 5.0 + 0.5 * 0.6;
        assert_abs_diff_eq!((result.pressure * result.pressure * 3.0).log10(), p, epsilon = 1e-9);
    }

    #[test]
    fn test_pressure_func_clamps_and_overflows() {
        let aux = synthetic_builder(1)
            .pressure_polynomials(linear_pressure_polynomials(400.0, 0.0))
            .build()
            .unwrap();
        let overflow = CloudClassifier::new(&aux).pressure_func(1.0, 2.0, 0);
        assert!(overflow.error);
        assert_eq!(overflow.pressure, 0.0);

        let aux = synthetic_builder(1)
            .pressure_polynomials(linear_pressure_polynomials(9.0, 0.0))
            .build()
            .unwrap();
        let clamped = CloudClassifier::new(&aux).pressure_func(1.0, 2.0, 0);
        assert!(clamped.error);
        assert_eq!(clamped.pressure, aux.cloud_params().max_pressure);
    }

    #[test]
    fn test_pressure_func_uses_nearest_air_mass_cell() {
        let mut coefficients = Array3::zeros((1, 3, 12));
        for am in 0..3 {
            coefficients[[0, am, 0]] = 5.0 + am as f64;
        }
        let polynomials = PressurePolynomials::new(vec![0.0], vec![2.0, 4.0, 6.0], coefficients).unwrap();
        let aux = synthetic_builder(1).pressure_polynomials(polynomials).build().unwrap();
        let classifier = CloudClassifier::new(&aux);

        // 2.9 lies below the midpoint of [2, 4], 3.1 above it
        let low = classifier.pressure_func(0.0, 2.9, 0);
        let high = classifier.pressure_func(0.0, 3.1, 0);
        assert_abs_diff_eq!((low.pressure * low.pressure * 2.9).log10(), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!((high.pressure * high.pressure * 3.1).log10(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_comp_pressure_zero_denominator() {
        let aux = synthetic_builder(1).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        let mut rho = [0.1; NUM_BANDS];
        rho[BB753] = 0.0;

        let result = classifier.comp_pressure(&rho, 3.0, 0);
        assert!(result.error);
        // η = 0 leaves only the constant term of the polynomial
        assert_abs_diff_eq!(result.pressure, (1e5f64 / 3.0).sqrt(), epsilon = 1e-6);
        assert_eq!(classifier.comp_pressure(&rho, 3.0, 0), result);
    }

    #[test]
    fn test_comp_pressure_blends_shift_cells() {
        let mut coefficients = Array3::zeros((2, 1, 12));
        coefficients[[0, 0, 0]] = 5.0;
        coefficients[[1, 0, 0]] = 5.2;
        let polynomials = PressurePolynomials::new(vec![-1.0, 1.0], vec![3.0], coefficients).unwrap();
        let aux = synthetic_builder(1).pressure_polynomials(polynomials).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        assert_eq!(aux.spectral_shift(0), 0.0);

        let rho = [0.1; NUM_BANDS];
        let result = classifier.comp_pressure(&rho, 3.0, 0);
        assert!(!result.error);
        let expected = 0.5 * (1e5f64 / 3.0).sqrt() + 0.5 * (10f64.powf(5.2) / 3.0).sqrt();
        assert_abs_diff_eq!(result.pressure, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_comp_pressure_substitutes_failed_evaluation() {
        let mut coefficients = Array3::zeros((2, 1, 12));
        coefficients[[0, 0, 0]] = 5.0;
        coefficients[[1, 0, 0]] = 500.0;
        let polynomials = PressurePolynomials::new(vec![-1.0, 1.0], vec![3.0], coefficients).unwrap();
        let aux = synthetic_builder(1).pressure_polynomials(polynomials).build().unwrap();

        let result = CloudClassifier::new(&aux).comp_pressure(&[0.1; NUM_BANDS], 3.0, 0);
        assert!(result.error);
        assert_abs_diff_eq!(result.pressure, (1e5f64 / 3.0).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_low_nn_test_is_self_referential_without_ctp() {
        let aux = synthetic_builder(1).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        let geometry = geometry(false);

        // known quirk: surface pressure compared against itself
        for poly in [300.0, 1000.0, 1013.25] {
            let tests = classifier.press_thresh(SurfaceType::Water, &geometry, poly, None);
            assert!(!tests.low_nn);
        }
        let tests = classifier.press_thresh(SurfaceType::Water, &geometry, 1013.25, Some(600.0));
        assert!(tests.low_nn);
    }

    #[test]
    fn test_pressure_thresholds() {
        let aux = synthetic_builder(1).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        let geometry = geometry(true);

        // threshold 50 hPa, confidence bound 40 hPa
        let tests = classifier.press_thresh(SurfaceType::Land, &geometry, 950.0, None);
        assert!(tests.low_poly);
        assert!(tests.confidence);
        let tests = classifier.press_thresh(SurfaceType::Land, &geometry, 990.0, None);
        assert!(!tests.low_poly);
        assert!(!tests.confidence);
        let tests = classifier.press_thresh(SurfaceType::Land, &geometry, 970.0, None);
        assert!(!tests.low_poly);
        assert!(tests.confidence);
    }

    #[test]
    fn test_slopes_false_for_zero_denominator() {
        let aux = synthetic_builder(1).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        let geometry = geometry(false);
        let model = RayleighModel::new(&aux);
        let rho_r = model.reflectance(
            geometry.sun_zenith,
            geometry.view_zenith,
            geometry.delta_azimuth,
            &model.tau_rayleigh(geometry.surface_pressure),
        );

        let params = aux.cloud_params();
        for numerator in [-0.5, 0.0, 0.3, 10.0] {
            let mut rho = [0.3; NUM_BANDS];
            rho[params.slope_1_bands[1]] = rho_r[params.slope_1_bands[1]];
            rho[params.slope_1_bands[0]] = numerator;
            let slopes = classifier.spec_slopes(SurfaceType::Water, &geometry, &rho, &[0.0; NUM_BANDS]);
            assert!(!slopes.slope_1);

            let mut rho = [0.3; NUM_BANDS];
            rho[params.slope_2_bands[1]] = rho_r[params.slope_2_bands[1]];
            rho[params.slope_2_bands[0]] = numerator;
            let slopes = classifier.spec_slopes(SurfaceType::Water, &geometry, &rho, &[0.0; NUM_BANDS]);
            assert!(!slopes.slope_2);
        }
    }

    #[test]
    fn test_bright_and_slopes() {
        let aux = synthetic_builder(1).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        let geometry = geometry(false);
        let model = RayleighModel::new(&aux);
        let rho_r = model.reflectance(
            geometry.sun_zenith,
            geometry.view_zenith,
            geometry.delta_azimuth,
            &model.tau_rayleigh(geometry.surface_pressure),
        );

        // flat corrected spectrum of 0.5: bright, both slopes equal to 1
        let mut rho = [0.0; NUM_BANDS];
        for band in 0..NUM_BANDS {
            rho[band] = rho_r[band] + 0.5;
        }
        let slopes = classifier.spec_slopes(SurfaceType::Water, &geometry, &rho, &[0.0; NUM_BANDS]);
        assert_eq!(slopes, SlopeTests { bright: true, slope_1: true, slope_2: true });

        // dark but saturated in the brightness band
        let mut dark = rho_r;
        dark[aux.cloud_params().slope_1_bands[0]] += 0.01;
        let mut radiance = [0.0; NUM_BANDS];
        radiance[aux.cloud_params().bright_band] = 1e4;
        let slopes = classifier.spec_slopes(SurfaceType::Water, &geometry, &dark, &radiance);
        assert!(slopes.bright);
        assert!(!slopes.slope_1);
    }

    #[test]
    fn test_is_cloudy_deterministic_over_all_indices() {
        let aux = synthetic_builder(1).build().unwrap();
        let classifier = CloudClassifier::new(&aux);
        for surface in [SurfaceType::Land, SurfaceType::Water] {
            for index in 0..=255u8 {
                let tests = CloudTests::from_index(index);
                let first = classifier.is_cloudy(surface, &tests);
                assert_eq!(first, classifier.is_cloudy(surface, &tests));
                assert_eq!(first, DecisionTable::standard(surface).lookup(index));
            }
        }
    }

    #[test]
    fn test_process_writes_all_flags_and_skips_invalid() {
        let aux = synthetic_builder(1)
            .rhorc_thresh(
                SurfaceType::Water,
                Lut::constant(vec![vec![0.0, 90.0], vec![0.0, 90.0], vec![0.0, 180.0]], 0.01).unwrap(),
            )
            .build()
            .unwrap();
        let mut scene = uniform_scene(3, 3, false);
        scene.l1_flags[[2, 2]] = set_flag(scene.l1_flags[[2, 2]], l1b::INVALID, true);
        let rho_toa = BandImage::from_elem((NUM_BANDS, 3, 3), 0.4);

        let flags = CloudClassifier::new(&aux).process(&scene, &rho_toa, scene.full_region()).unwrap();
        assert_eq!(flags[[2, 2]], 0);

        let word = flags[[0, 0]];
        assert!(is_flag_set(word, cloud::PCD_NN_P));
        assert!(is_flag_set(word, cloud::BRIGHT));
        // η = 1 with the synthetic polynomial exceeds the maximum pressure
        assert!(is_flag_set(word, cloud::PCD_POL_P));
        assert!(!is_flag_set(word, cloud::LOW_NN_P));
        assert!(is_flag_set(word, cloud::SLOPE_1));
        assert!(is_flag_set(word, cloud::SLOPE_2));
        assert!(flags.iter().take(8).all(|&f| f == word));
    }
}
