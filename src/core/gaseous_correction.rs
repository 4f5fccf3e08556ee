//! Ozone, oxygen and water vapour absorption correction over 4x4 subwindows

use ndarray::Array2;

use crate::auxdata::AuxData;
use crate::core::geometry::air_mass;
use crate::flags::{cloud, gas, is_flag_set, set_flag};
use crate::types::{
    bad_band_image, check_region_dim, spectrum_at, store_spectrum, BandImage, L1bScene,
    MerisResult, Region, Spectrum, BAD_VALUE, BB753, BB760, BB885, BB900, NUM_BANDS, SUBWIN_SIZE,
};

/// Pixels below this altitude (m) are only corrected over land or with water correction on
const MIN_ALTITUDE: f32 = -50.0;

/// Sun zenith (degrees) above which SUN70 is raised
const SUN70_ZENITH: f32 = 70.0;

/// Output of the gaseous correction
#[derive(Debug, Clone)]
pub struct GasCorrectionOutput {
    /// Gas-corrected reflectance
    pub rho_ng: BandImage,
    pub flags: Array2<u8>,
}

/// Per-pixel result of the absorption model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasCorrection {
    pub rho_ng: Spectrum,
    /// Water vapour content used (g/cm²)
    pub water_vapour: f64,
    pub out_of_range: bool,
}

pub struct GaseousCorrector<'a> {
    aux: &'a AuxData,
    correct_water: bool,
}

impl<'a> GaseousCorrector<'a> {
    pub fn new(aux: &'a AuxData, correct_water: bool) -> Self {
        Self { aux, correct_water }
    }

    /// `exp(-ozone/1000 · airMass · τO3[b])`, ozone in Dobson units
    pub fn ozone_transmittance(&self, air_mass: f64, ozone: f64) -> Spectrum {
        let tau_o3 = &self.aux.gas_model().tau_o3_norm;
        let mut trans = [0.0; NUM_BANDS];
        for (band, value) in trans.iter_mut().enumerate() {
            *value = (-ozone / 1000.0 * air_mass * tau_o3[band]).exp();
        }
        trans
    }

    /// Absorption model for one pixel
    ///
    /// `eta` is the 760/753 ratio, `x2` the 900/885 ratio. The O2 and H2O
    /// terms apply to all bands except 760 and 900, which only get the
    /// ozone correction.
    pub fn gas_correction(
        &self,
        rho_toa: &Spectrum,
        t_o3: &Spectrum,
        eta: f64,
        x2: f64,
        detector: usize,
        cloud_confidence: bool,
    ) -> GasCorrection {
        let model = self.aux.gas_model();
        let mut out_of_range = false;

        let eta = eta * (1.0 + model.o2_shift_sensitivity * self.aux.spectral_shift(detector));

        let h2o = if cloud_confidence { &model.h2o_cloud } else { &model.h2o_clear };
        let mut water_vapour = polynomial(h2o, x2);
        if !water_vapour.is_finite() {
            water_vapour = 0.0;
            out_of_range = true;
        } else if water_vapour < 0.0 || water_vapour > model.max_water_vapour {
            water_vapour = water_vapour.clamp(0.0, model.max_water_vapour);
            out_of_range = true;
        }

        let mut rho_ng = [0.0; NUM_BANDS];
        for band in 0..NUM_BANDS {
            let mut trans = t_o3[band];
            if band != BB760 && band != BB900 {
                let t_o2 = polynomial(&model.o2_transmittance[band], eta);
                if t_o2 > 0.0 {
                    trans *= t_o2;
                } else {
                    out_of_range = true;
                }
                trans *= (-model.h2o_absorption[band] * water_vapour).exp();
            }
            rho_ng[band] = rho_toa[band] / trans;
        }

        GasCorrection { rho_ng, water_vapour, out_of_range }
    }

    fn qualifies(&self, scene: &L1bScene, rho_toa: &BandImage, cloud_flags: &Array2<u16>, x: usize, y: usize, region: &Region) -> bool {
        let (col, line) = (x - region.x, y - region.y);
        !scene.is_invalid(x, y)
            && rho_toa[[0, line, col]] != BAD_VALUE
            && !is_flag_set(cloud_flags[[line, col]], cloud::CLOUD)
            && (self.correct_water || scene.is_land(x, y) || scene.altitude[[y, x]] >= MIN_ALTITUDE)
    }

    /// Correct a region; `rho_toa` and `cloud_flags` are region-sized
    pub fn process(
        &self,
        scene: &L1bScene,
        rho_toa: &BandImage,
        cloud_flags: &Array2<u16>,
        region: Region,
    ) -> MerisResult<GasCorrectionOutput> {
        scene.check_detectors(self.aux, &region)?;
        let (_, height, width) = rho_toa.dim();
        check_region_dim("rho_toa", (height, width), &region)?;
        check_region_dim("cloud_flags", cloud_flags.dim(), &region)?;
        log::info!(
            "Gaseous correction for {}x{} region at ({}, {})",
            region.width, region.height, region.x, region.y
        );

        let mut output = GasCorrectionOutput {
            rho_ng: bad_band_image(&region),
            flags: Array2::zeros(region.dim()),
        };
        let mut corrected = 0usize;
        for window in region.subwindows() {
            corrected += self.process_window(scene, rho_toa, cloud_flags, &region, &window, &mut output);
        }

        log::debug!("Gaseous correction applied to {} of {} pixels", corrected, region.pixel_count());
        Ok(output)
    }

    fn process_window(
        &self,
        scene: &L1bScene,
        rho_toa: &BandImage,
        cloud_flags: &Array2<u16>,
        region: &Region,
        window: &Region,
        output: &mut GasCorrectionOutput,
    ) -> usize {
        let mut do_correct = [[false; SUBWIN_SIZE]; SUBWIN_SIZE];
        let mut water_sums = [0.0; NUM_BANDS];
        let mut count = 0;

        for y in window.y..window.y_end() {
            for x in window.x..window.x_end() {
                if !self.qualifies(scene, rho_toa, cloud_flags, x, y, region) {
                    continue;
                }
                do_correct[y - window.y][x - window.x] = true;
                count += 1;
                if !scene.is_land(x, y) {
                    let (col, line) = (x - region.x, y - region.y);
                    for band in BB753..=BB900 {
                        water_sums[band] += rho_toa[[band, line, col]] as f64;
                    }
                }
            }
        }
        if count == 0 {
            return 0;
        }

        // window corner stands in for the whole window
        let (cx, cy) = (window.x, window.y);
        let corner_air_mass = air_mass(scene.sun_zenith[[cy, cx]] as f64, scene.view_zenith[[cy, cx]] as f64);
        let t_o3 = self.ozone_transmittance(corner_air_mass, scene.ozone[[cy, cx]] as f64);
        let water_eta = band_ratio(water_sums[BB760], water_sums[BB753]);
        let water_x2 = band_ratio(water_sums[BB900], water_sums[BB885]);

        for y in window.y..window.y_end() {
            for x in window.x..window.x_end() {
                if !do_correct[y - window.y][x - window.x] {
                    continue;
                }
                let (col, line) = (x - region.x, y - region.y);
                let rho = spectrum_at(rho_toa, col, line);

                let (eta, x2) = if scene.is_land(x, y) {
                    (band_ratio(rho[BB760], rho[BB753]), band_ratio(rho[BB900], rho[BB885]))
                } else {
                    (water_eta, water_x2)
                };

                let mut flags = set_flag(0u8, gas::DO_CORRECT, true);
                flags = set_flag(flags, gas::SUN70, scene.sun_zenith[[y, x]] > SUN70_ZENITH);
                flags = set_flag(flags, gas::ORINP0, eta.is_none() || x2.is_none());

                // qualifying pixels always carry a detector
                let detector = scene.detector(x, y).unwrap_or(0);
                let confidence = is_flag_set(cloud_flags[[line, col]], cloud::CONFIDENCE_P);
                let correction = self.gas_correction(
                    &rho,
                    &t_o3,
                    eta.unwrap_or(1.0),
                    x2.unwrap_or(1.0),
                    detector,
                    confidence,
                );
                flags = set_flag(flags, gas::OROUT0, correction.out_of_range);

                store_spectrum(&mut output.rho_ng, col, line, &correction.rho_ng);
                output.flags[[line, col]] = flags;
            }
        }
        count
    }
}

/// `num / den`, or `None` when either is non-positive
fn band_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if numerator > 0.0 && denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Polynomial with constant term first
fn polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}
