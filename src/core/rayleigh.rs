//! Rayleigh scattering primitives and the windowed Rayleigh correction

use ndarray::Array2;

use crate::auxdata::{AuxData, RayleighParams, RAYSCATT_NUM_ORD, RAYSCATT_NUM_SER};
use crate::core::geometry::{air_mass, PixelGeometry};
use crate::flags::{rayleigh as rayleigh_flags, set_flag};
use crate::interp::{FractIndex, Lut};
use crate::types::{
    bad_band_image, check_region_dim, is_surface_band, spectrum_at, BandImage, L1bScene,
    MerisResult, Region, Spectrum, BAD_VALUE, NUM_BANDS,
};

/// Rayleigh phase function, optical thickness, reflectance, transmittance and albedo
#[derive(Debug, Clone, Copy)]
pub struct RayleighModel<'a> {
    params: &'a RayleighParams,
    scattering: &'a Lut,
    albedo: &'a Lut,
}

impl<'a> RayleighModel<'a> {
    pub fn new(aux: &'a AuxData) -> Self {
        Self {
            params: aux.rayleigh_params(),
            scattering: aux.rayleigh_scattering(),
            albedo: aux.rayleigh_albedo(),
        }
    }

    /// Fourier decomposition of the phase function `A + B cos²Θ` in the azimuth difference
    pub fn phase_rayleigh(&self, mus: f64, muv: f64, sins: f64, sinv: f64) -> [f64; RAYSCATT_NUM_SER] {
        let [a, b] = self.params.phase_coeffs;
        let mu_product = mus * muv;
        let sin_product = sins * sinv;
        [
            a + b * (mu_product * mu_product + 0.5 * sin_product * sin_product),
            2.0 * b * mu_product * sin_product,
            0.5 * b * sin_product * sin_product,
        ]
    }

    /// Optical thickness per band scaled to `pressure` (hPa)
    pub fn tau_rayleigh(&self, pressure: f64) -> Spectrum {
        let ratio = pressure / self.params.standard_pressure;
        let mut tau = [0.0; NUM_BANDS];
        for (band, value) in tau.iter_mut().enumerate() {
            *value = self.params.optical_thickness[band] * ratio;
        }
        tau
    }

    /// Rayleigh reflectance per band
    ///
    /// Single scattering per Fourier term, corrected for multiple scattering
    /// with a cubic polynomial whose coefficients depend on the sun and view
    /// zenith angles.
    #[allow(clippy::too_many_arguments)]
    pub fn ref_rayleigh(
        &self,
        delta_azimuth_deg: f64,
        sun_zenith_deg: f64,
        view_zenith_deg: f64,
        mus: f64,
        muv: f64,
        air_mass: f64,
        phase: &[f64; RAYSCATT_NUM_SER],
        tau: &Spectrum,
    ) -> Spectrum {
        let sza_index = crate::interp::interp_coord(sun_zenith_deg, self.scattering.axis(2));
        let vza_index = crate::interp::interp_coord(view_zenith_deg, self.scattering.axis(3));

        let mut abcd = [[0.0; RAYSCATT_NUM_ORD]; RAYSCATT_NUM_SER];
        for (series, coeffs) in abcd.iter_mut().enumerate() {
            for (order, coeff) in coeffs.iter_mut().enumerate() {
                *coeff = self.scattering.interpolate(&[
                    FractIndex::exact(series),
                    FractIndex::exact(order),
                    sza_index,
                    vza_index,
                ]);
            }
        }

        let delta_azimuth = delta_azimuth_deg.to_radians();
        let mut rho = [0.0; NUM_BANDS];
        for (band, value) in rho.iter_mut().enumerate() {
            let const_term = (1.0 - (-tau[band] * air_mass).exp()) / (4.0 * (mus + muv));
            let mut total = 0.0;
            for series in 0..RAYSCATT_NUM_SER {
                let rho_ss = phase[series] * const_term;
                let mut poly = 0.0;
                let mut power = 1.0;
                for coeff in abcd[series] {
                    poly += coeff * power;
                    power *= rho_ss;
                }
                total += rho_ss * poly * (series as f64 * delta_azimuth).cos();
            }
            *value = total;
        }
        rho
    }

    /// Diffuse plus direct transmittance along a path with cosine `mu`
    pub fn trans_rayleigh(&self, mu: f64, tau: &Spectrum) -> Spectrum {
        let mut trans = [0.0; NUM_BANDS];
        for (band, value) in trans.iter_mut().enumerate() {
            *value = ((2.0 / 3.0 + mu) + (2.0 / 3.0 - mu) * (-tau[band] / mu).exp())
                / (4.0 / 3.0 + tau[band]);
        }
        trans
    }

    /// Spherical albedo per band
    pub fn sph_alb_rayleigh(&self, tau: &Spectrum) -> Spectrum {
        let mut albedo = [0.0; NUM_BANDS];
        for (band, value) in albedo.iter_mut().enumerate() {
            *value = self.albedo.lookup([tau[band]]);
        }
        albedo
    }

    /// `(ρng − ρR) / (Ts Tv + S (ρng − ρR))` for the surface bands, `BAD_VALUE` elsewhere
    pub fn corr_rayleigh(&self, window: &RayleighWindow, rho_ng: &Spectrum) -> Spectrum {
        let mut rho_ag = [BAD_VALUE as f64; NUM_BANDS];
        for band in (0..NUM_BANDS).filter(|&band| is_surface_band(band)) {
            let dum = rho_ng[band] - window.reflectance[band];
            rho_ag[band] = dum
                / (window.trans_sun[band] * window.trans_view[band]
                    + window.spherical_albedo[band] * dum);
        }
        rho_ag
    }

    /// Rayleigh reflectance for a geometry and optical thickness
    pub fn reflectance(
        &self,
        sun_zenith_deg: f64,
        view_zenith_deg: f64,
        delta_azimuth_deg: f64,
        tau: &Spectrum,
    ) -> Spectrum {
        let (sins, mus) = sun_zenith_deg.to_radians().sin_cos();
        let (sinv, muv) = view_zenith_deg.to_radians().sin_cos();
        let phase = self.phase_rayleigh(mus, muv, sins, sinv);
        self.ref_rayleigh(
            delta_azimuth_deg,
            sun_zenith_deg,
            view_zenith_deg,
            mus,
            muv,
            air_mass(sun_zenith_deg, view_zenith_deg),
            &phase,
            tau,
        )
    }

    /// All Rayleigh terms for one geometry and pressure
    pub fn window_terms(&self, geometry: &PixelGeometry) -> RayleighWindow {
        let tau = self.tau_rayleigh(geometry.surface_pressure);
        let mus = geometry.sun_zenith.to_radians().cos();
        let muv = geometry.view_zenith.to_radians().cos();
        RayleighWindow {
            reflectance: self.reflectance(
                geometry.sun_zenith,
                geometry.view_zenith,
                geometry.delta_azimuth,
                &tau,
            ),
            trans_sun: self.trans_rayleigh(mus, &tau),
            trans_view: self.trans_rayleigh(muv, &tau),
            spherical_albedo: self.sph_alb_rayleigh(&tau),
        }
    }
}

/// Rayleigh terms shared by all pixels of a subwindow
#[derive(Debug, Clone, PartialEq)]
pub struct RayleighWindow {
    pub reflectance: Spectrum,
    pub trans_sun: Spectrum,
    pub trans_view: Spectrum,
    pub spherical_albedo: Spectrum,
}

/// Output of the Rayleigh correction
#[derive(Debug, Clone)]
pub struct RayleighOutput {
    /// Bottom-of-Rayleigh reflectance
    pub rho_ag: BandImage,
    /// Negative-reflectance bits per band
    pub flags: Array2<u16>,
}

/// Windowed Rayleigh correction of gas-corrected reflectance
pub struct RayleighCorrector<'a> {
    aux: &'a AuxData,
    model: RayleighModel<'a>,
    correct_water: bool,
}

impl<'a> RayleighCorrector<'a> {
    pub fn new(aux: &'a AuxData, correct_water: bool) -> Self {
        Self {
            aux,
            model: RayleighModel::new(aux),
            correct_water,
        }
    }

    pub fn model(&self) -> &RayleighModel<'a> {
        &self.model
    }

    fn qualifies(&self, scene: &L1bScene, rho_ng: &BandImage, x: usize, y: usize, col: usize, line: usize) -> bool {
        rho_ng[[0, line, col]] != BAD_VALUE && (self.correct_water || scene.is_land(x, y))
    }

    /// Correct a region; `rho_ng` is region-sized
    pub fn process(&self, scene: &L1bScene, rho_ng: &BandImage, region: Region) -> MerisResult<RayleighOutput> {
        scene.check_region(&region)?;
        let (_, ng_height, ng_width) = rho_ng.dim();
        check_region_dim("rho_ng", (ng_height, ng_width), &region)?;
        log::info!(
            "Rayleigh correction for {}x{} region at ({}, {})",
            region.width, region.height, region.x, region.y
        );

        let mut output = RayleighOutput {
            rho_ag: bad_band_image(&region),
            flags: Array2::zeros(region.dim()),
        };
        let mut corrected = 0usize;

        for window in region.subwindows() {
            corrected += self.process_window(scene, rho_ng, &region, &window, &mut output);
        }

        log::debug!("Rayleigh correction applied to {} of {} pixels", corrected, region.pixel_count());
        Ok(output)
    }

    fn process_window(
        &self,
        scene: &L1bScene,
        rho_ng: &BandImage,
        region: &Region,
        window: &Region,
        output: &mut RayleighOutput,
    ) -> usize {
        let mut any = false;
        for y in window.y..window.y_end() {
            for x in window.x..window.x_end() {
                if self.qualifies(scene, rho_ng, x, y, x - region.x, y - region.y) {
                    any = true;
                }
            }
        }
        if !any {
            return 0;
        }

        // window corner stands in for the whole window
        let corner = PixelGeometry::from_scene(scene, window.x, window.y, self.aux.press_scale_height());
        let terms = self.model.window_terms(&corner);

        let mut corrected = 0;
        for y in window.y..window.y_end() {
            for x in window.x..window.x_end() {
                let (col, line) = (x - region.x, y - region.y);
                if !self.qualifies(scene, rho_ng, x, y, col, line) {
                    continue;
                }
                let rho_ag = self.model.corr_rayleigh(&terms, &spectrum_at(rho_ng, col, line));
                let mut flags = 0u16;
                for band in rayleigh_flags::checked_bands() {
                    output.rho_ag[[band, line, col]] = rho_ag[band] as f32;
                    if rho_ag[band] <= 0.0 {
                        if let Some(bit) = rayleigh_flags::negative_reflectance_bit(band) {
                            flags = set_flag(flags, bit, true);
                        }
                    }
                }
                output.flags[[line, col]] = flags;
                corrected += 1;
            }
        }
        corrected
    }
}
