//! Auxiliary data model
//!
//! [`AuxData`] bundles every lookup table, coefficient set and decision table
//! the processing stages need. It is built once per product through
//! [`AuxDataBuilder`], never mutated afterwards, and shared by reference
//! between all tiles and threads.

pub mod decision_tables;
pub mod smile;

use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::interp::{interp_coord, FractIndex, Lut};
use crate::types::{
    MerisError, MerisResult, Spectrum, SurfaceType, BB442, BB665, BB760, BB865, NOMINAL_WAVELENGTHS,
    NUM_BANDS,
};

pub use decision_tables::{CloudTests, DecisionTable};
pub use smile::SmileParams;

/// Number of coefficients of the pressure polynomial (11th order)
pub const PRESSURE_POLY_COEFFS: usize = 12;

/// Fourier terms of the Rayleigh multiple-scattering table
pub const RAYSCATT_NUM_SER: usize = 3;

/// Polynomial orders of the Rayleigh multiple-scattering table
pub const RAYSCATT_NUM_ORD: usize = 4;

/// Mean sun-earth distance (semi-major axis) in metres
pub const ASTRONOMICAL_UNIT: f64 = 149_597_870.0 * 1000.0;

const EARTH_ORBIT_ECCENTRICITY: f64 = 0.017;
const DAYS_TO_PERIHELION_2000: f64 = 3.0 + 5.0 / 24.0;
const DAYS_PER_YEAR: f64 = 365.25;
const UNIX_TIME_2000: f64 = 946_684_800.0;

/// Sun-earth distance factor `r² / d0²` for an acquisition time
pub fn seasonal_factor(time: DateTime<Utc>, sun_earth_distance_square: f64) -> f64 {
    let days_since_2000 = (time.timestamp_millis() as f64 / 1000.0 - UNIX_TIME_2000) / 86_400.0;
    let theta = 2.0 * std::f64::consts::PI * ((days_since_2000 - DAYS_TO_PERIHELION_2000) / DAYS_PER_YEAR);
    let e = EARTH_ORBIT_ECCENTRICITY;
    let r = ASTRONOMICAL_UNIT * (1.0 - e * e) / (1.0 + e * theta.cos());
    r * r / sun_earth_distance_square
}

/// Thresholds and band choices of the cloud classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudParams {
    /// Band whose Rayleigh corrected reflectance is tested for brightness
    pub bright_band: usize,
    /// Numerator and denominator band of the first spectral slope
    pub slope_1_bands: [usize; 2],
    /// Inclusive low/high bounds of the first slope
    pub slope_1_range: [f64; 2],
    pub slope_2_bands: [usize; 2],
    pub slope_2_range: [f64; 2],
    /// Upper bound of the polynomial pressure in hPa
    pub max_pressure: f64,
    /// |ECMWF - polynomial| pressure difference (hPa) above which the confidence flag is raised
    pub delta_pressure_threshold: f64,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            bright_band: BB442,
            slope_1_bands: [BB665, BB442],
            slope_1_range: [0.7, 1.4],
            slope_2_bands: [BB865, BB665],
            slope_2_range: [0.8, 1.3],
            max_pressure: 1100.0,
            delta_pressure_threshold: 40.0,
        }
    }
}

/// One land/water separation scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandScheme {
    /// Band compared against the interpolated reflectance threshold
    pub band: usize,
    pub alpha: f64,
    /// NIR/red factor of the inland water test
    pub beta_inland_water: f64,
    /// NIR/red factor of the island test
    pub beta_island: f64,
}

/// Land/water separation coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandParams {
    /// Scheme used outside glint (865 nm threshold)
    pub clear: LandScheme,
    /// Scheme used for glint-affected pixels (665 nm threshold)
    pub glint: LandScheme,
}

impl Default for LandParams {
    fn default() -> Self {
        Self {
            clear: LandScheme { band: BB865, alpha: 1.0, beta_inland_water: 2.0, beta_island: 0.8 },
            glint: LandScheme { band: BB665, alpha: 1.0, beta_inland_water: 2.0, beta_island: 1.0 },
        }
    }
}

/// Coefficients of the gaseous absorption model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasModel {
    /// Ozone optical thickness per band for 1 atm-cm
    pub tau_o3_norm: Spectrum,
    /// O2 transmittance per band as a cubic polynomial of the 760/753 ratio
    pub o2_transmittance: [[f64; 4]; NUM_BANDS],
    /// Relative change of the 760/753 ratio per nm of detector spectral shift
    pub o2_shift_sensitivity: f64,
    /// Water vapour content (g/cm²) as a cubic polynomial of the 900/885 ratio, clear pixels
    pub h2o_clear: [f64; 4],
    /// Same for pixels with a pressure-confidence flag
    pub h2o_cloud: [f64; 4],
    /// Water vapour absorption per band per g/cm²
    pub h2o_absorption: Spectrum,
    pub max_water_vapour: f64,
}

impl Default for GasModel {
    fn default() -> Self {
        let mut o2_transmittance = [[1.0, 0.0, 0.0, 0.0]; NUM_BANDS];
        o2_transmittance[9] = [0.990, 0.010, 0.0, 0.0];
        o2_transmittance[11] = [0.985, 0.015, 0.0, 0.0];
        Self {
            tau_o3_norm: [
                0.0003, 0.0027, 0.0213, 0.0401, 0.1042, 0.1081, 0.0514, 0.0400, 0.0208, 0.0095,
                0.0081, 0.0071, 0.0020, 0.0016, 0.0015,
            ],
            o2_transmittance,
            o2_shift_sensitivity: 0.01,
            h2o_clear: [8.0, -8.0, 0.0, 0.0],
            h2o_cloud: [4.0, -4.0, 0.0, 0.0],
            h2o_absorption: [
                0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.02, 0.0, 0.0, 0.002, 0.003, 0.01, 0.0,
            ],
            max_water_vapour: 7.0,
        }
    }
}

/// Scalar Rayleigh scattering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayleighParams {
    /// Pressure (hPa) at which `optical_thickness` is tabulated
    pub standard_pressure: f64,
    /// Rayleigh optical thickness per band at standard pressure
    pub optical_thickness: Spectrum,
    /// Phase function `A + B cos²Θ` coefficients
    pub phase_coeffs: [f64; 2],
}

impl Default for RayleighParams {
    fn default() -> Self {
        Self {
            standard_pressure: 1013.25,
            optical_thickness: [
                0.3165, 0.2370, 0.1562, 0.1328, 0.0907, 0.0599, 0.0451, 0.0409, 0.0348, 0.0271,
                0.0259, 0.0238, 0.0155, 0.0141, 0.0132,
            ],
            phase_coeffs: [0.7603, 0.7190],
        }
    }
}

/// Pressure polynomial coefficients tabulated over spectral shift and air mass
#[derive(Debug, Clone)]
pub struct PressurePolynomials {
    spectral_shift_axis: Vec<f64>,
    air_mass_axis: Vec<f64>,
    /// `[shift, air mass, coefficient]`, constant term first
    coefficients: Array3<f64>,
}

impl PressurePolynomials {
    pub fn new(
        spectral_shift_axis: Vec<f64>,
        air_mass_axis: Vec<f64>,
        coefficients: Array3<f64>,
    ) -> MerisResult<Self> {
        let expected = (spectral_shift_axis.len(), air_mass_axis.len(), PRESSURE_POLY_COEFFS);
        if spectral_shift_axis.is_empty() || air_mass_axis.is_empty() {
            return Err(MerisError::InvalidAuxData(
                "Pressure polynomial axes must not be empty".to_string(),
            ));
        }
        if coefficients.dim() != expected {
            return Err(MerisError::InvalidAuxData(format!(
                "Pressure polynomial coefficients have shape {:?}, expected {:?}",
                coefficients.dim(),
                expected
            )));
        }
        Ok(Self { spectral_shift_axis, air_mass_axis, coefficients })
    }

    pub fn num_shifts(&self) -> usize {
        self.spectral_shift_axis.len()
    }

    pub fn locate_shift(&self, spectral_shift: f64) -> FractIndex {
        interp_coord(spectral_shift, &self.spectral_shift_axis)
    }

    pub fn locate_air_mass(&self, air_mass: f64) -> FractIndex {
        interp_coord(air_mass, &self.air_mass_axis)
    }

    pub fn num_air_masses(&self) -> usize {
        self.air_mass_axis.len()
    }

    /// Coefficients of one (shift, air mass) cell, constant term first
    pub fn coefficients(&self, shift_index: usize, air_mass_index: usize) -> ArrayView1<'_, f64> {
        self.coefficients.slice(ndarray::s![shift_index, air_mass_index, ..])
    }
}

/// Immutable auxiliary data of one product
#[derive(Debug, Clone)]
pub struct AuxData {
    seasonal_factor: f64,
    solar_irradiance: Array2<f64>,
    detector_wavelength: Array2<f64>,
    theoretical_wavelength: Spectrum,
    saturation_radiance: Spectrum,
    press_scale_height: f64,
    correction_coeff: Lut,
    pressure_polynomials: PressurePolynomials,
    dp_thresh_land: Lut,
    dp_thresh_water: Lut,
    rhorc_thresh_land: Lut,
    rhorc_thresh_water: Lut,
    cloud_params: CloudParams,
    land_decision_table: DecisionTable,
    water_decision_table: DecisionTable,
    gas_model: GasModel,
    rayleigh_params: RayleighParams,
    rayleigh_scattering: Lut,
    rayleigh_albedo: Lut,
    glint_reflectance: Lut,
    rho_thresh_nir: Lut,
    rho_thresh_red: Lut,
    land_params: LandParams,
    smile_land: SmileParams,
    smile_water: SmileParams,
}

impl AuxData {
    pub fn builder() -> AuxDataBuilder {
        AuxDataBuilder::new()
    }

    pub fn seasonal_factor(&self) -> f64 {
        self.seasonal_factor
    }

    pub fn num_detectors(&self) -> usize {
        self.solar_irradiance.ncols()
    }

    /// Solar irradiance of a band as seen by a detector
    pub fn solar_irradiance(&self, band: usize, detector: usize) -> f64 {
        self.solar_irradiance[[band, detector]]
    }

    /// Measured central wavelength of a band on a detector
    pub fn detector_wavelength(&self, band: usize, detector: usize) -> f64 {
        self.detector_wavelength[[band, detector]]
    }

    pub fn theoretical_wavelength(&self, band: usize) -> f64 {
        self.theoretical_wavelength[band]
    }

    /// Shift (nm) of the 760 nm O2 band of a detector from its nominal wavelength
    pub fn spectral_shift(&self, detector: usize) -> f64 {
        self.detector_wavelength[[BB760, detector]] - self.theoretical_wavelength[BB760]
    }

    pub fn saturation_radiance(&self, band: usize) -> f64 {
        self.saturation_radiance[band]
    }

    /// Scale height (m) of the exponential pressure/altitude model
    pub fn press_scale_height(&self) -> f64 {
        self.press_scale_height
    }

    /// Reflectance ratio correction coefficient over (air mass, ρ753)
    pub fn correction_coeff(&self) -> &Lut {
        &self.correction_coeff
    }

    pub fn pressure_polynomials(&self) -> &PressurePolynomials {
        &self.pressure_polynomials
    }

    /// Pressure difference threshold over (sun zenith, view zenith)
    pub fn dp_thresh(&self, surface: SurfaceType) -> &Lut {
        match surface {
            SurfaceType::Land => &self.dp_thresh_land,
            SurfaceType::Water => &self.dp_thresh_water,
        }
    }

    /// Brightness threshold over (sun zenith, view zenith, azimuth difference)
    pub fn rhorc_thresh(&self, surface: SurfaceType) -> &Lut {
        match surface {
            SurfaceType::Land => &self.rhorc_thresh_land,
            SurfaceType::Water => &self.rhorc_thresh_water,
        }
    }

    pub fn cloud_params(&self) -> &CloudParams {
        &self.cloud_params
    }

    pub fn decision_table(&self, surface: SurfaceType) -> &DecisionTable {
        match surface {
            SurfaceType::Land => &self.land_decision_table,
            SurfaceType::Water => &self.water_decision_table,
        }
    }

    pub fn gas_model(&self) -> &GasModel {
        &self.gas_model
    }

    pub fn rayleigh_params(&self) -> &RayleighParams {
        &self.rayleigh_params
    }

    /// Multiple-scattering coefficients over (series, order, sun zenith, view zenith)
    pub fn rayleigh_scattering(&self) -> &Lut {
        &self.rayleigh_scattering
    }

    /// Spherical albedo over optical thickness
    pub fn rayleigh_albedo(&self) -> &Lut {
        &self.rayleigh_albedo
    }

    /// Glint reflectance over (wind/sun azimuth angle, view zenith, azimuth difference, wind speed, sun zenith)
    pub fn glint_reflectance(&self) -> &Lut {
        &self.glint_reflectance
    }

    /// 865 nm land/water threshold over (sun zenith, view zenith, azimuth difference)
    pub fn rho_thresh_nir(&self) -> &Lut {
        &self.rho_thresh_nir
    }

    /// 665 nm land/water threshold over (sun zenith, view zenith, azimuth difference)
    pub fn rho_thresh_red(&self) -> &Lut {
        &self.rho_thresh_red
    }

    pub fn land_params(&self) -> &LandParams {
        &self.land_params
    }

    pub fn smile_params(&self, surface: SurfaceType) -> &SmileParams {
        match surface {
            SurfaceType::Land => &self.smile_land,
            SurfaceType::Water => &self.smile_water,
        }
    }
}

/// Assembles and validates an [`AuxData`] bundle
///
/// Lookup tables and per-detector arrays are required; scalar parameter
/// sets default to standard values.
#[derive(Debug, Clone)]
pub struct AuxDataBuilder {
    seasonal_factor: Option<f64>,
    acquisition_time: Option<DateTime<Utc>>,
    sun_earth_distance_square: f64,
    solar_irradiance: Option<Array2<f64>>,
    detector_wavelength: Option<Array2<f64>>,
    theoretical_wavelength: Spectrum,
    saturation_radiance: Spectrum,
    press_scale_height: f64,
    correction_coeff: Option<Lut>,
    pressure_polynomials: Option<PressurePolynomials>,
    dp_thresh_land: Option<Lut>,
    dp_thresh_water: Option<Lut>,
    rhorc_thresh_land: Option<Lut>,
    rhorc_thresh_water: Option<Lut>,
    cloud_params: CloudParams,
    land_decision_table: DecisionTable,
    water_decision_table: DecisionTable,
    gas_model: GasModel,
    rayleigh_params: RayleighParams,
    rayleigh_scattering: Option<Lut>,
    rayleigh_albedo: Option<Lut>,
    glint_reflectance: Option<Lut>,
    rho_thresh_nir: Option<Lut>,
    rho_thresh_red: Option<Lut>,
    land_params: LandParams,
    smile_land: SmileParams,
    smile_water: SmileParams,
}

impl Default for AuxDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuxDataBuilder {
    pub fn new() -> Self {
        Self {
            seasonal_factor: None,
            acquisition_time: None,
            sun_earth_distance_square: ASTRONOMICAL_UNIT * ASTRONOMICAL_UNIT,
            solar_irradiance: None,
            detector_wavelength: None,
            theoretical_wavelength: NOMINAL_WAVELENGTHS,
            saturation_radiance: [
                720.0, 700.0, 620.0, 590.0, 520.0, 430.0, 380.0, 370.0, 350.0, 310.0, 300.0, 290.0,
                230.0, 220.0, 210.0,
            ],
            press_scale_height: 8000.0,
            correction_coeff: None,
            pressure_polynomials: None,
            dp_thresh_land: None,
            dp_thresh_water: None,
            rhorc_thresh_land: None,
            rhorc_thresh_water: None,
            cloud_params: CloudParams::default(),
            land_decision_table: DecisionTable::land(),
            water_decision_table: DecisionTable::water(),
            gas_model: GasModel::default(),
            rayleigh_params: RayleighParams::default(),
            rayleigh_scattering: None,
            rayleigh_albedo: None,
            glint_reflectance: None,
            rho_thresh_nir: None,
            rho_thresh_red: None,
            land_params: LandParams::default(),
            smile_land: SmileParams::land(),
            smile_water: SmileParams::water(),
        }
    }

    /// Use an explicit seasonal factor instead of deriving it from the acquisition time
    pub fn seasonal_factor(mut self, factor: f64) -> Self {
        self.seasonal_factor = Some(factor);
        self
    }

    pub fn acquisition_time(mut self, time: DateTime<Utc>) -> Self {
        self.acquisition_time = Some(time);
        self
    }

    pub fn sun_earth_distance_square(mut self, value: f64) -> Self {
        self.sun_earth_distance_square = value;
        self
    }

    /// Solar irradiance per band and detector, shape `(NUM_BANDS, detectors)`
    pub fn solar_irradiance(mut self, irradiance: Array2<f64>) -> Self {
        self.solar_irradiance = Some(irradiance);
        self
    }

    /// Central wavelength per band and detector, shape `(NUM_BANDS, detectors)`
    pub fn detector_wavelength(mut self, wavelength: Array2<f64>) -> Self {
        self.detector_wavelength = Some(wavelength);
        self
    }

    pub fn theoretical_wavelength(mut self, wavelength: Spectrum) -> Self {
        self.theoretical_wavelength = wavelength;
        self
    }

    pub fn saturation_radiance(mut self, radiance: Spectrum) -> Self {
        self.saturation_radiance = radiance;
        self
    }

    pub fn press_scale_height(mut self, height: f64) -> Self {
        self.press_scale_height = height;
        self
    }

    pub fn correction_coeff(mut self, lut: Lut) -> Self {
        self.correction_coeff = Some(lut);
        self
    }

    pub fn pressure_polynomials(mut self, polynomials: PressurePolynomials) -> Self {
        self.pressure_polynomials = Some(polynomials);
        self
    }

    pub fn dp_thresh(mut self, surface: SurfaceType, lut: Lut) -> Self {
        match surface {
            SurfaceType::Land => self.dp_thresh_land = Some(lut),
            SurfaceType::Water => self.dp_thresh_water = Some(lut),
        }
        self
    }

    pub fn rhorc_thresh(mut self, surface: SurfaceType, lut: Lut) -> Self {
        match surface {
            SurfaceType::Land => self.rhorc_thresh_land = Some(lut),
            SurfaceType::Water => self.rhorc_thresh_water = Some(lut),
        }
        self
    }

    pub fn cloud_params(mut self, params: CloudParams) -> Self {
        self.cloud_params = params;
        self
    }

    pub fn decision_table(mut self, surface: SurfaceType, table: DecisionTable) -> Self {
        match surface {
            SurfaceType::Land => self.land_decision_table = table,
            SurfaceType::Water => self.water_decision_table = table,
        }
        self
    }

    pub fn gas_model(mut self, model: GasModel) -> Self {
        self.gas_model = model;
        self
    }

    pub fn rayleigh_params(mut self, params: RayleighParams) -> Self {
        self.rayleigh_params = params;
        self
    }

    pub fn rayleigh_scattering(mut self, lut: Lut) -> Self {
        self.rayleigh_scattering = Some(lut);
        self
    }

    pub fn rayleigh_albedo(mut self, lut: Lut) -> Self {
        self.rayleigh_albedo = Some(lut);
        self
    }

    pub fn glint_reflectance(mut self, lut: Lut) -> Self {
        self.glint_reflectance = Some(lut);
        self
    }

    pub fn rho_thresh_nir(mut self, lut: Lut) -> Self {
        self.rho_thresh_nir = Some(lut);
        self
    }

    pub fn rho_thresh_red(mut self, lut: Lut) -> Self {
        self.rho_thresh_red = Some(lut);
        self
    }

    pub fn land_params(mut self, params: LandParams) -> Self {
        self.land_params = params;
        self
    }

    pub fn smile_params(mut self, surface: SurfaceType, params: SmileParams) -> Self {
        match surface {
            SurfaceType::Land => self.smile_land = params,
            SurfaceType::Water => self.smile_water = params,
        }
        self
    }

    /// Validate and freeze the bundle
    pub fn build(self) -> MerisResult<AuxData> {
        let seasonal_factor = match (self.seasonal_factor, self.acquisition_time) {
            (Some(factor), _) => factor,
            (None, Some(time)) => seasonal_factor(time, self.sun_earth_distance_square),
            (None, None) => {
                return Err(MerisError::MissingAuxData(
                    "seasonal factor or acquisition time".to_string(),
                ))
            }
        };
        if !seasonal_factor.is_finite() || seasonal_factor <= 0.0 {
            return Err(MerisError::InvalidAuxData(format!(
                "Seasonal factor must be positive, got {}",
                seasonal_factor
            )));
        }

        let solar_irradiance = required(self.solar_irradiance, "solar_irradiance")?;
        let detector_wavelength = required(self.detector_wavelength, "detector_wavelength")?;
        if solar_irradiance.nrows() != NUM_BANDS || solar_irradiance.ncols() == 0 {
            return Err(MerisError::InvalidAuxData(format!(
                "Solar irradiance has shape {:?}, expected ({}, detectors)",
                solar_irradiance.dim(),
                NUM_BANDS
            )));
        }
        if detector_wavelength.dim() != solar_irradiance.dim() {
            return Err(MerisError::InvalidAuxData(format!(
                "Detector wavelengths have shape {:?}, solar irradiance {:?}",
                detector_wavelength.dim(),
                solar_irradiance.dim()
            )));
        }
        if !self.press_scale_height.is_finite() || self.press_scale_height <= 0.0 {
            return Err(MerisError::InvalidAuxData(format!(
                "Pressure scale height must be positive, got {}",
                self.press_scale_height
            )));
        }

        let correction_coeff = required_lut(self.correction_coeff, "correction_coeff", 2)?;
        let pressure_polynomials = required(self.pressure_polynomials, "pressure_polynomials")?;
        let dp_thresh_land = required_lut(self.dp_thresh_land, "dp_thresh_land", 2)?;
        let dp_thresh_water = required_lut(self.dp_thresh_water, "dp_thresh_water", 2)?;
        let rhorc_thresh_land = required_lut(self.rhorc_thresh_land, "rhorc_thresh_land", 3)?;
        let rhorc_thresh_water = required_lut(self.rhorc_thresh_water, "rhorc_thresh_water", 3)?;
        let rayleigh_scattering = required_lut(self.rayleigh_scattering, "rayleigh_scattering", 4)?;
        if rayleigh_scattering.axis(0).len() != RAYSCATT_NUM_SER
            || rayleigh_scattering.axis(1).len() != RAYSCATT_NUM_ORD
        {
            return Err(MerisError::InvalidAuxData(format!(
                "LUT 'rayleigh_scattering' must tabulate {} series x {} orders",
                RAYSCATT_NUM_SER, RAYSCATT_NUM_ORD
            )));
        }
        let rayleigh_albedo = required_lut(self.rayleigh_albedo, "rayleigh_albedo", 1)?;
        let glint_reflectance = required_lut(self.glint_reflectance, "glint_reflectance", 5)?;
        let rho_thresh_nir = required_lut(self.rho_thresh_nir, "rho_thresh_nir", 3)?;
        let rho_thresh_red = required_lut(self.rho_thresh_red, "rho_thresh_red", 3)?;

        let cloud = &self.cloud_params;
        let cloud_bands = [
            cloud.bright_band,
            cloud.slope_1_bands[0],
            cloud.slope_1_bands[1],
            cloud.slope_2_bands[0],
            cloud.slope_2_bands[1],
        ];
        check_bands("cloud_params", &cloud_bands)?;
        check_bands(
            "land_params",
            &[self.land_params.clear.band, self.land_params.glint.band],
        )?;
        self.smile_land.validate("land")?;
        self.smile_water.validate("water")?;

        log::debug!(
            "Auxiliary data built: {} detectors, seasonal factor {:.6}",
            solar_irradiance.ncols(),
            seasonal_factor
        );

        Ok(AuxData {
            seasonal_factor,
            solar_irradiance,
            detector_wavelength,
            theoretical_wavelength: self.theoretical_wavelength,
            saturation_radiance: self.saturation_radiance,
            press_scale_height: self.press_scale_height,
            correction_coeff,
            pressure_polynomials,
            dp_thresh_land,
            dp_thresh_water,
            rhorc_thresh_land,
            rhorc_thresh_water,
            cloud_params: self.cloud_params,
            land_decision_table: self.land_decision_table,
            water_decision_table: self.water_decision_table,
            gas_model: self.gas_model,
            rayleigh_params: self.rayleigh_params,
            rayleigh_scattering,
            rayleigh_albedo,
            glint_reflectance,
            rho_thresh_nir,
            rho_thresh_red,
            land_params: self.land_params,
            smile_land: self.smile_land,
            smile_water: self.smile_water,
        })
    }
}

fn required<T>(value: Option<T>, name: &str) -> MerisResult<T> {
    value.ok_or_else(|| MerisError::MissingAuxData(name.to_string()))
}

fn required_lut(lut: Option<Lut>, name: &str, rank: usize) -> MerisResult<Lut> {
    let lut = required(lut, name)?;
    lut.expect_rank(name, rank)?;
    Ok(lut)
}

fn check_bands(name: &str, bands: &[usize]) -> MerisResult<()> {
    if let Some(&band) = bands.iter().find(|&&band| band >= NUM_BANDS) {
        return Err(MerisError::InvalidAuxData(format!(
            "'{}' refers to band {} (only {} bands)",
            name, band, NUM_BANDS
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing;
