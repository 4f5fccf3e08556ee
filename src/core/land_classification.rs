//! Land/water reclassification with sun glint handling

use ndarray::Array2;

use crate::auxdata::{AuxData, LandScheme};
use crate::core::geometry::{PixelGeometry, Wind};
use crate::flags::{is_flag_set, land, set_flag};
use crate::types::{
    check_region_dim, spectrum_at, BandImage, L1bScene, MerisResult, Region, Spectrum,
    BAD_VALUE, BB665, BB865,
};

/// Fraction of the 865 nm reflectance above which glint is considered significant
const GLINT_RATIO: f64 = 0.2;

/// Glint and thresholds evaluated at a window corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandWindow {
    pub glint_reflectance: f64,
    pub thresh_nir: f64,
    pub thresh_red: f64,
}

pub struct LandClassifier<'a> {
    aux: &'a AuxData,
}

impl<'a> LandClassifier<'a> {
    pub fn new(aux: &'a AuxData) -> Self {
        Self { aux }
    }

    /// Glint reflectance and thresholds for one geometry and wind
    pub fn window_terms(&self, geometry: &PixelGeometry, wind: &Wind) -> LandWindow {
        let chi = wind.sun_angle(geometry.sun_azimuth);
        let angles = [geometry.sun_zenith, geometry.view_zenith, geometry.delta_azimuth];
        LandWindow {
            glint_reflectance: self.aux.glint_reflectance().lookup([
                chi,
                geometry.view_zenith,
                geometry.delta_azimuth,
                wind.modulus,
                geometry.sun_zenith,
            ]),
            thresh_nir: self.aux.rho_thresh_nir().lookup(angles),
            thresh_red: self.aux.rho_thresh_red().lookup(angles),
        }
    }

    /// Land flags of one pixel from its top-of-atmosphere reflectance
    pub fn classify_pixel(&self, terms: &LandWindow, rho: &Spectrum, l1b_land: bool) -> u8 {
        let params = self.aux.land_params();
        let glint_affected = terms.glint_reflectance >= GLINT_RATIO * rho[BB865];
        let (scheme, threshold): (&LandScheme, f64) = if glint_affected {
            (&params.glint, terms.thresh_red)
        } else {
            (&params.clear, terms.thresh_nir)
        };

        let limit = scheme.alpha * threshold;
        let inland_water = rho[scheme.band] <= limit && scheme.beta_inland_water * rho[BB865] > rho[BB665];
        let island = rho[scheme.band] > limit && scheme.beta_island * rho[BB865] > rho[BB665];

        let land_consolidated = if glint_affected && !l1b_land { island } else { !inland_water };

        let mut flags = set_flag(0u8, land::MEGLINT, glint_affected);
        flags = set_flag(flags, land::LOINLD, inland_water);
        flags = set_flag(flags, land::ISLAND, island);
        flags = set_flag(flags, land::LANDCONS, land_consolidated);
        flags
    }

    /// Classify a region; `rho_toa` is region-sized
    pub fn process(&self, scene: &L1bScene, rho_toa: &BandImage, region: Region) -> MerisResult<Array2<u8>> {
        scene.check_region(&region)?;
        let (_, height, width) = rho_toa.dim();
        check_region_dim("rho_toa", (height, width), &region)?;
        log::info!(
            "Land classification for {}x{} region at ({}, {})",
            region.width, region.height, region.x, region.y
        );

        let scale_height = self.aux.press_scale_height();
        let mut flags = Array2::zeros(region.dim());

        for window in region.subwindows() {
            let (cx, cy) = (window.x, window.y);
            let corner = PixelGeometry::from_scene(scene, cx, cy, scale_height);
            let wind = Wind::from_components(
                scene.zonal_wind[[cy, cx]] as f64,
                scene.meridional_wind[[cy, cx]] as f64,
            );
            let terms = self.window_terms(&corner, &wind);

            for y in window.y..window.y_end() {
                for x in window.x..window.x_end() {
                    let (col, line) = (x - region.x, y - region.y);
                    if scene.is_invalid(x, y) || rho_toa[[0, line, col]] == BAD_VALUE {
                        continue;
                    }
                    flags[[line, col]] =
                        self.classify_pixel(&terms, &spectrum_at(rho_toa, col, line), scene.is_land(x, y));
                }
            }
        }

        let land_count = flags.iter().filter(|&&f| is_flag_set(f, land::LANDCONS)).count();
        log::debug!("Land classification: {} of {} pixels land", land_count, region.pixel_count());
        Ok(flags)
    }
}
