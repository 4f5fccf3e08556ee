use ndarray::Array2;

use crate::auxdata::smile::SmileParams;
use crate::auxdata::AuxData;
use crate::flags::{is_flag_set, land};
use crate::types::{
    bad_band_image, check_region_dim, spectrum_at, store_spectrum, BandImage, L1bScene,
    MerisResult, Region, Spectrum, SurfaceType, BAD_VALUE, NUM_BANDS,
};

/// Shifts reflectance from each detector's measured band centre to the nominal one
pub struct SmileCorrector<'a> {
    aux: &'a AuxData,
}

impl<'a> SmileCorrector<'a> {
    pub fn new(aux: &'a AuxData) -> Self {
        Self { aux }
    }

    /// Correct one pixel's spectrum
    ///
    /// Enabled bands are moved along the linear derivative between their two
    /// bracketing bands; disabled and bad bands pass through.
    pub fn correct_pixel(&self, params: &SmileParams, rho: &Spectrum, detector: usize) -> Spectrum {
        let mut corrected = *rho;
        for band in 0..NUM_BANDS {
            if !params.enabled[band] || rho[band] == BAD_VALUE as f64 {
                continue;
            }
            let [lower, upper] = params.derivative_bands[band];
            let d_lambda = self.aux.detector_wavelength(upper, detector)
                - self.aux.detector_wavelength(lower, detector);
            if d_lambda == 0.0 || rho[lower] == BAD_VALUE as f64 || rho[upper] == BAD_VALUE as f64 {
                continue;
            }
            let derivative = (rho[upper] - rho[lower]) / d_lambda;
            let shift = self.aux.theoretical_wavelength(band) - self.aux.detector_wavelength(band, detector);
            corrected[band] = rho[band] + derivative * shift;
        }
        corrected
    }

    /// Correct a region; `rho_ag` and `land_flags` are region-sized
    pub fn process(
        &self,
        scene: &L1bScene,
        rho_ag: &BandImage,
        land_flags: &Array2<u8>,
        region: Region,
    ) -> MerisResult<BandImage> {
        scene.check_detectors(self.aux, &region)?;
        let (_, height, width) = rho_ag.dim();
        check_region_dim("rho_ag", (height, width), &region)?;
        check_region_dim("land_flags", land_flags.dim(), &region)?;
        log::info!(
            "Smile correction for {}x{} region at ({}, {})",
            region.width, region.height, region.x, region.y
        );

        let mut rho_smile = bad_band_image(&region);
        for line in 0..region.height {
            for col in 0..region.width {
                let (x, y) = (region.x + col, region.y + line);
                let detector = match scene.detector(x, y) {
                    Some(detector) if !scene.is_invalid(x, y) => detector,
                    _ => continue,
                };
                let surface = SurfaceType::from_land_flag(is_flag_set(land_flags[[line, col]], land::LANDCONS));
                let rho = spectrum_at(rho_ag, col, line);
                let corrected = self.correct_pixel(self.aux.smile_params(surface), &rho, detector);
                store_spectrum(&mut rho_smile, col, line, &corrected);
            }
        }
        Ok(rho_smile)
    }
}
