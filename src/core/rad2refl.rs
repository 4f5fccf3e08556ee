use std::f64::consts::PI;

use crate::auxdata::AuxData;
use crate::types::{store_bad, BandImage, L1bScene, MerisResult, Region, Spectrum, NUM_BANDS};

/// Converts L1b radiances into top-of-atmosphere reflectances
pub struct ReflectanceConverter<'a> {
    aux: &'a AuxData,
}

impl<'a> ReflectanceConverter<'a> {
    pub fn new(aux: &'a AuxData) -> Self {
        Self { aux }
    }

    /// Reflectance of one pixel: `L π / cos(θs) · seasonal factor / E0`
    ///
    /// The sun zenith must be below 90°; the cosine is not guarded.
    pub fn pixel_reflectance(&self, radiance: &Spectrum, sun_zenith_deg: f64, detector: usize) -> Spectrum {
        let constant_term = PI / sun_zenith_deg.to_radians().cos() * self.aux.seasonal_factor();
        let mut reflectance = [0.0; NUM_BANDS];
        for (band, value) in reflectance.iter_mut().enumerate() {
            *value = radiance[band] * constant_term / self.aux.solar_irradiance(band, detector);
        }
        reflectance
    }

    /// Top-of-atmosphere reflectance of a region; invalid pixels get `BAD_VALUE`
    pub fn process(&self, scene: &L1bScene, region: Region) -> MerisResult<BandImage> {
        scene.check_detectors(self.aux, &region)?;
        log::info!(
            "Converting radiance to reflectance for {}x{} region at ({}, {})",
            region.width, region.height, region.x, region.y
        );

        let mut rho_toa = BandImage::zeros((NUM_BANDS, region.height, region.width));
        let mut invalid_count = 0usize;

        for line in 0..region.height {
            for col in 0..region.width {
                let (x, y) = (region.x + col, region.y + line);
                let detector = match scene.detector(x, y) {
                    Some(detector) if !scene.is_invalid(x, y) => detector,
                    _ => {
                        store_bad(&mut rho_toa, col, line);
                        invalid_count += 1;
                        continue;
                    }
                };

                let reflectance = self.pixel_reflectance(
                    &scene.radiance_at(x, y),
                    scene.sun_zenith[[y, x]] as f64,
                    detector,
                );
                for (band, &value) in reflectance.iter().enumerate() {
                    rho_toa[[band, line, col]] = value as f32;
                }
            }
        }

        log::debug!(
            "Reflectance conversion done: {} of {} pixels invalid",
            invalid_count,
            region.pixel_count()
        );
        Ok(rho_toa)
    }
}
