//! Synthetic L1b scenes for unit tests

use ndarray::Array2;

use crate::flags::{l1b, set_flag};
use crate::types::{BandImage, L1bScene, ScalarImage, NUM_BANDS};

pub(crate) const SUN_ZENITH: f32 = 30.0;
pub(crate) const SUN_AZIMUTH: f32 = 120.0;
pub(crate) const VIEW_ZENITH: f32 = 10.0;
pub(crate) const VIEW_AZIMUTH: f32 = 280.0;
pub(crate) const RADIANCE: f32 = 50.0;

fn filled(height: usize, width: usize, value: f32) -> ScalarImage {
    ScalarImage::from_elem((height, width), value)
}

/// Valid sea-level scene with identical geometry and radiance everywhere
pub(crate) fn uniform_scene(height: usize, width: usize, is_land: bool) -> L1bScene {
    let flags = set_flag(0u8, l1b::LAND_OCEAN, is_land);
    L1bScene {
        radiance: BandImage::from_elem((NUM_BANDS, height, width), RADIANCE),
        detector_index: Array2::zeros((height, width)),
        l1_flags: Array2::from_elem((height, width), flags),
        sun_zenith: filled(height, width, SUN_ZENITH),
        sun_azimuth: filled(height, width, SUN_AZIMUTH),
        view_zenith: filled(height, width, VIEW_ZENITH),
        view_azimuth: filled(height, width, VIEW_AZIMUTH),
        altitude: filled(height, width, 0.0),
        zonal_wind: filled(height, width, 3.0),
        meridional_wind: filled(height, width, 4.0),
        ecmwf_pressure: filled(height, width, 1013.25),
        ozone: filled(height, width, 300.0),
        cloud_top_pressure: None,
    }
}
