//! Viewing geometry and ancillary helpers shared by the stages

use crate::types::L1bScene;

/// Floor applied to zenith cosines so grazing geometries keep a finite air mass
pub const MIN_COS_ZENITH: f64 = 0.01;

/// Cosine of a zenith angle (degrees), floored at [`MIN_COS_ZENITH`]
pub fn floored_cos(zenith_deg: f64) -> f64 {
    zenith_deg.to_radians().cos().max(MIN_COS_ZENITH)
}

/// Plane-parallel air mass `1/μs + 1/μv`
pub fn air_mass(sun_zenith_deg: f64, view_zenith_deg: f64) -> f64 {
    1.0 / floored_cos(sun_zenith_deg) + 1.0 / floored_cos(view_zenith_deg)
}

/// Azimuth difference between view and sun directions in degrees, within [0, 180]
pub fn azimuth_difference(view_azimuth_deg: f64, sun_azimuth_deg: f64) -> f64 {
    let cos_delta = (view_azimuth_deg - sun_azimuth_deg).to_radians().cos().clamp(-1.0, 1.0);
    cos_delta.acos().to_degrees()
}

/// Scale ECMWF sea-level pressure to the surface altitude
pub fn correct_ecmwf_pressure(ecmwf_pressure: f64, altitude: f64, scale_height: f64) -> f64 {
    ecmwf_pressure * (-altitude / scale_height).exp()
}

/// Surface pressure of a pixel: altitude corrected over land above sea level, raw otherwise
pub fn surface_pressure(ecmwf_pressure: f64, altitude: f64, is_land: bool, scale_height: f64) -> f64 {
    if is_land && altitude > 0.0 {
        correct_ecmwf_pressure(ecmwf_pressure, altitude, scale_height)
    } else {
        ecmwf_pressure
    }
}

/// Wind speed and direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    /// Speed in m/s
    pub modulus: f64,
    /// Direction the wind blows towards, degrees clockwise from north in [0, 360)
    pub azimuth: f64,
}

impl Wind {
    pub fn from_components(zonal: f64, meridional: f64) -> Self {
        let modulus = (zonal * zonal + meridional * meridional).sqrt();
        let azimuth = if modulus > 0.0 {
            zonal.atan2(meridional).to_degrees().rem_euclid(360.0)
        } else {
            0.0
        };
        Self { modulus, azimuth }
    }

    /// Angle (degrees, [0, 180]) between the sun azimuth and the wind direction
    pub fn sun_angle(&self, sun_azimuth_deg: f64) -> f64 {
        azimuth_difference(sun_azimuth_deg, self.azimuth)
    }
}

/// Geometry and pressure of one pixel, as used by the per-pixel and window-corner computations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGeometry {
    pub sun_zenith: f64,
    pub sun_azimuth: f64,
    pub view_zenith: f64,
    /// Azimuth difference in [0, 180]
    pub delta_azimuth: f64,
    pub air_mass: f64,
    /// ECMWF pressure, altitude corrected over land
    pub surface_pressure: f64,
    pub is_land: bool,
}

impl PixelGeometry {
    pub fn from_scene(scene: &L1bScene, x: usize, y: usize, scale_height: f64) -> Self {
        let sun_zenith = scene.sun_zenith[[y, x]] as f64;
        let sun_azimuth = scene.sun_azimuth[[y, x]] as f64;
        let view_zenith = scene.view_zenith[[y, x]] as f64;
        let is_land = scene.is_land(x, y);
        Self {
            sun_zenith,
            sun_azimuth,
            view_zenith,
            delta_azimuth: azimuth_difference(scene.view_azimuth[[y, x]] as f64, sun_azimuth),
            air_mass: air_mass(sun_zenith, view_zenith),
            surface_pressure: surface_pressure(
                scene.ecmwf_pressure[[y, x]] as f64,
                scene.altitude[[y, x]] as f64,
                is_land,
                scale_height,
            ),
            is_land,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_air_mass_nadir() {
        assert_abs_diff_eq!(air_mass(0.0, 0.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(air_mass(60.0, 0.0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_air_mass_floor_at_grazing_angles() {
        assert_abs_diff_eq!(air_mass(90.0, 0.0), 1.0 / MIN_COS_ZENITH + 1.0, epsilon = 1e-9);
        assert!(air_mass(95.0, 95.0).is_finite());
    }

    #[test]
    fn test_azimuth_difference_range() {
        assert_abs_diff_eq!(azimuth_difference(10.0, 350.0), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(azimuth_difference(270.0, 90.0), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(azimuth_difference(-45.0, 45.0), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pressure_correction_land_only() {
        let corrected = surface_pressure(1013.25, 8000.0, true, 8000.0);
        assert_abs_diff_eq!(corrected, 1013.25 / std::f64::consts::E, epsilon = 1e-9);
        assert_eq!(surface_pressure(1013.25, 8000.0, false, 8000.0), 1013.25);
        assert_eq!(surface_pressure(1013.25, -20.0, true, 8000.0), 1013.25);
        assert_eq!(surface_pressure(1013.25, 0.0, true, 8000.0), 1013.25);
    }

    #[test]
    fn test_wind_from_components() {
        let wind = Wind::from_components(3.0, 4.0);
        assert_abs_diff_eq!(wind.modulus, 5.0, epsilon = 1e-12);
        let east = Wind::from_components(2.0, 0.0);
        assert_abs_diff_eq!(east.azimuth, 90.0, epsilon = 1e-9);
        let south = Wind::from_components(0.0, -1.0);
        assert_abs_diff_eq!(south.azimuth, 180.0, epsilon = 1e-9);
        assert_eq!(Wind::from_components(0.0, 0.0).azimuth, 0.0);
        assert_abs_diff_eq!(east.sun_angle(270.0), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pixel_geometry_from_scene() {
        let mut scene = crate::core::test_scene::uniform_scene(2, 2, true);
        scene.altitude[[1, 0]] = 800.0;
        let flat = PixelGeometry::from_scene(&scene, 1, 1, 8000.0);
        let raised = PixelGeometry::from_scene(&scene, 0, 1, 8000.0);

        assert!(flat.is_land);
        assert_abs_diff_eq!(flat.delta_azimuth, 160.0, epsilon = 1e-4);
        assert_abs_diff_eq!(flat.air_mass, air_mass(30.0, 10.0), epsilon = 1e-6);
        assert_abs_diff_eq!(flat.surface_pressure, 1013.25, epsilon = 1e-9);
        assert_abs_diff_eq!(raised.surface_pressure, 1013.25 * (-0.1f64).exp(), epsilon = 1e-6);
    }
}
