use serde::{Deserialize, Serialize};

use crate::types::{is_surface_band, MerisError, MerisResult, NUM_BANDS};

/// Per-band smile correction switches and derivative band pairs for one surface type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmileParams {
    pub enabled: [bool; NUM_BANDS],
    /// Lower and upper band used for the reflectance derivative of each band
    pub derivative_bands: [[usize; 2]; NUM_BANDS],
}

const DERIVATIVE_BANDS: [[usize; 2]; NUM_BANDS] = [
    [0, 1],
    [0, 2],
    [1, 3],
    [2, 4],
    [3, 5],
    [4, 6],
    [5, 7],
    [6, 8],
    [7, 9],
    [8, 11],
    [9, 11],
    [9, 12],
    [11, 13],
    [12, 13],
    [12, 13],
];

impl SmileParams {
    /// Land parameters: every band outside the absorption bands is corrected
    pub fn land() -> Self {
        let mut enabled = [false; NUM_BANDS];
        for (band, flag) in enabled.iter_mut().enumerate() {
            *flag = is_surface_band(band);
        }
        Self { enabled, derivative_bands: DERIVATIVE_BANDS }
    }

    /// Water parameters: only the visible bands up to 709 nm are corrected
    pub fn water() -> Self {
        let mut enabled = [false; NUM_BANDS];
        for flag in enabled.iter_mut().take(9) {
            *flag = true;
        }
        Self { enabled, derivative_bands: DERIVATIVE_BANDS }
    }

    pub fn validate(&self, name: &str) -> MerisResult<()> {
        for band in 0..NUM_BANDS {
            if !self.enabled[band] {
                continue;
            }
            let [lower, upper] = self.derivative_bands[band];
            if lower == upper || !is_surface_band(lower) || !is_surface_band(upper) {
                return Err(MerisError::InvalidAuxData(format!(
                    "Smile parameters '{}': band {} uses invalid derivative bands ({}, {})",
                    name, band, lower, upper
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BB760, BB900};

    #[test]
    fn test_standard_sets_are_valid() {
        assert!(SmileParams::land().validate("land").is_ok());
        assert!(SmileParams::water().validate("water").is_ok());
    }

    #[test]
    fn test_absorption_bands_disabled() {
        for params in [SmileParams::land(), SmileParams::water()] {
            assert!(!params.enabled[BB760]);
            assert!(!params.enabled[BB900]);
        }
    }

    #[test]
    fn test_rejects_absorption_band_derivative() {
        let mut params = SmileParams::land();
        params.derivative_bands[3] = [BB760, 11];
        assert!(params.validate("land").is_err());
    }
}
