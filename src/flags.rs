//! Named-bit access to flag words
//!
//! Bit positions are fixed per flag set. Indices are not range checked:
//! callers stay within the width of the word they manipulate.

use num_traits::PrimInt;

/// Return `word` with bit `index` set to `value`
pub fn set_flag<T: PrimInt>(word: T, index: u32, value: bool) -> T {
    let mask = T::one() << index as usize;
    if value {
        word | mask
    } else {
        word & !mask
    }
}

/// Whether bit `index` of `word` is set
pub fn is_flag_set<T: PrimInt>(word: T, index: u32) -> bool {
    (word >> index as usize) & T::one() == T::one()
}

/// One named bit of a flag word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDef {
    pub name: &'static str,
    pub bit: u32,
    pub description: &'static str,
}

/// Names of all flags of `coding` that are set in `word`
pub fn set_flag_names<T: PrimInt>(coding: &[FlagDef], word: T) -> Vec<&'static str> {
    coding
        .iter()
        .filter(|def| is_flag_set(word, def.bit))
        .map(|def| def.name)
        .collect()
}

/// MERIS L1b quality flags (8-bit)
pub mod l1b {
    use super::FlagDef;

    pub const COSMETIC: u32 = 0;
    pub const DUPLICATED: u32 = 1;
    pub const GLINT_RISK: u32 = 2;
    pub const SUSPECT: u32 = 3;
    pub const LAND_OCEAN: u32 = 4;
    pub const BRIGHT: u32 = 5;
    pub const COASTLINE: u32 = 6;
    pub const INVALID: u32 = 7;

    pub const CODING: &[FlagDef] = &[
        FlagDef { name: "COSMETIC", bit: COSMETIC, description: "Pixel is cosmetic" },
        FlagDef { name: "DUPLICATED", bit: DUPLICATED, description: "Pixel has been duplicated (filled in)" },
        FlagDef { name: "GLINT_RISK", bit: GLINT_RISK, description: "Pixel has glint risk" },
        FlagDef { name: "SUSPECT", bit: SUSPECT, description: "Pixel is suspect" },
        FlagDef { name: "LAND_OCEAN", bit: LAND_OCEAN, description: "Pixel is over land, not ocean" },
        FlagDef { name: "BRIGHT", bit: BRIGHT, description: "Pixel is bright" },
        FlagDef { name: "COASTLINE", bit: COASTLINE, description: "Pixel is part of a coastline" },
        FlagDef { name: "INVALID", bit: INVALID, description: "Pixel is invalid" },
    ];
}

/// Cloud classification output flags (16-bit)
pub mod cloud {
    use super::FlagDef;

    pub const CLOUD: u32 = 0;
    pub const BRIGHT: u32 = 1;
    pub const LOW_NN_P: u32 = 2;
    pub const PCD_NN_P: u32 = 3;
    pub const LOW_POL_P: u32 = 4;
    pub const PCD_POL_P: u32 = 5;
    pub const CONFIDENCE_P: u32 = 6;
    pub const SLOPE_1: u32 = 7;
    pub const SLOPE_2: u32 = 8;

    pub const CODING: &[FlagDef] = &[
        FlagDef { name: "F_CLOUD", bit: CLOUD, description: "Pixel is cloudy" },
        FlagDef { name: "F_BRIGHT", bit: BRIGHT, description: "Rayleigh corrected reflectance above brightness threshold" },
        FlagDef { name: "F_LOW_NN_P", bit: LOW_NN_P, description: "Neural-net pressure below surface threshold" },
        FlagDef { name: "F_PCD_NN_P", bit: PCD_NN_P, description: "Neural-net pressure confidence" },
        FlagDef { name: "F_LOW_POL_P", bit: LOW_POL_P, description: "Polynomial pressure below surface threshold" },
        FlagDef { name: "F_PCD_POL_P", bit: PCD_POL_P, description: "Polynomial pressure computation raised an error" },
        FlagDef { name: "F_CONFIDENCE_P", bit: CONFIDENCE_P, description: "Polynomial pressure differs from ECMWF pressure" },
        FlagDef { name: "F_SLOPE_1", bit: SLOPE_1, description: "First spectral slope within cloud range" },
        FlagDef { name: "F_SLOPE_2", bit: SLOPE_2, description: "Second spectral slope within cloud range" },
    ];
}

/// Gaseous correction output flags (8-bit)
pub mod gas {
    use super::FlagDef;

    pub const DO_CORRECT: u32 = 0;
    pub const SUN70: u32 = 1;
    pub const ORINP0: u32 = 2;
    pub const OROUT0: u32 = 3;

    pub const CODING: &[FlagDef] = &[
        FlagDef { name: "F_DO_CORRECT", bit: DO_CORRECT, description: "Gaseous correction applied" },
        FlagDef { name: "F_SUN70", bit: SUN70, description: "Sun zenith angle above 70 degrees" },
        FlagDef { name: "F_ORINP0", bit: ORINP0, description: "Absorption ratio input invalid, default used" },
        FlagDef { name: "F_OROUT0", bit: OROUT0, description: "Absorption model out of range" },
    ];
}

/// Rayleigh correction output flags (16-bit), one negative-reflectance bit per band
pub mod rayleigh {
    use crate::types::{is_surface_band, NUM_BANDS};

    /// Bit flagging negative corrected reflectance in `band`, if the band is checked
    pub fn negative_reflectance_bit(band: usize) -> Option<u32> {
        if is_surface_band(band) {
            Some(band as u32)
        } else {
            None
        }
    }

    /// Bands carrying a negative-reflectance bit
    pub fn checked_bands() -> impl Iterator<Item = usize> {
        (0..NUM_BANDS).filter(|&band| is_surface_band(band))
    }
}

/// Land/water classification output flags (8-bit)
pub mod land {
    use super::FlagDef;

    pub const MEGLINT: u32 = 0;
    pub const LOINLD: u32 = 1;
    pub const ISLAND: u32 = 2;
    pub const LANDCONS: u32 = 3;

    pub const CODING: &[FlagDef] = &[
        FlagDef { name: "F_MEGLINT", bit: MEGLINT, description: "Glint reflectance dominates the NIR signal" },
        FlagDef { name: "F_LOINLD", bit: LOINLD, description: "Inland water" },
        FlagDef { name: "F_ISLAND", bit: ISLAND, description: "Island in a glint area" },
        FlagDef { name: "F_LANDCONS", bit: LANDCONS, description: "Consolidated land" },
    ];
}
