//! meris-brr: MERIS top-of-atmosphere radiance to bottom-of-Rayleigh reflectance
//!
//! This library converts MERIS L1b radiances into Rayleigh corrected surface
//! reflectance, together with cloud, gaseous absorption, Rayleigh and
//! land/water classification flags. Every stage works on a rectangular
//! region of an [`L1bScene`] and reads the shared, immutable [`AuxData`]
//! bundle; [`BrrProcessor`] chains the stages and processes scenes tile by
//! tile.

pub mod types;
pub mod flags;
pub mod interp;
pub mod auxdata;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BandImage, L1bScene, MerisError, MerisResult, Region, ScalarImage, Spectrum, SurfaceType,
    BAD_VALUE, NUM_BANDS, SUBWIN_SIZE,
};

pub use auxdata::{AuxData, AuxDataBuilder, CloudTests, DecisionTable, SmileParams};
pub use interp::{FractIndex, Lut};
pub use core::{BrrOutput, BrrParams, BrrProcessor};
