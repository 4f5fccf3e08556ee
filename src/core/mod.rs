//! Atmospheric correction and classification stages

pub mod geometry;
pub mod rad2refl;
pub mod cloud_classification;
pub mod gaseous_correction;
pub mod rayleigh;
pub mod land_classification;
pub mod smile_correction;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_scene;

// Re-export main types
pub use geometry::{PixelGeometry, Wind};
pub use rad2refl::ReflectanceConverter;
pub use cloud_classification::{CloudClassifier, PressureResult, PressureTests, SlopeTests};
pub use gaseous_correction::{GasCorrection, GasCorrectionOutput, GaseousCorrector};
pub use rayleigh::{RayleighCorrector, RayleighModel, RayleighOutput, RayleighWindow};
pub use land_classification::{LandClassifier, LandWindow};
pub use smile_correction::SmileCorrector;
pub use pipeline::{BrrOutput, BrrParams, BrrProcessor};
