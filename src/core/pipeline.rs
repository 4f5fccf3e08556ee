//! Bottom-of-Rayleigh reflectance processing chain
//!
//! Runs reflectance conversion, cloud classification, gaseous correction,
//! Rayleigh correction, land classification and smile correction over a
//! region. Whole scenes are split into tiles that are processed
//! independently and stitched back together.

use std::time::Instant;

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::auxdata::AuxData;
use crate::core::cloud_classification::CloudClassifier;
use crate::core::gaseous_correction::GaseousCorrector;
use crate::core::land_classification::LandClassifier;
use crate::core::rad2refl::ReflectanceConverter;
use crate::core::rayleigh::RayleighCorrector;
use crate::core::smile_correction::SmileCorrector;
use crate::types::{
    bad_band_image, BandImage, L1bScene, MerisError, MerisResult, Region, SUBWIN_SIZE,
};

/// Processing chain options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrrParams {
    /// Apply gaseous and Rayleigh correction over water as well as land
    pub correct_water: bool,
    /// Tile edge length in pixels; must be a positive multiple of the subwindow size
    pub tile_size: usize,
    /// Process tiles on the rayon thread pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for BrrParams {
    fn default() -> Self {
        Self {
            correct_water: true,
            tile_size: 64,
            parallel: true,
        }
    }
}

impl BrrParams {
    pub fn validate(&self) -> MerisResult<()> {
        if self.tile_size == 0 || self.tile_size % SUBWIN_SIZE != 0 {
            return Err(MerisError::InvalidInput(format!(
                "Tile size must be a positive multiple of {}, got {}",
                SUBWIN_SIZE, self.tile_size
            )));
        }
        Ok(())
    }
}

/// Every intermediate and final product of the chain, sized to `region`
#[derive(Debug, Clone)]
pub struct BrrOutput {
    pub region: Region,
    pub rho_toa: BandImage,
    pub cloud_flags: Array2<u16>,
    pub rho_ng: BandImage,
    pub gas_flags: Array2<u8>,
    pub rho_ag: BandImage,
    pub rayleigh_flags: Array2<u16>,
    pub land_flags: Array2<u8>,
    /// Smile-corrected bottom-of-Rayleigh reflectance
    pub brr: BandImage,
}

impl BrrOutput {
    fn empty(region: Region) -> Self {
        let dim = region.dim();
        Self {
            region,
            rho_toa: bad_band_image(&region),
            cloud_flags: Array2::zeros(dim),
            rho_ng: bad_band_image(&region),
            gas_flags: Array2::zeros(dim),
            rho_ag: bad_band_image(&region),
            rayleigh_flags: Array2::zeros(dim),
            land_flags: Array2::zeros(dim),
            brr: bad_band_image(&region),
        }
    }

    /// Copy a tile's products into place
    fn insert(&mut self, tile: &BrrOutput) {
        let r = &tile.region;
        let (y0, x0) = (r.y - self.region.y, r.x - self.region.x);
        let (y1, x1) = (y0 + r.height, x0 + r.width);

        self.rho_toa.slice_mut(s![.., y0..y1, x0..x1]).assign(&tile.rho_toa);
        self.rho_ng.slice_mut(s![.., y0..y1, x0..x1]).assign(&tile.rho_ng);
        self.rho_ag.slice_mut(s![.., y0..y1, x0..x1]).assign(&tile.rho_ag);
        self.brr.slice_mut(s![.., y0..y1, x0..x1]).assign(&tile.brr);
        self.cloud_flags.slice_mut(s![y0..y1, x0..x1]).assign(&tile.cloud_flags);
        self.gas_flags.slice_mut(s![y0..y1, x0..x1]).assign(&tile.gas_flags);
        self.rayleigh_flags.slice_mut(s![y0..y1, x0..x1]).assign(&tile.rayleigh_flags);
        self.land_flags.slice_mut(s![y0..y1, x0..x1]).assign(&tile.land_flags);
    }
}

/// Drives all stages with one shared auxiliary data bundle
pub struct BrrProcessor<'a> {
    aux: &'a AuxData,
    params: BrrParams,
}

impl<'a> BrrProcessor<'a> {
    pub fn new(aux: &'a AuxData, params: BrrParams) -> MerisResult<Self> {
        params.validate()?;
        Ok(Self { aux, params })
    }

    pub fn params(&self) -> &BrrParams {
        &self.params
    }

    /// Run every stage over one region
    ///
    /// Subwindows are anchored at the region origin, so regions handed in by
    /// [`process`](Self::process) start on multiples of the tile size.
    pub fn process_region(&self, scene: &L1bScene, region: Region) -> MerisResult<BrrOutput> {
        scene.check_detectors(self.aux, &region)?;
        log::debug!("Processing region {:?}", region);

        let rho_toa = ReflectanceConverter::new(self.aux).process(scene, region)?;
        let cloud_flags = CloudClassifier::new(self.aux).process(scene, &rho_toa, region)?;
        let gas = GaseousCorrector::new(self.aux, self.params.correct_water)
            .process(scene, &rho_toa, &cloud_flags, region)?;
        let rayleigh = RayleighCorrector::new(self.aux, self.params.correct_water)
            .process(scene, &gas.rho_ng, region)?;
        let land_flags = LandClassifier::new(self.aux).process(scene, &rho_toa, region)?;
        let brr = SmileCorrector::new(self.aux).process(scene, &rayleigh.rho_ag, &land_flags, region)?;

        Ok(BrrOutput {
            region,
            rho_toa,
            cloud_flags,
            rho_ng: gas.rho_ng,
            gas_flags: gas.flags,
            rho_ag: rayleigh.rho_ag,
            rayleigh_flags: rayleigh.flags,
            land_flags,
            brr,
        })
    }

    /// Process a whole scene tile by tile
    pub fn process(&self, scene: &L1bScene) -> MerisResult<BrrOutput> {
        scene.validate(self.aux)?;
        let region = scene.full_region();
        let tiles = region.tiles(self.params.tile_size, self.params.tile_size);
        log::info!(
            "Processing {}x{} scene in {} tiles",
            region.width,
            region.height,
            tiles.len()
        );

        let start = Instant::now();
        let results = if self.params.parallel {
            self.process_tiles_parallel(scene, &tiles)?
        } else {
            self.process_tiles_sequential(scene, &tiles)?
        };

        let mut output = BrrOutput::empty(region);
        for tile in &results {
            output.insert(tile);
        }

        let elapsed = start.elapsed();
        log::info!(
            "Scene processed in {:.2} s ({:.0} pixels/sec)",
            elapsed.as_secs_f64(),
            region.pixel_count() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
        );
        Ok(output)
    }

    fn process_tiles_sequential(&self, scene: &L1bScene, tiles: &[Region]) -> MerisResult<Vec<BrrOutput>> {
        tiles
            .iter()
            .map(|&tile| self.process_region(scene, tile))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn process_tiles_parallel(&self, scene: &L1bScene, tiles: &[Region]) -> MerisResult<Vec<BrrOutput>> {
        use rayon::prelude::*;

        log::debug!("Processing {} tiles with parallel processing", tiles.len());
        tiles
            .par_iter()
            .map(|&tile| self.process_region(scene, tile))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn process_tiles_parallel(&self, scene: &L1bScene, tiles: &[Region]) -> MerisResult<Vec<BrrOutput>> {
        log::warn!("Parallel processing requested but the 'parallel' feature is disabled");
        self.process_tiles_sequential(scene, tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auxdata::testing::synthetic_builder;
    use crate::core::test_scene::uniform_scene;
    use crate::flags::{l1b, set_flag};
    use crate::types::{BAD_VALUE, NUM_BANDS};

    #[test]
    fn test_params_validation() {
        assert!(BrrParams::default().validate().is_ok());
        for tile_size in [0, 6, 30] {
            let params = BrrParams { tile_size, ..BrrParams::default() };
            assert!(params.validate().is_err());
        }
        let aux = synthetic_builder(1).build().unwrap();
        assert!(BrrProcessor::new(&aux, BrrParams { tile_size: 10, ..BrrParams::default() }).is_err());
    }

    #[test]
    fn test_tiled_matches_single_region() {
        let aux = synthetic_builder(1).build().unwrap();
        let mut scene = uniform_scene(11, 9, false);
        for ((y, x), value) in scene.radiance.slice_mut(s![0, .., ..]).indexed_iter_mut().map(|((y, x), v): ((usize, usize), &mut f32)| ((y, x), v)) {
            *value += (x + 2 * y) as f32;
        }
        for x in 0..4 {
            scene.l1_flags[[5, x]] = set_flag(0u8, l1b::LAND_OCEAN, true);
        }

        let params = BrrParams { tile_size: 4, parallel: false, ..BrrParams::default() };
        let processor = BrrProcessor::new(&aux, params).unwrap();
        let tiled = processor.process(&scene).unwrap();
        let whole = processor.process_region(&scene, scene.full_region()).unwrap();

        assert_eq!(tiled.rho_toa, whole.rho_toa);
        assert_eq!(tiled.cloud_flags, whole.cloud_flags);
        assert_eq!(tiled.rho_ng, whole.rho_ng);
        assert_eq!(tiled.gas_flags, whole.gas_flags);
        assert_eq!(tiled.rho_ag, whole.rho_ag);
        assert_eq!(tiled.rayleigh_flags, whole.rayleigh_flags);
        assert_eq!(tiled.land_flags, whole.land_flags);
        assert_eq!(tiled.brr, whole.brr);
    }

    #[test]
    fn test_invalid_scene_rejected() {
        let aux = synthetic_builder(1).build().unwrap();
        let mut scene = uniform_scene(4, 4, false);
        scene.detector_index[[1, 1]] = 3;
        let processor = BrrProcessor::new(&aux, BrrParams::default()).unwrap();
        assert!(processor.process(&scene).is_err());

        // invalid pixels may carry any detector index
        scene.l1_flags[[1, 1]] = set_flag(0u8, l1b::INVALID, true);
        let output = processor.process(&scene).unwrap();
        for band in 0..NUM_BANDS {
            assert_eq!(output.brr[[band, 1, 1]], BAD_VALUE);
        }
    }
}
