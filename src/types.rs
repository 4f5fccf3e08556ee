use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::auxdata::AuxData;
use crate::flags::{is_flag_set, l1b};

/// Number of MERIS spectral bands
pub const NUM_BANDS: usize = 15;

/// Sentinel written to every band of a pixel that was not processed
pub const BAD_VALUE: f32 = -1.0;

/// Edge length of the subwindows used by the windowed stages
pub const SUBWIN_SIZE: usize = 4;

// Zero-based MERIS band indices
pub const BB412: usize = 0;
pub const BB442: usize = 1;
pub const BB490: usize = 2;
pub const BB510: usize = 3;
pub const BB560: usize = 4;
pub const BB620: usize = 5;
pub const BB665: usize = 6;
pub const BB681: usize = 7;
pub const BB709: usize = 8;
pub const BB753: usize = 9;
pub const BB760: usize = 10;
pub const BB778: usize = 11;
pub const BB865: usize = 12;
pub const BB885: usize = 13;
pub const BB900: usize = 14;

/// Nominal band centre wavelengths in nm
pub const NOMINAL_WAVELENGTHS: [f64; NUM_BANDS] = [
    412.691, 442.559, 489.882, 509.819, 559.694, 619.601, 664.573, 680.821,
    708.329, 753.371, 761.508, 778.409, 864.876, 884.944, 900.000,
];

/// Whether a band takes part in visible/NIR surface processing
/// (the O2 band at 760 nm and the water vapour band at 900 nm do not)
pub fn is_surface_band(band: usize) -> bool {
    band < NUM_BANDS && band != BB760 && band != BB900
}

/// Per-band raster (band x line x column)
pub type BandImage = Array3<f32>;

/// Per-pixel scalar raster (line x column)
pub type ScalarImage = Array2<f32>;

/// Per-band values of a single pixel
pub type Spectrum = [f64; NUM_BANDS];

/// Rectangular pixel region of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// Region covering a whole raster of the given dimensions
    pub fn full(height: usize, width: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Output array shape (lines, columns)
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn x_end(&self) -> usize {
        self.x + self.width
    }

    pub fn y_end(&self) -> usize {
        self.y + self.height
    }

    /// Whether `other` lies completely inside this region
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x_end() <= self.x_end()
            && other.y_end() <= self.y_end()
    }

    /// Split into tiles of at most `tile_width` x `tile_height`, anchored at the region origin
    pub fn tiles(&self, tile_width: usize, tile_height: usize) -> Vec<Region> {
        let mut tiles = Vec::new();
        if self.is_empty() || tile_width == 0 || tile_height == 0 {
            return tiles;
        }
        let mut y = self.y;
        while y < self.y_end() {
            let height = tile_height.min(self.y_end() - y);
            let mut x = self.x;
            while x < self.x_end() {
                let width = tile_width.min(self.x_end() - x);
                tiles.push(Region::new(x, y, width, height));
                x += width;
            }
            y += height;
        }
        tiles
    }

    /// Subwindows of `SUBWIN_SIZE` pixels, partial at the right and bottom edges
    pub fn subwindows(&self) -> Vec<Region> {
        self.tiles(SUBWIN_SIZE, SUBWIN_SIZE)
    }
}

/// Surface type selecting land- or water-specific tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    Land,
    Water,
}

impl SurfaceType {
    pub fn from_land_flag(is_land: bool) -> Self {
        if is_land {
            SurfaceType::Land
        } else {
            SurfaceType::Water
        }
    }
}

impl std::fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceType::Land => write!(f, "land"),
            SurfaceType::Water => write!(f, "water"),
        }
    }
}

/// MERIS L1b scene: per-pixel radiances, geometry and ancillary fields
///
/// Angles are in degrees, altitude in metres, winds in m/s, pressure in hPa
/// and ozone in Dobson units. Band images are indexed `[band, line, column]`,
/// scalar images `[line, column]`.
#[derive(Debug, Clone)]
pub struct L1bScene {
    pub radiance: BandImage,
    /// Detector index per pixel, negative where no detector is assigned
    pub detector_index: Array2<i16>,
    pub l1_flags: Array2<u8>,
    pub sun_zenith: ScalarImage,
    pub sun_azimuth: ScalarImage,
    pub view_zenith: ScalarImage,
    pub view_azimuth: ScalarImage,
    pub altitude: ScalarImage,
    pub zonal_wind: ScalarImage,
    pub meridional_wind: ScalarImage,
    pub ecmwf_pressure: ScalarImage,
    pub ozone: ScalarImage,
    /// Cloud-top pressure from the neural-net retrieval, when available
    pub cloud_top_pressure: Option<ScalarImage>,
}

impl L1bScene {
    /// Scene dimensions (lines, columns)
    pub fn dim(&self) -> (usize, usize) {
        self.l1_flags.dim()
    }

    pub fn full_region(&self) -> Region {
        let (height, width) = self.dim();
        Region::full(height, width)
    }

    pub fn is_invalid(&self, x: usize, y: usize) -> bool {
        is_flag_set(self.l1_flags[[y, x]], l1b::INVALID)
    }

    pub fn is_land(&self, x: usize, y: usize) -> bool {
        is_flag_set(self.l1_flags[[y, x]], l1b::LAND_OCEAN)
    }

    /// Detector of a pixel; `None` where the L1b product assigns none
    pub fn detector(&self, x: usize, y: usize) -> Option<usize> {
        let detector = self.detector_index[[y, x]];
        if detector < 0 {
            None
        } else {
            Some(detector as usize)
        }
    }

    /// Radiances of all bands at one pixel
    pub fn radiance_at(&self, x: usize, y: usize) -> Spectrum {
        let mut spectrum = [0.0; NUM_BANDS];
        for (band, value) in spectrum.iter_mut().enumerate() {
            *value = self.radiance[[band, y, x]] as f64;
        }
        spectrum
    }

    /// Check array shapes and detector coverage against the auxiliary data
    pub fn validate(&self, aux: &AuxData) -> MerisResult<()> {
        let (height, width) = self.dim();
        if height == 0 || width == 0 {
            return Err(MerisError::InvalidInput("Scene is empty".to_string()));
        }

        let radiance_dim = self.radiance.dim();
        if radiance_dim != (NUM_BANDS, height, width) {
            return Err(MerisError::InvalidInput(format!(
                "Radiance cube has shape {:?}, expected ({}, {}, {})",
                radiance_dim, NUM_BANDS, height, width
            )));
        }

        let scalars = [
            ("detector_index", self.detector_index.dim()),
            ("sun_zenith", self.sun_zenith.dim()),
            ("sun_azimuth", self.sun_azimuth.dim()),
            ("view_zenith", self.view_zenith.dim()),
            ("view_azimuth", self.view_azimuth.dim()),
            ("altitude", self.altitude.dim()),
            ("zonal_wind", self.zonal_wind.dim()),
            ("meridional_wind", self.meridional_wind.dim()),
            ("ecmwf_pressure", self.ecmwf_pressure.dim()),
            ("ozone", self.ozone.dim()),
        ];
        for (name, dim) in scalars {
            if dim != (height, width) {
                return Err(MerisError::InvalidInput(format!(
                    "Band '{}' has shape {:?}, expected ({}, {})",
                    name, dim, height, width
                )));
            }
        }
        if let Some(ctp) = &self.cloud_top_pressure {
            if ctp.dim() != (height, width) {
                return Err(MerisError::InvalidInput(format!(
                    "Band 'cloud_top_pressure' has shape {:?}, expected ({}, {})",
                    ctp.dim(),
                    height,
                    width
                )));
            }
        }

        self.check_detectors(aux, &self.full_region())
    }

    /// Check that every valid pixel of `region` has a detector covered by the calibration tables
    pub fn check_detectors(&self, aux: &AuxData, region: &Region) -> MerisResult<()> {
        self.check_region(region)?;
        if self.detector_index.dim() != self.dim() {
            return Err(MerisError::InvalidInput(format!(
                "Band 'detector_index' has shape {:?}, expected {:?}",
                self.detector_index.dim(),
                self.dim()
            )));
        }

        let num_detectors = aux.num_detectors();
        for y in region.y..region.y_end() {
            for x in region.x..region.x_end() {
                if self.is_invalid(x, y) {
                    continue;
                }
                match self.detector(x, y) {
                    Some(detector) if detector < num_detectors => {}
                    other => {
                        return Err(MerisError::InvalidInput(format!(
                            "Valid pixel ({}, {}) has detector index {:?} outside 0..{}",
                            x, y, other, num_detectors
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Check that `region` is non-empty and inside the scene
    pub fn check_region(&self, region: &Region) -> MerisResult<()> {
        if region.is_empty() {
            return Err(MerisError::InvalidRegion(format!("Region {:?} is empty", region)));
        }
        if !self.full_region().contains(region) {
            let (height, width) = self.dim();
            return Err(MerisError::InvalidRegion(format!(
                "Region {:?} exceeds scene bounds {}x{}",
                region, width, height
            )));
        }
        Ok(())
    }
}

/// Check that a region-sized intermediate array matches the region
pub(crate) fn check_region_dim(
    name: &str,
    actual: (usize, usize),
    region: &Region,
) -> MerisResult<()> {
    if actual != region.dim() {
        return Err(MerisError::InvalidInput(format!(
            "'{}' has shape {:?}, expected {:?} for region {:?}",
            name,
            actual,
            region.dim(),
            region
        )));
    }
    Ok(())
}

/// Read all bands of a region-local band image at local pixel (col, line)
pub(crate) fn spectrum_at(image: &BandImage, col: usize, line: usize) -> Spectrum {
    let mut spectrum = [0.0; NUM_BANDS];
    for (band, value) in spectrum.iter_mut().enumerate() {
        *value = image[[band, line, col]] as f64;
    }
    spectrum
}

/// Write all bands of a pixel into a region-local band image
pub(crate) fn store_spectrum(image: &mut BandImage, col: usize, line: usize, spectrum: &Spectrum) {
    for (band, &value) in spectrum.iter().enumerate() {
        image[[band, line, col]] = value as f32;
    }
}

/// Fill every band of a pixel with `BAD_VALUE`
pub(crate) fn store_bad(image: &mut BandImage, col: usize, line: usize) {
    for band in 0..NUM_BANDS {
        image[[band, line, col]] = BAD_VALUE;
    }
}

/// Region-sized band image initialised to `BAD_VALUE`
pub(crate) fn bad_band_image(region: &Region) -> BandImage {
    BandImage::from_elem((NUM_BANDS, region.height, region.width), BAD_VALUE)
}

/// Error types for MERIS processing
#[derive(Debug, thiserror::Error)]
pub enum MerisError {
    #[error("Missing auxiliary data: {0}")]
    MissingAuxData(String),

    #[error("Invalid auxiliary data: {0}")]
    InvalidAuxData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for MERIS operations
pub type MerisResult<T> = Result<T, MerisError>;
