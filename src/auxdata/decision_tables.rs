//! Cloud decision tables
//!
//! A pixel's cloud tests are packed into an 8-bit index (see [`CloudTests::index`])
//! which selects the verdict from a 256-entry table, one table per surface type.

use serde::{Deserialize, Serialize};

use crate::flags::{is_flag_set, set_flag};
use crate::types::SurfaceType;

pub const CC_BRIGHT: u32 = 0;
pub const CC_LOW_P_NN: u32 = 1;
pub const CC_LOW_P_PO: u32 = 2;
pub const CC_DELTA_P: u32 = 3;
pub const CC_PCD_NN: u32 = 4;
pub const CC_PCD_PO: u32 = 5;
pub const CC_SLOPE_1: u32 = 6;
pub const CC_SLOPE_2: u32 = 7;

/// Boolean inputs of the table-driven cloud decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloudTests {
    pub bright: bool,
    pub low_pressure_nn: bool,
    pub low_pressure_poly: bool,
    pub delta_pressure: bool,
    pub pcd_nn: bool,
    pub pcd_poly: bool,
    pub slope_1: bool,
    pub slope_2: bool,
}

impl CloudTests {
    /// Pack the tests into the decision table index
    pub fn index(&self) -> u8 {
        let mut index = 0u8;
        index = set_flag(index, CC_BRIGHT, self.bright);
        index = set_flag(index, CC_LOW_P_NN, self.low_pressure_nn);
        index = set_flag(index, CC_LOW_P_PO, self.low_pressure_poly);
        index = set_flag(index, CC_DELTA_P, self.delta_pressure);
        index = set_flag(index, CC_PCD_NN, self.pcd_nn);
        index = set_flag(index, CC_PCD_PO, self.pcd_poly);
        index = set_flag(index, CC_SLOPE_1, self.slope_1);
        index = set_flag(index, CC_SLOPE_2, self.slope_2);
        index
    }

    pub fn from_index(index: u8) -> Self {
        Self {
            bright: is_flag_set(index, CC_BRIGHT),
            low_pressure_nn: is_flag_set(index, CC_LOW_P_NN),
            low_pressure_poly: is_flag_set(index, CC_LOW_P_PO),
            delta_pressure: is_flag_set(index, CC_DELTA_P),
            pcd_nn: is_flag_set(index, CC_PCD_NN),
            pcd_poly: is_flag_set(index, CC_PCD_PO),
            slope_1: is_flag_set(index, CC_SLOPE_1),
            slope_2: is_flag_set(index, CC_SLOPE_2),
        }
    }
}

/// 256-entry cloud verdict table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTable {
    entries: [bool; 256],
}

impl DecisionTable {
    pub fn new(entries: [bool; 256]) -> Self {
        Self { entries }
    }

    /// Default table for land pixels
    ///
    /// Cloudy where `bright && (slope_1 || slope_2) && ((low_pressure_nn && pcd_nn)
    /// || (low_pressure_poly && !pcd_poly && delta_pressure) || (slope_1 && slope_2))`.
    ///
    /// Replace it through [`AuxDataBuilder::decision_table`](crate::auxdata::AuxDataBuilder::decision_table)
    /// when a product-specific table is available.
    pub fn land() -> Self {
        Self::from_bits(&LAND_TABLE)
    }

    /// Default table for water pixels
    ///
    /// Cloudy where `bright && ((low_pressure_nn && pcd_nn)
    /// || (low_pressure_poly && !pcd_poly) || (slope_1 && slope_2))`.
    ///
    /// Replace it through [`AuxDataBuilder::decision_table`](crate::auxdata::AuxDataBuilder::decision_table)
    /// when a product-specific table is available.
    pub fn water() -> Self {
        Self::from_bits(&WATER_TABLE)
    }

    pub fn standard(surface: SurfaceType) -> Self {
        match surface {
            SurfaceType::Land => Self::land(),
            SurfaceType::Water => Self::water(),
        }
    }

    fn from_bits(bits: &[u8; 256]) -> Self {
        let mut entries = [false; 256];
        for (entry, &bit) in entries.iter_mut().zip(bits.iter()) {
            *entry = bit != 0;
        }
        Self { entries }
    }

    pub fn lookup(&self, index: u8) -> bool {
        self.entries[index as usize]
    }

    pub fn is_cloudy(&self, tests: &CloudTests) -> bool {
        self.lookup(tests.index())
    }

    /// Number of index patterns classified as cloud
    pub fn cloud_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e).count()
    }
}

// Bit order of the index: bright, low_p_nn, low_p_poly, delta_p, pcd_nn,
// pcd_poly, slope_1, slope_2 (bit 0 first).
const LAND_TABLE: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x00
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x10
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x20
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x30
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, // 0x40
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, // 0x50
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x60
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, // 0x70
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, // 0x80
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, // 0x90
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0xa0
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, // 0xb0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xc0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xd0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xe0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xf0
];

const WATER_TABLE: [u8; 256] = [
    0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, // 0x00
    0, 0, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, // 0x10
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x20
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, // 0x30
    0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, // 0x40
    0, 0, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, // 0x50
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x60
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, // 0x70
    0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 1, 0, 1, // 0x80
    0, 0, 0, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 1, 0, 1, // 0x90
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0xa0
    0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, // 0xb0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xc0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xd0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xe0
    0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, // 0xf0
];
