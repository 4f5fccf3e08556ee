//! N-dimensional multilinear interpolation over tabulated axes
//!
//! A query value is first located on each axis as a [`FractIndex`]; the
//! table is then blended over the `2^N` corners of the enclosing cell.

use ndarray::{ArrayD, IxDyn};

use crate::types::{MerisError, MerisResult};

/// Highest table rank supported by [`interpolate`]
pub const MAX_LUT_RANK: usize = 8;

/// Position of a value within an axis: lower cell index plus fraction towards the next cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FractIndex {
    pub index: usize,
    pub fraction: f64,
}

impl FractIndex {
    pub fn new(index: usize, fraction: f64) -> Self {
        Self { index, fraction }
    }

    /// Exact position on a cell (fraction 0)
    pub fn exact(index: usize) -> Self {
        Self::new(index, 0.0)
    }

    /// Nearest cell: rounds up when the fraction exceeds one half
    pub fn nearest(&self) -> usize {
        if self.fraction > 0.5 {
            self.index + 1
        } else {
            self.index
        }
    }
}

/// Axis search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    Binary,
    Linear,
}

/// Locate `x` on a monotonic axis using binary search
pub fn interp_coord(x: f64, axis: &[f64]) -> FractIndex {
    interp_coord_with(x, axis, SearchStrategy::Binary)
}

/// Locate `x` on a monotonic (ascending or descending) axis
///
/// Values outside the axis clamp to the edge cells with fraction 0 (below the
/// first breakpoint) or 1 (beyond the last). Single-point axes always give
/// index 0, fraction 0.
pub fn interp_coord_with(x: f64, axis: &[f64], strategy: SearchStrategy) -> FractIndex {
    let n = axis.len();
    if n < 2 {
        return FractIndex::default();
    }

    let ascending = axis[n - 1] >= axis[0];
    // `before(a, b)`: a comes strictly before b along the axis direction
    let before = |a: f64, b: f64| if ascending { a < b } else { a > b };

    // NaN falls through to the lower edge
    if !before(axis[0], x) {
        return FractIndex::exact(0);
    }
    if !before(x, axis[n - 1]) {
        return FractIndex::new(n - 2, 1.0);
    }

    // axis[i] <= x < axis[i + 1] in axis direction, 0 <= i <= n - 2
    let index = match strategy {
        SearchStrategy::Binary => axis.partition_point(|&v| !before(x, v)) - 1,
        SearchStrategy::Linear => {
            let mut i = 0;
            while i + 2 < n && !before(x, axis[i + 1]) {
                i += 1;
            }
            i
        }
    };

    let fraction = (x - axis[index]) / (axis[index + 1] - axis[index]);
    FractIndex::new(index, fraction)
}

/// Multilinear blend of `values` at the given per-axis positions
///
/// Every corner is weighted by the product of `1 - fraction` (lower cell) or
/// `fraction` (upper cell) over all axes. Axes of length one contribute
/// weight 1. `indices` must have one entry per array axis.
pub fn interpolate(values: &ArrayD<f64>, indices: &[FractIndex]) -> f64 {
    let rank = values.ndim();
    debug_assert_eq!(rank, indices.len());
    debug_assert!(rank <= MAX_LUT_RANK);
    let rank = rank.min(indices.len()).min(MAX_LUT_RANK);
    let shape = values.shape();

    let mut corner = [0usize; MAX_LUT_RANK];
    let mut sum = 0.0;
    'corners: for mask in 0..(1usize << rank) {
        let mut weight = 1.0;
        for axis in 0..rank {
            let fi = indices[axis];
            let degenerate = fi.index + 1 >= shape[axis];
            if mask & (1 << axis) != 0 {
                if degenerate {
                    continue 'corners;
                }
                corner[axis] = fi.index + 1;
                weight *= fi.fraction;
            } else {
                corner[axis] = fi.index.min(shape[axis] - 1);
                if !degenerate {
                    weight *= 1.0 - fi.fraction;
                }
            }
        }
        if weight != 0.0 {
            sum += weight * values[IxDyn(&corner[..rank])];
        }
    }
    sum
}

/// Tabulated function over N monotonic axes
#[derive(Debug, Clone)]
pub struct Lut {
    axes: Vec<Vec<f64>>,
    values: ArrayD<f64>,
}

impl Lut {
    /// Build a table, checking that the value array matches the axes
    pub fn new(axes: Vec<Vec<f64>>, values: ArrayD<f64>) -> MerisResult<Self> {
        if axes.is_empty() || axes.len() > MAX_LUT_RANK {
            return Err(MerisError::InvalidAuxData(format!(
                "LUT rank {} outside 1..={}",
                axes.len(),
                MAX_LUT_RANK
            )));
        }
        let expected: Vec<usize> = axes.iter().map(|axis| axis.len()).collect();
        if values.shape() != expected.as_slice() {
            return Err(MerisError::InvalidAuxData(format!(
                "LUT values have shape {:?}, axes require {:?}",
                values.shape(),
                expected
            )));
        }
        for (i, axis) in axes.iter().enumerate() {
            if axis.is_empty() {
                return Err(MerisError::InvalidAuxData(format!("LUT axis {} is empty", i)));
            }
            if !is_monotonic(axis) {
                return Err(MerisError::InvalidAuxData(format!(
                    "LUT axis {} is not monotonic",
                    i
                )));
            }
        }
        Ok(Self { axes, values })
    }

    /// Build a table from values in row-major order
    pub fn from_vec(axes: Vec<Vec<f64>>, values: Vec<f64>) -> MerisResult<Self> {
        let shape: Vec<usize> = axes.iter().map(|axis| axis.len()).collect();
        let values = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|e| {
            MerisError::InvalidAuxData(format!("LUT values do not fit axes {:?}: {}", shape, e))
        })?;
        Self::new(axes, values)
    }

    /// Table holding the same value everywhere
    pub fn constant(axes: Vec<Vec<f64>>, value: f64) -> MerisResult<Self> {
        let shape: Vec<usize> = axes.iter().map(|axis| axis.len()).collect();
        Self::new(axes, ArrayD::from_elem(IxDyn(&shape), value))
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    pub fn axis(&self, i: usize) -> &[f64] {
        &self.axes[i]
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Locate one coordinate per axis
    pub fn locate<const N: usize>(&self, coords: [f64; N]) -> [FractIndex; N] {
        debug_assert_eq!(N, self.rank());
        let mut indices = [FractIndex::default(); N];
        for (i, (index, &x)) in indices.iter_mut().zip(coords.iter()).enumerate() {
            *index = interp_coord(x, &self.axes[i]);
        }
        indices
    }

    pub fn interpolate(&self, indices: &[FractIndex]) -> f64 {
        interpolate(&self.values, indices)
    }

    /// Locate and interpolate in one step
    pub fn lookup<const N: usize>(&self, coords: [f64; N]) -> f64 {
        let indices = self.locate(coords);
        self.interpolate(&indices)
    }

    pub(crate) fn expect_rank(&self, name: &str, rank: usize) -> MerisResult<()> {
        if self.rank() != rank {
            return Err(MerisError::InvalidAuxData(format!(
                "LUT '{}' has rank {}, expected {}",
                name,
                self.rank(),
                rank
            )));
        }
        Ok(())
    }
}

fn is_monotonic(axis: &[f64]) -> bool {
    if axis.iter().any(|v| !v.is_finite()) {
        return false;
    }
    axis.windows(2).all(|w| w[0] <= w[1]) || axis.windows(2).all(|w| w[0] >= w[1])
}
