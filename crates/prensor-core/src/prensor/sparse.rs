use crate::value::Values;
use serde::{Deserialize, Serialize};

///
/// SparseArray
///
/// Coordinate view of one leaf. The first coordinate is the row; each
/// repeated step adds the element's position within its parent. Optional
/// steps add no dimension.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SparseArray {
    pub indices: Vec<Vec<i64>>,
    pub values: Values,
    pub dense_shape: Vec<i64>,
}

impl SparseArray {
    #[must_use]
    pub const fn new(indices: Vec<Vec<i64>>, values: Values, dense_shape: Vec<i64>) -> Self {
        Self {
            indices,
            values,
            dense_shape,
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.dense_shape.len()
    }

    /// Size of the first dimension.
    #[must_use]
    pub fn nrows(&self) -> i64 {
        self.dense_shape.first().copied().unwrap_or(0)
    }
}
