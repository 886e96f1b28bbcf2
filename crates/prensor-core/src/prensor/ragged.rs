use crate::{node::row_splits, value::Values};
use serde::{Deserialize, Serialize};

///
/// RaggedArray
///
/// A consolidated view of one leaf: `row_splits[k]` partitions the rows of
/// dimension `k + 1` among the rows of dimension `k`, and the innermost
/// splits partition `values`. Every step of the source path, repeated or
/// not, contributes one ragged dimension.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RaggedArray {
    row_splits: Vec<Vec<i64>>,
    values: Values,
}

impl RaggedArray {
    #[must_use]
    pub const fn new(row_splits: Vec<Vec<i64>>, values: Values) -> Self {
        Self { row_splits, values }
    }

    /// A single ragged dimension from the row id of every value.
    #[must_use]
    pub fn from_value_rowids(value_rowids: &[i64], nrows: usize, values: Values) -> Self {
        Self::new(vec![row_splits(value_rowids, nrows)], values)
    }

    /// Number of outermost rows.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.row_splits
            .first()
            .map_or(self.values.len(), |splits| splits.len().saturating_sub(1))
    }

    #[must_use]
    pub fn ragged_rank(&self) -> usize {
        self.row_splits.len()
    }

    #[must_use]
    pub fn row_splits(&self) -> &[Vec<i64>] {
        &self.row_splits
    }

    #[must_use]
    pub const fn values(&self) -> &Values {
        &self.values
    }

    /// The innermost row id of every value.
    #[must_use]
    pub fn value_rowids(&self) -> Vec<i64> {
        let Some(splits) = self.row_splits.last() else {
            return (0..self.values.len() as i64).collect();
        };

        let mut rowids = Vec::with_capacity(self.values.len());
        for (row, pair) in splits.windows(2).enumerate() {
            let run = (pair[1] - pair[0]).max(0);
            rowids.extend(std::iter::repeat_n(row as i64, run as usize));
        }

        rowids
    }

    /// Lengths of the rows of dimension `level + 1`.
    #[must_use]
    pub fn row_lengths(&self, level: usize) -> Option<Vec<i64>> {
        self.row_splits
            .get(level)
            .map(|splits| splits.windows(2).map(|pair| pair[1] - pair[0]).collect())
    }
}
