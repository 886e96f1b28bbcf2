//! Node tensors: one level of a ragged, parent-indexed array.

mod parent_index;


pub use parent_index::{counts_per_parent, positions_in_parent, row_splits, validate_parent_index};

pub(crate) use parent_index::clamp_slot;

use crate::{
    calculate::CalculateError,
    value::{PrimitiveType, Values},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// NodeKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum NodeKind {
    #[display("child")]
    Child,
    #[display("leaf")]
    Leaf,
    #[display("root")]
    Root,
}

///
/// RootNodeTensor
///
/// The record level. `input_row_index[i]` is the row of the original input
/// batch that root row `i` came from.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RootNodeTensor {
    pub size: usize,
    pub input_row_index: Vec<i64>,
}

impl RootNodeTensor {
    /// A root whose rows map to themselves.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            input_row_index: (0..size as i64).collect(),
        }
    }

    /// A root with an explicit row mapping; the size is its length.
    #[must_use]
    pub fn with_input_rows(input_row_index: Vec<i64>) -> Self {
        Self {
            size: input_row_index.len(),
            input_row_index,
        }
    }
}

///
/// ChildNodeTensor
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChildNodeTensor {
    pub parent_index: Vec<i64>,
    pub is_repeated: bool,
}

///
/// LeafNodeTensor
///
/// `parent_index` and `values` have the same length.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LeafNodeTensor {
    pub parent_index: Vec<i64>,
    pub values: Values,
    pub is_repeated: bool,
}

///
/// NodeTensor
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[remain::sorted]
pub enum NodeTensor {
    Child(ChildNodeTensor),
    Leaf(LeafNodeTensor),
    Root(RootNodeTensor),
}

impl NodeTensor {
    #[must_use]
    pub fn root(size: usize) -> Self {
        Self::Root(RootNodeTensor::new(size))
    }

    #[must_use]
    pub const fn child(parent_index: Vec<i64>, is_repeated: bool) -> Self {
        Self::Child(ChildNodeTensor {
            parent_index,
            is_repeated,
        })
    }

    #[must_use]
    pub fn leaf(parent_index: Vec<i64>, values: impl Into<Values>, is_repeated: bool) -> Self {
        Self::Leaf(LeafNodeTensor {
            parent_index,
            values: values.into(),
            is_repeated,
        })
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Child(_) => NodeKind::Child,
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Root(_) => NodeKind::Root,
        }
    }

    /// Number of elements at this level.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Child(node) => node.parent_index.len(),
            Self::Leaf(node) => node.parent_index.len(),
            Self::Root(node) => node.size,
        }
    }

    /// The root level counts as repeated.
    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        match self {
            Self::Child(node) => node.is_repeated,
            Self::Leaf(node) => node.is_repeated,
            Self::Root(_) => true,
        }
    }

    #[must_use]
    pub fn parent_index(&self) -> Option<&[i64]> {
        match self {
            Self::Child(node) => Some(&node.parent_index),
            Self::Leaf(node) => Some(&node.parent_index),
            Self::Root(_) => None,
        }
    }

    #[must_use]
    pub const fn values(&self) -> Option<&Values> {
        match self {
            Self::Leaf(node) => Some(&node.values),
            _ => None,
        }
    }

    #[must_use]
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        self.values().map(Values::primitive_type)
    }

    #[must_use]
    pub const fn as_root(&self) -> Option<&RootNodeTensor> {
        match self {
            Self::Root(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_leaf(&self) -> Option<&LeafNodeTensor> {
        match self {
            Self::Leaf(node) => Some(node),
            _ => None,
        }
    }

    /// Parent index of a child or leaf; `UnexpectedNodeKind` for a root.
    pub fn parent_index_or_error(&self, context: &str) -> Result<&[i64], CalculateError> {
        self.parent_index()
            .ok_or_else(|| CalculateError::kind(context, NodeKind::Child, NodeKind::Root))
    }

    /// The leaf payload; `UnexpectedNodeKind` otherwise.
    pub fn leaf_or_error(&self, context: &str) -> Result<&LeafNodeTensor, CalculateError> {
        self.as_leaf()
            .ok_or_else(|| CalculateError::kind(context, NodeKind::Leaf, self.kind()))
    }

    /// Check the invariants of this level against the size of its parent.
    ///
    /// Roots need `input_row_index` of length `size`; other levels need an
    /// in-range, non-decreasing parent index (strictly increasing when not
    /// repeated) and leaves need one value per index.
    pub fn validate(&self, parent_size: Option<usize>, context: &str) -> Result<(), CalculateError> {
        match self {
            Self::Root(node) => {
                if node.input_row_index.len() != node.size {
                    return Err(CalculateError::shape(
                        context,
                        format!(
                            "root has size {} but {} input rows",
                            node.size,
                            node.input_row_index.len()
                        ),
                    ));
                }
            }
            Self::Child(node) => {
                validate_parent_index(&node.parent_index, parent_size, node.is_repeated, context)?;
            }
            Self::Leaf(node) => {
                if node.parent_index.len() != node.values.len() {
                    return Err(CalculateError::shape(
                        context,
                        format!(
                            "leaf has {} parent indices but {} values",
                            node.parent_index.len(),
                            node.values.len()
                        ),
                    ));
                }
                validate_parent_index(&node.parent_index, parent_size, node.is_repeated, context)?;
            }
        }

        Ok(())
    }
}

impl From<RootNodeTensor> for NodeTensor {
    fn from(node: RootNodeTensor) -> Self {
        Self::Root(node)
    }
}

impl From<ChildNodeTensor> for NodeTensor {
    fn from(node: ChildNodeTensor) -> Self {
        Self::Child(node)
    }
}

impl From<LeafNodeTensor> for NodeTensor {
    fn from(node: LeafNodeTensor) -> Self {
        Self::Leaf(node)
    }
}
