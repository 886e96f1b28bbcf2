use derive_more::Display;
use prensor_schema::types::FeatureType;
use serde::{Deserialize, Serialize};

///
/// PrimitiveType
///
/// Closed set of element types a leaf can hold.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[remain::sorted]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    #[display("bool")]
    Bool,
    #[display("bytes")]
    Bytes,
    #[display("double")]
    Double,
    #[display("float")]
    Float,
    #[display("int32")]
    Int32,
    #[display("int64")]
    Int64,
    #[display("string")]
    String,
    #[display("uint32")]
    Uint32,
    #[display("uint64")]
    Uint64,
}

impl PrimitiveType {
    /// Coarse schema type given to typed fields that carry no schema feature.
    #[must_use]
    pub const fn feature_type(self) -> FeatureType {
        match self {
            Self::Bool | Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64 => FeatureType::Int,
            Self::Double | Self::Float => FeatureType::Float,
            Self::Bytes | Self::String => FeatureType::Bytes,
        }
    }
}

///
/// Values
///
/// A column of primitive values, one variant per [`PrimitiveType`].
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[remain::sorted]
#[serde(rename_all = "lowercase")]
pub enum Values {
    Bool(Vec<bool>),
    Bytes(Vec<Vec<u8>>),
    Double(Vec<f64>),
    Float(Vec<f32>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    String(Vec<String>),
    Uint32(Vec<u32>),
    Uint64(Vec<u64>),
}

/// Apply the same expression to the column of every variant, rebuilding the
/// same variant from the result.
macro_rules! map_column {
    ($values:expr, $col:ident => $body:expr) => {
        match $values {
            Values::Bool($col) => Values::Bool($body),
            Values::Bytes($col) => Values::Bytes($body),
            Values::Double($col) => Values::Double($body),
            Values::Float($col) => Values::Float($body),
            Values::Int32($col) => Values::Int32($body),
            Values::Int64($col) => Values::Int64($body),
            Values::String($col) => Values::String($body),
            Values::Uint32($col) => Values::Uint32($body),
            Values::Uint64($col) => Values::Uint64($body),
        }
    };
}

/// Evaluate an expression against the column of whichever variant is held.
macro_rules! with_column {
    ($values:expr, $col:ident => $body:expr) => {
        match $values {
            Values::Bool($col) => $body,
            Values::Bytes($col) => $body,
            Values::Double($col) => $body,
            Values::Float($col) => $body,
            Values::Int32($col) => $body,
            Values::Int64($col) => $body,
            Values::String($col) => $body,
            Values::Uint32($col) => $body,
            Values::Uint64($col) => $body,
        }
    };
}

impl Values {
    #[must_use]
    pub const fn primitive_type(&self) -> PrimitiveType {
        match self {
            Self::Bool(_) => PrimitiveType::Bool,
            Self::Bytes(_) => PrimitiveType::Bytes,
            Self::Double(_) => PrimitiveType::Double,
            Self::Float(_) => PrimitiveType::Float,
            Self::Int32(_) => PrimitiveType::Int32,
            Self::Int64(_) => PrimitiveType::Int64,
            Self::String(_) => PrimitiveType::String,
            Self::Uint32(_) => PrimitiveType::Uint32,
            Self::Uint64(_) => PrimitiveType::Uint64,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        with_column!(self, col => col.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select elements by position. Out-of-range positions are skipped.
    #[must_use]
    pub fn gather(&self, positions: &[usize]) -> Self {
        map_column!(self, col => positions
            .iter()
            .filter_map(|&i| col.get(i).cloned())
            .collect())
    }

    /// Select elements by `i64` position, skipping negative and out-of-range
    /// positions.
    #[must_use]
    pub fn gather_i64(&self, positions: &[i64]) -> Self {
        let positions: Vec<usize> = positions
            .iter()
            .filter_map(|&i| usize::try_from(i).ok())
            .collect();

        self.gather(&positions)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Self::Int64(col) => Some(col),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(col) => Some(col),
            _ => None,
        }
    }
}

macro_rules! impl_from_column {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<Vec<$ty>> for Values {
                fn from(col: Vec<$ty>) -> Self {
                    Self::$variant(col)
                }
            }
        )*
    }
}

impl_from_column! {
    bool => Bool,
    Vec<u8> => Bytes,
    f64 => Double,
    f32 => Float,
    i32 => Int32,
    i64 => Int64,
    String => String,
    u32 => Uint32,
    u64 => Uint64,
}

impl From<Vec<&str>> for Values {
    fn from(col: Vec<&str>) -> Self {
        Self::String(col.into_iter().map(str::to_string).collect())
    }
}

///
/// TESTS
///
