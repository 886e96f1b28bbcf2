use crate::prelude::*;
use derive_more::{Display, FromStr};

///
/// FeatureType
///
/// Coarse physical type of a feature as recorded in schema metadata.
/// `Struct` marks internal (non-leaf) features.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq, Serialize)]
#[remain::sorted]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    Bytes,
    Float,
    Int,
    Struct,
    TypeUnknown,
}

///
/// LifecycleStage
///
/// Maturity marker attached to a feature.
///
/// Stages are fused conservatively when a field is derived from several
/// inputs; see [`min_lifecycle_stage`].
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq, Serialize)]
#[remain::sorted]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStage {
    Alpha,
    Beta,
    DebugOnly,
    Deprecated,
    Planned,
    Production,
    UnknownStage,
}

impl LifecycleStage {
    /// Rank of an optional stage in the fusion order.
    ///
    /// `DEPRECATED < PLANNED < ALPHA < DEBUG_ONLY < unset < UNKNOWN < BETA < PRODUCTION`
    #[must_use]
    pub const fn rank(stage: Option<Self>) -> u8 {
        match stage {
            Some(Self::Deprecated) => 0,
            Some(Self::Planned) => 1,
            Some(Self::Alpha) => 2,
            Some(Self::DebugOnly) => 3,
            None => 4,
            Some(Self::UnknownStage) => 5,
            Some(Self::Beta) => 6,
            Some(Self::Production) => 7,
        }
    }
}

/// Return the least mature of two optional stages.
///
/// Ties keep `a`.
#[must_use]
pub const fn min_lifecycle_stage(
    a: Option<LifecycleStage>,
    b: Option<LifecycleStage>,
) -> Option<LifecycleStage> {
    if LifecycleStage::rank(b) < LifecycleStage::rank(a) {
        b
    } else {
        a
    }
}
