use crate::{
    node::{DomainInfo, StructDomain},
    prelude::*,
    types::{FeatureType, LifecycleStage},
};

///
/// Feature
///
/// Structural metadata for one field: physical type, count and presence
/// bounds, value domain, lifecycle stage, and (for internal fields) the
/// nested feature list.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<FeatureType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_stage: Option<LifecycleStage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<FeaturePresence>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_count: Option<ValueCount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_info: Option<DomainInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_constraints: Option<DistributionConstraints>,
}

impl Feature {
    /// Create an otherwise empty feature with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Nested features, empty unless this feature carries a struct domain.
    #[must_use]
    pub fn struct_features(&self) -> &[Self] {
        match &self.domain_info {
            Some(DomainInfo::StructDomain(domain)) => &domain.features,
            _ => &[],
        }
    }

    /// Replace the domain with a struct domain holding `features`.
    pub fn set_struct_features(&mut self, features: Vec<Self>) {
        self.domain_info = Some(DomainInfo::StructDomain(StructDomain { features }));
    }

    /// Remove the name and nested features.
    ///
    /// Both are re-derived from tree structure when the feature is attached
    /// to an expression.
    pub fn clean(&mut self) {
        self.name = None;
        if let Some(DomainInfo::StructDomain(domain)) = &mut self.domain_info {
            domain.features.clear();
        }
    }

    /// A copy of this feature with name and nested features removed.
    #[must_use]
    pub fn cleaned(&self) -> Self {
        let mut out = self.clone();
        out.clean();

        out
    }

    /// True when every parent has exactly the same, known number of values.
    ///
    /// Requires `presence.min_fraction == 1` and equal `value_count` bounds.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        let fully_present = self
            .presence
            .as_ref()
            .and_then(|presence| presence.min_fraction)
            .is_some_and(|fraction| (fraction - 1.0).abs() < f64::EPSILON);

        let fixed_count = self
            .value_count
            .as_ref()
            .is_some_and(|count| count.min.is_some() && count.min == count.max);

        fully_present && fixed_count
    }
}

///
/// ValueCount
///
/// Bounds on the number of values per parent, when present.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ValueCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

///
/// FeaturePresence
///

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FeaturePresence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fraction: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u64>,
}

///
/// DistributionConstraints
///

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DistributionConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_domain_mass: Option<f64>,
}
