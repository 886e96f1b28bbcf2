use crate::{node::Feature, prelude::*};

///
/// DomainInfo
///
/// Value-domain constraint of a feature. At most one applies.
///
/// `Named` references a global domain declared on the enclosing [`Schema`];
/// normalization replaces it with the inlined domain.
///
/// [`Schema`]: crate::node::Schema
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainInfo {
    Named(String),
    StringDomain(StringDomain),
    IntDomain(IntDomain),
    FloatDomain(FloatDomain),
    BoolDomain(BoolDomain),
    StructDomain(StructDomain),
}

impl DomainInfo {
    /// Name of the referenced global domain, if this is a reference.
    #[must_use]
    pub fn referenced_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

///
/// StringDomain
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct StringDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

///
/// IntDomain
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IntDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,

    #[serde(default)]
    pub is_categorical: bool,
}

///
/// FloatDomain
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FloatDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f32>,
}

///
/// BoolDomain
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BoolDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_value: Option<String>,
}

///
/// StructDomain
///
/// Nested features of an internal feature.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct StructDomain {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
}
