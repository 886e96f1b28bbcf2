use crate::{
    Error,
    node::{DomainInfo, Feature, FloatDomain, IntDomain, StringDomain},
    prelude::*,
};

///
/// Schema
///
/// Top-level feature list plus the global domains features may reference
/// by name.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub string_domains: Vec<StringDomain>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub int_domains: Vec<IntDomain>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub float_domains: Vec<FloatDomain>,
}

impl Schema {
    #[must_use]
    pub const fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            string_domains: Vec::new(),
            int_domains: Vec::new(),
            float_domains: Vec::new(),
        }
    }

    /// Look up a top-level feature by name.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|feature| feature.name.as_deref() == Some(name))
    }

    ///
    /// normalized
    ///
    /// Copy of this schema in which every feature (recursively) that
    /// references a global domain by name carries that domain inline.
    /// The inlined domain keeps its name.
    ///
    pub fn normalized(&self) -> Result<Self, Error> {
        let mut out = self.clone();
        for feature in &mut out.features {
            self.normalize_feature(feature)?;
        }

        Ok(out)
    }

    fn normalize_feature(&self, feature: &mut Feature) -> Result<(), Error> {
        match &mut feature.domain_info {
            Some(DomainInfo::StructDomain(domain)) => {
                for child in &mut domain.features {
                    self.normalize_feature(child)?;
                }
            }
            Some(DomainInfo::Named(name)) => {
                let inlined = self.resolve_domain(name)?;
                feature.domain_info = Some(inlined);
            }
            _ => {}
        }

        Ok(())
    }

    // String domains win over int domains, which win over float domains.
    fn resolve_domain(&self, name: &str) -> Result<DomainInfo, Error> {
        let named = |candidate: &Option<String>| candidate.as_deref() == Some(name);

        if let Some(domain) = self.string_domains.iter().find(|d| named(&d.name)) {
            return Ok(DomainInfo::StringDomain(domain.clone()));
        }
        if let Some(domain) = self.int_domains.iter().find(|d| named(&d.name)) {
            return Ok(DomainInfo::IntDomain(domain.clone()));
        }
        if let Some(domain) = self.float_domains.iter().find(|d| named(&d.name)) {
            return Ok(DomainInfo::FloatDomain(domain.clone()));
        }

        Err(Error::UnknownDomain {
            domain: name.to_string(),
        })
    }
}
