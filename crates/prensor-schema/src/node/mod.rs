mod domain;
mod feature;
mod schema;


pub use domain::{BoolDomain, DomainInfo, FloatDomain, IntDomain, StringDomain, StructDomain};
pub use feature::{DistributionConstraints, Feature, FeaturePresence, ValueCount};
pub use schema::Schema;
