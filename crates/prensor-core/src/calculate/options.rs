use serde::{Deserialize, Serialize};

///
/// CalculateOptions
///
/// Knobs for one evaluation. Loadable from host configuration; missing keys
/// take their [`Default`] values.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct CalculateOptions {
    /// Check parent-index and shape invariants of every produced level.
    pub validate_structural_invariants: bool,

    /// Skip every optional check. Malformed input then yields unspecified
    /// (but non-panicking) results.
    pub minimal_checks: bool,
}

impl CalculateOptions {
    /// All optional checks off.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            validate_structural_invariants: false,
            minimal_checks: true,
        }
    }

    #[must_use]
    pub const fn checks_enabled(&self) -> bool {
        self.validate_structural_invariants && !self.minimal_checks
    }
}

impl Default for CalculateOptions {
    fn default() -> Self {
        Self {
            validate_structural_invariants: true,
            minimal_checks: false,
        }
    }
}
