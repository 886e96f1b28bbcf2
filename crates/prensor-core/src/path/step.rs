use crate::path::{PathError, parse};
use std::{cmp::Ordering, fmt};

///
/// Step
///
/// One edge in a path.
///
/// String-keyed steps (`Name`, `Extension`, `MapIndex`) compare by their
/// textual form; every `Anonymous` step sorts after every string-keyed step.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Step {
    /// A record field name, `[A-Za-z0-9_-]+`.
    Name(String),

    /// An extension or type cast, stored without the parentheses.
    Extension(String),

    /// A map lookup `field[key]`.
    MapIndex { field: String, key: String },

    /// A synthetic field created by a transform.
    Anonymous(u64),
}

impl Step {
    /// Build a `Name` step, validating its charset.
    pub fn name(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        if parse::is_simple_step(&name) {
            Ok(Self::Name(name))
        } else {
            Err(PathError::InvalidStep { step: name })
        }
    }

    /// Build an `Extension` step from a dotted name such as `foo.bar.Baz`.
    pub fn extension(qualified: impl Into<String>) -> Result<Self, PathError> {
        let qualified = qualified.into();
        if parse::is_extension_body(&qualified) {
            Ok(Self::Extension(qualified))
        } else {
            Err(PathError::InvalidStep {
                step: format!("({qualified})"),
            })
        }
    }

    /// Build a `MapIndex` step.
    pub fn map_index(field: impl Into<String>, key: impl Into<String>) -> Result<Self, PathError> {
        let field = field.into();
        let key = key.into();
        if parse::is_simple_step(&field) && !key.contains(']') {
            Ok(Self::MapIndex { field, key })
        } else {
            Err(PathError::InvalidStep {
                step: format!("{field}[{key}]"),
            })
        }
    }

    /// Classify one textual step (`foo`, `(a.b.C)`, `foo[bar]`).
    pub fn parse(text: &str) -> Result<Self, PathError> {
        match parse::match_step(text) {
            Some((step, consumed)) if consumed == text.len() => Ok(step),
            _ => Err(PathError::InvalidStep {
                step: text.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous(_))
    }

    #[must_use]
    pub const fn is_extension(&self) -> bool {
        matches!(self, Self::Extension(_))
    }

    /// The extension name without parentheses.
    #[must_use]
    pub fn raw_extension_name(&self) -> Option<&str> {
        match self {
            Self::Extension(name) => Some(name),
            _ => None,
        }
    }

    /// The `(field, key)` pair of a map-index step.
    #[must_use]
    pub fn map_index_parts(&self) -> Option<(&str, &str)> {
        match self {
            Self::MapIndex { field, key } => Some((field, key)),
            _ => None,
        }
    }

    /// Textual form of a string-keyed step; `None` for anonymous steps.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name.clone()),
            Self::Extension(name) => Some(format!("({name})")),
            Self::MapIndex { field, key } => Some(format!("{field}[{key}]")),
            Self::Anonymous(_) => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Extension(name) => write!(f, "({name})"),
            Self::MapIndex { field, key } => write!(f, "{field}[{key}]"),
            Self::Anonymous(id) => write!(f, "{id}"),
        }
    }
}

impl Ord for Step {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Anonymous(a), Self::Anonymous(b)) => a.cmp(b),
            (Self::Anonymous(_), _) => Ordering::Greater,
            (_, Self::Anonymous(_)) => Ordering::Less,
            (Self::Name(a), Self::Name(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for Step {
    fn from(id: u64) -> Self {
        Self::Anonymous(id)
    }
}

impl TryFrom<&str> for Step {
    type Error = PathError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}
