//! Paths address nodes of a prensor (or expression) tree relative to a root.
//!
//! A path is an immutable sequence of [`Step`]s. Paths are totally ordered:
//! step by step, with a strict prefix sorting before its extensions.

mod anonymous;
mod parse;
mod step;


pub use anonymous::AnonymousIdAllocator;
pub use step::Step;

use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// PathError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PathError {
    #[error("malformed path: '{path}'")]
    MalformedPath { path: String },

    #[error("tried to find the parent of the root path")]
    RootHasNoParent,

    #[error("invalid path step: '{step}'")]
    InvalidStep { step: String },

    #[error("path '{path}' contains anonymous steps and has no textual form")]
    AnonymousStep { path: String },
}

///
/// Path
///

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// The empty path, addressing the root.
    #[must_use]
    pub const fn root() -> Self {
        Self { steps: Vec::new() }
    }

    #[must_use]
    pub const fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Parse the dotted textual form, e.g. `doc.(ext.Foo).tags[en]`.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        parse::parse_steps(text).map(Self::new)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn first(&self) -> Option<&Step> {
        self.steps.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn parent(&self) -> Result<Self, PathError> {
        match self.steps.split_last() {
            Some((_, rest)) => Ok(Self::new(rest.to_vec())),
            None => Err(PathError::RootHasNoParent),
        }
    }

    #[must_use]
    pub fn child(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);

        Self::new(steps)
    }

    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(other.steps.iter().cloned());

        Self::new(steps)
    }

    /// The first `end` steps (all of them if `end` exceeds the length).
    #[must_use]
    pub fn prefix(&self, end: usize) -> Self {
        Self::new(self.steps[..end.min(self.len())].to_vec())
    }

    /// Every step from `start` on (empty if `start` exceeds the length).
    #[must_use]
    pub fn suffix(&self, start: usize) -> Self {
        Self::new(self.steps[start.min(self.len())..].to_vec())
    }

    /// The longest shared prefix.
    #[must_use]
    pub fn least_common_ancestor(&self, other: &Self) -> Self {
        let shared = self
            .steps
            .iter()
            .zip(&other.steps)
            .take_while(|(a, b)| a == b)
            .count();

        self.prefix(shared)
    }

    /// True if `self` is a prefix of `other`; every path is its own ancestor.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.steps.starts_with(&self.steps)
    }

    /// The textual steps, failing on anonymous steps.
    pub fn to_string_steps(&self) -> Result<Vec<String>, PathError> {
        self.steps
            .iter()
            .map(|step| {
                step.text().ok_or_else(|| PathError::AnonymousStep {
                    path: self.to_string(),
                })
            })
            .collect()
    }
}

impl fmt::Display for Path {
    // Not guaranteed to round-trip through `parse` when names contain `.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }

        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl TryFrom<&str> for Path {
    type Error = PathError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::parse(text)
    }
}

impl From<Step> for Path {
    fn from(step: Step) -> Self {
        Self::new(vec![step])
    }
}

impl From<Vec<Step>> for Path {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
