pub mod fixtures;
pub mod mock;

use crate::path::{Path, Step};

/// Parse a name step, panicking on bad test input.
pub fn step(name: &str) -> Step {
    Step::name(name).expect("test step should be valid")
}

/// Parse a path, panicking on bad test input.
pub fn path(text: &str) -> Path {
    Path::parse(text).expect("test path should parse")
}
