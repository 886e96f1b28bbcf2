//! Textual path syntax.
//!
//! ```text
//! simple    := [A-Za-z0-9_-]+
//! extension := "(" segment ("." segment)* ")"      segment := [A-Za-z0-9_/-]+
//! map_index := simple "[" [^\]]* "]"
//! step      := extension | simple | map_index
//! path      := (step ("." step)*)?
//! ```
//!
//! Steps are separated by `.` outside of the bracket and parenthesis groups.

use crate::path::{PathError, Step};

const fn is_simple_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

const fn is_segment_char(c: char) -> bool {
    is_simple_char(c) || c == '/'
}

pub(crate) fn is_simple_step(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_simple_char)
}

pub(crate) fn is_extension_body(text: &str) -> bool {
    !text.is_empty()
        && text
            .split('.')
            .all(|segment| !segment.is_empty() && segment.chars().all(is_segment_char))
}

// A step must be followed by a separator or the end of input.
fn at_boundary(text: &str, end: usize) -> bool {
    text[end..].is_empty() || text[end..].starts_with('.')
}

fn simple_run_len(text: &str) -> usize {
    text.find(|c: char| !is_simple_char(c)).unwrap_or(text.len())
}

fn match_extension(text: &str) -> Option<(Step, usize)> {
    let body_and_rest = text.strip_prefix('(')?;
    let close = body_and_rest.find(')')?;
    let body = &body_and_rest[..close];
    let end = close + 2;

    (is_extension_body(body) && at_boundary(text, end))
        .then(|| (Step::Extension(body.to_string()), end))
}

fn match_simple(text: &str) -> Option<(Step, usize)> {
    let end = simple_run_len(text);

    (end > 0 && at_boundary(text, end)).then(|| (Step::Name(text[..end].to_string()), end))
}

fn match_map_index(text: &str) -> Option<(Step, usize)> {
    let field_len = simple_run_len(text);
    if field_len == 0 {
        return None;
    }

    let after_field = text[field_len..].strip_prefix('[')?;
    let close = after_field.find(']')?;
    let end = field_len + 1 + close + 1;

    at_boundary(text, end).then(|| {
        (
            Step::MapIndex {
                field: text[..field_len].to_string(),
                key: after_field[..close].to_string(),
            },
            end,
        )
    })
}

/// Match one step at the start of `text`, returning the step and the number
/// of bytes it spans (the trailing separator is not included).
pub(crate) fn match_step(text: &str) -> Option<(Step, usize)> {
    match_extension(text)
        .or_else(|| match_simple(text))
        .or_else(|| match_map_index(text))
}

/// Split a textual path into steps.
pub(crate) fn parse_steps(text: &str) -> Result<Vec<Step>, PathError> {
    let malformed = || PathError::MalformedPath {
        path: text.to_string(),
    };

    if text.ends_with('.') {
        return Err(malformed());
    }

    let mut steps = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (step, consumed) = match_step(rest).ok_or_else(malformed)?;
        steps.push(step);
        rest = &rest[consumed..];
        rest = rest.strip_prefix('.').unwrap_or(rest);
    }

    Ok(steps)
}
