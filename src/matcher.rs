//! Segment-based path matching.
//!
//! Patterns and paths are split on every `/` with nothing collapsed, so
//! leading, trailing and doubled slashes become empty segments that must
//! match literally. `/a` and `/a/` are different paths.
//!
//! | Segment | Matches |
//! |---|---|
//! | `users` | exactly `users` |
//! | `{id}` | any one segment, captured verbatim as `id` |
//! | `{*rest}` | everything that is left, rejoined with `/` (last segment only) |

use std::collections::HashMap;

use crate::error::Error;

/// Parameters captured by a successful match.
pub type PathParams = HashMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard(String),
}

impl Segment {
    fn classify(raw: &str) -> Self {
        let inner = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}'));
        match inner {
            Some(name) if name.len() > 1 && name.starts_with('*') => {
                Self::Wildcard(name[1..].to_owned())
            }
            Some(name) if !name.is_empty() && !name.starts_with('*') => {
                Self::Param(name.to_owned())
            }
            _ => Self::Literal(raw.to_owned()),
        }
    }
}

/// A route pattern, parsed once at registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses and validates `raw`. A wildcard anywhere but the last segment
    /// is rejected, as is a bare `{*}`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let pattern = Self::lenient(raw);
        let last = pattern.segments.len().saturating_sub(1);
        for (i, segment) in pattern.segments.iter().enumerate() {
            if matches!(segment, Segment::Wildcard(_)) && i != last {
                return Err(invalid(raw, "wildcard must be the final segment"));
            }
        }
        if raw.split('/').any(|s| s == "{*}") {
            return Err(invalid(raw, "wildcard needs a name"));
        }
        Ok(pattern)
    }

    fn lenient(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            segments: raw.split('/').map(Segment::classify).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches `path`, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').collect();
        let mut params = PathParams::new();

        for (i, segment) in self.segments.iter().enumerate() {
            if let Segment::Wildcard(name) = segment {
                let rest = parts.get(i..).map(|r| r.join("/")).unwrap_or_default();
                params.insert(name.clone(), rest);
                return Some(params);
            }
            let part = *parts.get(i)?;
            match segment {
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_owned());
                }
                Segment::Literal(lit) if lit == part => {}
                _ => return None,
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

fn invalid(pattern: &str, reason: &'static str) -> Error {
    Error::InvalidPattern { pattern: pattern.to_owned(), reason }
}

/// One-shot match of `pattern` against `path` without validating the pattern.
/// Segments after a wildcard are never reached.
pub fn match_path(pattern: &str, path: &str) -> Option<PathParams> {
    Pattern::lenient(pattern).matches(path)
}
