//! Compiled route patterns.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

use crate::router::error::Error;

/// One slash-delimited piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly this text, case-sensitively.
    Literal(String),
    /// Matches any segment and captures it under this name.
    Param(String),
}

/// A route pattern such as `/users/:id/posts`, compiled into segments.
///
/// The segment count is fixed: there are no wildcards, so a path matches only
/// when it has exactly as many segments as the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern string.
    ///
    /// The pattern must start with `/`. `/` alone is the root pattern with no
    /// segments; otherwise every segment must be non-empty, and `:name`
    /// segments must have a name that is unique within the pattern.
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        if pattern.is_empty() {
            return Err(Error::invalid(pattern, "pattern is empty"));
        }
        if !pattern.starts_with('/') {
            return Err(Error::invalid(pattern, "pattern must start with '/'"));
        }

        let mut seen = HashSet::new();
        let mut segments = Vec::new();
        for (index, raw) in split_path(pattern).into_iter().enumerate() {
            if raw.is_empty() {
                return Err(Error::invalid(pattern, format!("segment {index} is empty")));
            }
            match raw.strip_prefix(':') {
                Some("") => {
                    return Err(Error::invalid(pattern, format!("segment {index} has an empty parameter name")));
                }
                Some(name) => {
                    if !seen.insert(name) {
                        return Err(Error::invalid(pattern, format!("parameter :{name} is declared twice")));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether two patterns have the same literal/parameter shape at every
    /// segment. Parameter names are not compared.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Param(_), Segment::Param(_)) => true,
                _ => false,
            })
    }

    /// Match a request path (without query string).
    ///
    /// Returns the captured parameters in declaration order, with values
    /// percent-decoded, or `None` when the path does not match. A path with a
    /// different segment count is simply not a match.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut captured = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = percent_decode_str(part).decode_utf8_lossy().into_owned();
                    captured.push((name.clone(), value));
                }
            }
        }
        Some(captured)
    }
}

impl FromStr for PathPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split a path into its segments; `/` has none, `/a/` has `["a", ""]`.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split('/').collect()
    }
}
