//! Method-scoped route table.

use std::collections::HashMap;
use log::debug;

use crate::parser::Method;
use crate::router::error::Error;
use crate::router::pattern::{split_path, PathPattern};

struct Entry<T> {
    pattern: PathPattern,
    value: T,
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the matched route.
    pub value: &'a T,
    /// The pattern that matched.
    pub pattern: &'a PathPattern,
    /// Captured parameters in declaration order.
    pub params: Vec<(String, String)>,
}

/// Maps `(method, pattern)` pairs to values.
///
/// Lookup is an ordered scan: among the patterns registered for a method, the
/// first one registered that matches the path wins. Literal segments are not
/// ranked above parameter segments. Entries are bucketed by segment count,
/// which only skips patterns that could never match.
///
/// The table is built once and read-only afterwards, so shared lookups need no
/// locking.
pub struct Router<T> {
    routes: HashMap<(Method, usize), Vec<Entry<T>>>,
    len: usize,
}

impl<T> Router<T> {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            len: 0,
        }
    }

    /// Compile `pattern` and register `value` for it under `method`.
    ///
    /// Registering a pattern with the same shape as an existing one for the
    /// same method replaces that entry in place; the replaced pattern and
    /// value are returned. Last registration wins.
    pub fn register(&mut self, method: Method, pattern: &str, value: T) -> Result<Option<(PathPattern, T)>, Error> {
        let pattern = PathPattern::compile(pattern)?;
        let bucket = self.routes.entry((method, pattern.segment_count())).or_default();

        if let Some(existing) = bucket.iter_mut().find(|entry| entry.pattern.same_shape(&pattern)) {
            debug!("Replacing route {method} {old} with {new}", old = existing.pattern, new = pattern);
            let old_pattern = std::mem::replace(&mut existing.pattern, pattern);
            let old_value = std::mem::replace(&mut existing.value, value);
            return Ok(Some((old_pattern, old_value)));
        }

        bucket.push(Entry { pattern, value });
        self.len += 1;
        Ok(None)
    }

    /// Find the route for a request method and path.
    ///
    /// `None` means nothing matched, which is distinct from a match that
    /// captured no parameters.
    pub fn find(&self, method: Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let bucket = self.routes.get(&(method, split_path(path).len()))?;
        bucket.iter().find_map(|entry| {
            entry.pattern.matches(path).map(|params| RouteMatch {
                value: &entry.value,
                pattern: &entry.pattern,
                params,
            })
        })
    }

    /// Number of effective routes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All registered routes, in no particular order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &PathPattern)> {
        self.routes
            .iter()
            .flat_map(|((method, _), entries)| entries.iter().map(move |entry| (*method, &entry.pattern)))
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
