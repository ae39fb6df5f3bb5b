//! Path matcher contract and the per-request parameter bag.
//!
//! # Responsibilities
//! - Define the narrow registration/lookup interface the dispatcher consumes
//! - Hold parameters captured while resolving a path
//!
//! # Design Decisions
//! - Registration needs `&mut self`, lookup only `&self`: a matcher shared
//!   behind `Arc` is frozen
//! - Lookup writes captures into a caller-owned bag, one per request
//! - `register` hands back a displaced output so callers decide the
//!   duplicate-route policy

use std::collections::HashMap;
use std::str::FromStr;

use crate::routing::route::PathComponent;

/// Resolves segment sequences to registered outputs.
pub trait PathMatcher: Send + Sync + 'static {
    type Output;

    /// Bind `output` to `path`. Returns the output previously bound to an
    /// identical path, if any. Parameter names do not distinguish paths.
    fn register(&mut self, output: Self::Output, path: &[PathComponent]) -> Option<Self::Output>;

    /// Resolve `path`, writing captured values into `parameters`.
    ///
    /// Parameters are only written when a match is found.
    fn route(&self, path: &[&str], parameters: &mut Parameters) -> Option<&Self::Output>;
}

/// Values captured from the request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    values: HashMap<String, String>,
    catchall: Vec<String>,
}

impl Parameters {
    /// Raw captured value for a named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Captured value parsed into `T`; `None` if missing or unparsable.
    pub fn get_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Segments consumed by a trailing catch-all.
    pub fn catchall(&self) -> &[String] {
        &self.catchall
    }

    pub fn set_catchall(&mut self, segments: Vec<String>) {
        self.catchall = segments;
    }

    /// Number of named parameters. Catch-all segments are not counted
    /// unless the catch-all was named.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was captured, named or catch-all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.catchall.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
