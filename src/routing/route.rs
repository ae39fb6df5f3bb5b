//! Route descriptors and the route registry.
//!
//! # Responsibilities
//! - Parse path templates into typed components
//! - Describe a route: method, path template, handler
//! - Collect routes in registration order before the router is built
//!
//! # Design Decisions
//! - Routes are immutable and shared as `Arc<Route>` for the process lifetime
//! - Template syntax: `:name` parameter, `*` single-segment wildcard,
//!   `**` / `**name` trailing catch-all
//! - Empty segments never become components when parsing a template

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::http::Method;

use crate::responder::{BoxResponder, Responder};

/// One component of a route's path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Literal segment that must match (modulo configured case folding).
    Constant(String),
    /// Named single-segment capture, written `:name`.
    Parameter(String),
    /// Anonymous single-segment match, written `*`.
    Wildcard,
    /// One or more trailing segments, written `**` or `**name`.
    CatchAll(Option<String>),
}

impl PathComponent {
    /// Whether this is an empty constant, which registration discards.
    pub fn is_empty_constant(&self) -> bool {
        matches!(self, PathComponent::Constant(s) if s.is_empty())
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Constant(s) => write!(f, "{}", s),
            PathComponent::Parameter(name) => write!(f, ":{}", name),
            PathComponent::Wildcard => write!(f, "*"),
            PathComponent::CatchAll(None) => write!(f, "**"),
            PathComponent::CatchAll(Some(name)) => write!(f, "**{}", name),
        }
    }
}

impl FromStr for PathComponent {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "*" => PathComponent::Wildcard,
            "**" => PathComponent::CatchAll(None),
            _ if s.starts_with("**") => PathComponent::CatchAll(Some(s[2..].to_string())),
            _ if s.starts_with(':') && s.len() > 1 => PathComponent::Parameter(s[1..].to_string()),
            _ => PathComponent::Constant(s.to_string()),
        })
    }
}

/// Parse a slash-separated template, skipping empty segments.
pub fn parse_path(template: &str) -> Vec<PathComponent> {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse() {
            Ok(component) => component,
            Err(never) => match never {},
        })
        .collect()
}

/// Render components as `/a/:b/**`, omitting empty constants.
pub fn render_path(components: &[PathComponent]) -> String {
    let mut out = String::from("/");
    let mut first = true;
    for component in components.iter().filter(|c| !c.is_empty_constant()) {
        if !first {
            out.push('/');
        }
        out.push_str(&component.to_string());
        first = false;
    }
    out
}

/// A registered (method, path template, handler) triple.
pub struct Route {
    method: Method,
    path: Vec<PathComponent>,
    responder: BoxResponder,
    description: Option<String>,
}

impl Route {
    pub fn new(method: Method, path: Vec<PathComponent>, responder: impl Responder) -> Self {
        Self {
            method,
            path,
            responder: Arc::new(responder),
            description: None,
        }
    }

    /// Attach a human-readable description (shown in logs and route listings).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path components exactly as registered.
    pub fn path(&self) -> &[PathComponent] {
        &self.path
    }

    /// Literal template string such as `/users/:id`.
    ///
    /// Never contains runtime values, so it is safe as a metrics label.
    pub fn template(&self) -> String {
        render_path(&self.path)
    }

    pub fn responder(&self) -> &BoxResponder {
        &self.responder
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn placeholder(method: Method, template: &str) -> Self {
        use axum::response::IntoResponse;

        let ok = crate::responder::responder_fn(|_req| async {
            Ok(axum::http::StatusCode::OK.into_response())
        });
        Self::new(method, parse_path(template), ok)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.template())
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template())
    }
}

/// Ordered collection of routes assembled at startup.
#[derive(Debug, Default)]
pub struct Routes {
    all: Vec<Arc<Route>>,
    /// Compare constant segments case-insensitively.
    pub case_insensitive: bool,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route; order is preserved for registration.
    pub fn add(&mut self, route: Route) -> &mut Self {
        tracing::debug!(route = %route, "Route added");
        self.all.push(Arc::new(route));
        self
    }

    /// Register `responder` for `method` at the given template.
    pub fn on(&mut self, method: Method, path: &str, responder: impl Responder) -> &mut Self {
        self.add(Route::new(method, parse_path(path), responder))
    }

    pub fn get(&mut self, path: &str, responder: impl Responder) -> &mut Self {
        self.on(Method::GET, path, responder)
    }

    pub fn post(&mut self, path: &str, responder: impl Responder) -> &mut Self {
        self.on(Method::POST, path, responder)
    }

    pub fn put(&mut self, path: &str, responder: impl Responder) -> &mut Self {
        self.on(Method::PUT, path, responder)
    }

    pub fn patch(&mut self, path: &str, responder: impl Responder) -> &mut Self {
        self.on(Method::PATCH, path, responder)
    }

    pub fn delete(&mut self, path: &str, responder: impl Responder) -> &mut Self {
        self.on(Method::DELETE, path, responder)
    }

    /// All routes in registration order.
    pub fn all(&self) -> &[Arc<Route>] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
