//! Method-scoped path routing.
//!
//! Patterns fall into three buckets per method:
//!
//! - **root**: `""` or `"/"`, a single slot per method
//! - **exact**: no `:name` or `*` tokens, stored in a hash map
//! - **parameterized**: everything else, kept in registration order and
//!   compiled into one anchored alternation regex per method
//!
//! A lookup tries exact paths first. Only when no method has an exact entry
//! for the path are the per-method regexes tried, and within a method the
//! earliest registered pattern that matches wins, because the regex engine
//! prefers the leftmost alternation branch.
//!
//! Every parameterized registration recompiles its method's regex. Routes
//! are registered at startup, so a single scan per request is worth that.
//!
//! # Example
//!
//! ```
//! use nocturne::http::request::Method;
//! use nocturne::router::Router;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/users/:id", "show_user").unwrap();
//!
//! let found = router.resolve(Method::GET, "/users/42").unwrap();
//! assert_eq!(*found.handler, "show_user");
//! assert_eq!(found.params["id"], "42");
//! ```

pub mod pattern;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use regex::Regex;

use crate::http::request::Method;
use pattern::{PatternKind, Template};

/// Parameter name to matched value, produced fresh for every match.
pub type Params = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("pattern `{pattern}` is invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{method} `{pattern}` is already registered")]
    Duplicate { method: Method, pattern: String },

    #[error("routes for {method} do not compile: {source}")]
    Compile {
        method: Method,
        #[source]
        source: regex::Error,
    },
}

/// A handler found for a path, with the parameters it captured.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub params: Params,
}

#[derive(Debug, Clone)]
struct DynamicRoute<H> {
    pattern: String,
    group: String,
    captures: Vec<(String, String)>,
    source: String,
    handler: H,
}

#[derive(Debug, Clone)]
struct MethodRoutes<H> {
    routes: Vec<DynamicRoute<H>>,
    matcher: Option<Regex>,
}

impl<H> Default for MethodRoutes<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            matcher: None,
        }
    }
}

impl<H> MethodRoutes<H> {
    fn recompile(&mut self, method: Method) -> Result<(), RouteError> {
        let branches: Vec<&str> = self.routes.iter().map(|r| r.source.as_str()).collect();
        let source = format!("^(?:{})$", branches.join("|"));
        let regex = Regex::new(&source).map_err(|source| RouteError::Compile { method, source })?;
        self.matcher = Some(regex);
        Ok(())
    }

    fn find(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        let caps = self.matcher.as_ref()?.captures(path)?;
        let route = self
            .routes
            .iter()
            .find(|route| caps.name(&route.group).is_some())?;

        let params = route
            .captures
            .iter()
            .filter_map(|(capture, name)| {
                caps.name(capture)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();

        Some(RouteMatch {
            handler: &route.handler,
            params,
        })
    }
}

/// Route table for one application or gear.
#[derive(Debug, Clone)]
pub struct Router<H> {
    prefix: String,
    roots: HashMap<Method, H>,
    exact: HashMap<Method, HashMap<String, H>>,
    dynamic: HashMap<Method, MethodRoutes<H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table whose patterns are all registered under `prefix`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: pattern::normalize(prefix).to_string(),
            roots: HashMap::new(),
            exact: HashMap::new(),
            dynamic: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.exact.is_empty() && self.dynamic.is_empty()
    }

    /// Registers `handler` for `method` at `pattern` (after the prefix).
    ///
    /// Registering the same pattern twice for one method is an error.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        let full = format!("{}{}", self.prefix, pattern);
        let normalized = pattern::normalize(&full).to_string();

        match self.insert(method, &normalized, handler)? {
            None => Ok(()),
            Some(_) => Err(RouteError::Duplicate {
                method,
                pattern: if normalized.is_empty() { "/".to_string() } else { normalized },
            }),
        }
    }

    /// Inserts an already prefixed and normalized pattern.
    ///
    /// Returns the handler back when the slot is taken; the table is left
    /// untouched in that case.
    fn insert(&mut self, method: Method, normalized: &str, handler: H) -> Result<Option<H>, RouteError> {
        match pattern::classify(normalized) {
            PatternKind::Root => match self.roots.entry(method) {
                Entry::Occupied(_) => Ok(Some(handler)),
                Entry::Vacant(slot) => {
                    slot.insert(handler);
                    Ok(None)
                }
            },
            PatternKind::Exact => match self.exact.entry(method).or_default().entry(normalized.to_string()) {
                Entry::Occupied(_) => Ok(Some(handler)),
                Entry::Vacant(slot) => {
                    slot.insert(handler);
                    Ok(None)
                }
            },
            PatternKind::Parameterized => {
                let template = Template::parse(normalized)?;
                let table = self.dynamic.entry(method).or_default();
                if table.routes.iter().any(|r| r.pattern == normalized) {
                    return Ok(Some(handler));
                }

                let index = table.routes.len();
                let group = format!("route_{index}_{method}");
                let (source, captures) = template.to_regex(&group, &format!("p{index}_"));
                table.routes.push(DynamicRoute {
                    pattern: normalized.to_string(),
                    group,
                    captures,
                    source,
                    handler,
                });
                if let Err(err) = table.recompile(method) {
                    table.routes.pop();
                    return Err(err);
                }
                Ok(None)
            }
        }
    }

    /// Every method that has a handler for `path`, with its parameters.
    ///
    /// An empty map means nothing matched.
    pub fn match_path(&self, path: &str) -> HashMap<Method, RouteMatch<'_, H>> {
        let path = pattern::normalize(path);

        if path.is_empty() {
            return self
                .roots
                .iter()
                .map(|(method, handler)| {
                    (*method, RouteMatch { handler, params: Params::new() })
                })
                .collect();
        }

        let exact: HashMap<_, _> = self
            .exact
            .iter()
            .filter_map(|(method, paths)| {
                paths
                    .get(path)
                    .map(|handler| (*method, RouteMatch { handler, params: Params::new() }))
            })
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        self.dynamic
            .iter()
            .filter_map(|(method, table)| table.find(path).map(|found| (*method, found)))
            .collect()
    }

    /// The handler for one method at `path`, if any.
    pub fn resolve(&self, method: Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.match_path(path).remove(&method)
    }
}

impl<H: Clone> Router<H> {
    /// Merges every route of `other` into this table.
    ///
    /// Entries already present here are kept; parameterized patterns from
    /// `other` are appended after this table's own, in `other`'s order.
    pub fn combine(&mut self, other: &Router<H>) -> Result<(), RouteError> {
        for (method, handler) in &other.roots {
            self.insert(*method, "", handler.clone())?;
        }
        for (method, paths) in &other.exact {
            for (path, handler) in paths {
                self.insert(*method, path, handler.clone())?;
            }
        }
        for (method, table) in &other.dynamic {
            for route in &table.routes {
                self.insert(*method, &route.pattern, route.handler.clone())?;
            }
        }
        Ok(())
    }
}
