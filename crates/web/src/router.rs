//! Method aware dispatch on top of the segment tree.
//!
//! The [`Router`] stores one handler chain per (pattern, method) pair in a [`lattice_tree::Node`]
//! and resolves a request to one of four outcomes, see [`Outcome`].

use crate::handler::HandlerFunc;
use crate::{Context, RouteError};
use http::{Method, StatusCode};
use lattice_tree::{Node, Params};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub(crate) const DEFAULT_404_BODY: &str = "404 page not found\n";
pub(crate) const DEFAULT_405_BODY: &str = "405 method not allowed\n";

pub struct Router {
    tree: Node<Vec<HandlerFunc>>,
    ignore_case: bool,
    trailing_slash_redirect: bool,
    no_route: Vec<HandlerFunc>,
    no_method: Vec<HandlerFunc>,
    allowed_methods: HashSet<Method>,
}

/// How a request resolves against the route table.
pub enum Outcome<'r> {
    /// A chain is registered for the path and the method.
    Matched { handlers: &'r [HandlerFunc], params: Params },
    /// The path with its trailing slash toggled is registered, `location` is that path.
    Redirect { location: String },
    /// The path is registered, the method is not registered for it but for some other path.
    MethodNotAllowed { params: Params },
    NotFound { params: Params },
}

impl Router {
    pub fn new() -> Self {
        Self {
            tree: Node::default(),
            ignore_case: false,
            trailing_slash_redirect: true,
            no_route: Vec::new(),
            no_method: Vec::new(),
            allowed_methods: HashSet::new(),
        }
    }

    /// Lowercases registered patterns and request paths before matching.
    ///
    /// Only patterns registered after this call are lowercased, set it before adding routes.
    pub fn set_ignore_case(&mut self, ignore_case: bool) {
        self.ignore_case = ignore_case;
    }

    /// Redirects `/a/b/` to `/a/b` and back with `301` when only the other form is registered.
    /// Enabled by default.
    pub fn set_trailing_slash_redirect(&mut self, trailing_slash_redirect: bool) {
        self.trailing_slash_redirect = trailing_slash_redirect;
    }

    pub fn set_no_route(&mut self, handlers: Vec<HandlerFunc>) {
        self.no_route = handlers;
    }

    pub fn set_no_method(&mut self, handlers: Vec<HandlerFunc>) {
        self.no_method = handlers;
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn trailing_slash_redirect(&self) -> bool {
        self.trailing_slash_redirect
    }

    /// Registers `handlers` for `method` requests on `pattern`.
    ///
    /// # Errors
    ///
    /// Fails when the pattern does not start with `/`, when `handlers` is empty, and for every
    /// [`lattice_tree::InsertError`], including a second chain for the same method and pattern.
    pub fn handle(&mut self, method: Method, pattern: &str, handlers: Vec<HandlerFunc>) -> Result<(), RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::missing_leading_slash(pattern));
        }
        if handlers.is_empty() {
            return Err(RouteError::no_handlers(pattern));
        }

        let pattern = if self.ignore_case { pattern.to_lowercase() } else { pattern.to_owned() };
        self.tree.insert(&pattern)?.add_value(method.as_str(), handlers)?;
        self.allowed_methods.insert(method);
        Ok(())
    }

    /// Resolves `method` and `path` against the route table.
    ///
    /// The path is percent decoded before matching, so captured parameters hold decoded values.
    /// A path that does not start with `/`, such as the `*` of `OPTIONS *`, is not found.
    pub fn dispatch(&self, method: &Method, path: &str) -> Outcome<'_> {
        if !path.starts_with('/') {
            return Outcome::NotFound { params: Params::new() };
        }

        // match on the decoded path, an invalid utf-8 escape keeps the raw one
        let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        let lookup_path = if self.ignore_case { Cow::Owned(decoded.to_lowercase()) } else { decoded };

        let lookup = self.tree.find(&lookup_path);
        let node = lookup.node();
        let tsr = lookup.tsr();

        if let Some(handlers) = node.and_then(|node| node.value(method.as_str())) {
            return Outcome::Matched { handlers, params: lookup.into_params() };
        }

        let endpoint = node.is_some_and(Node::is_endpoint);
        if tsr && self.trailing_slash_redirect && !endpoint {
            return Outcome::Redirect { location: toggle_trailing_slash(path) };
        }

        // the known methods are tracked for the whole router, not per path
        if endpoint && self.allowed_methods.contains(method) {
            return Outcome::MethodNotAllowed { params: lookup.into_params() };
        }

        Outcome::NotFound { params: lookup.into_params() }
    }

    /// Resolves the request of `c` and runs the selected chain on it.
    pub fn handle_request(&self, c: &mut Context) {
        match self.dispatch(c.method(), c.path()) {
            Outcome::Matched { handlers, params } => {
                c.set_params(params);
                c.extend_handlers(handlers.iter().map(Arc::clone));
                c.next();
            }
            Outcome::Redirect { location } => {
                let location = match c.uri().query() {
                    Some(query) => format!("{location}?{query}"),
                    None => location,
                };
                c.redirect_with_status(StatusCode::MOVED_PERMANENTLY, &location);
            }
            Outcome::MethodNotAllowed { params } => {
                Self::fallback(c, &self.no_method, params, StatusCode::METHOD_NOT_ALLOWED, DEFAULT_405_BODY);
            }
            Outcome::NotFound { params } => {
                Self::fallback(c, &self.no_route, params, StatusCode::NOT_FOUND, DEFAULT_404_BODY);
            }
        }
    }

    fn fallback(c: &mut Context, handlers: &[HandlerFunc], params: Params, status: StatusCode, body: &str) {
        if handlers.is_empty() {
            c.set_status(status);
            c.string(body);
            return;
        }

        c.set_params(params);
        c.extend_handlers(handlers.iter().map(Arc::clone));
        c.next();
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("ignore_case", &self.ignore_case)
            .field("trailing_slash_redirect", &self.trailing_slash_redirect)
            .field("allowed_methods", &self.allowed_methods)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Outcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Matched { handlers, params } => {
                f.debug_struct("Matched").field("handlers", &handlers.len()).field("params", params).finish()
            }
            Outcome::Redirect { location } => f.debug_struct("Redirect").field("location", location).finish(),
            Outcome::MethodNotAllowed { params } => f.debug_struct("MethodNotAllowed").field("params", params).finish(),
            Outcome::NotFound { params } => f.debug_struct("NotFound").field("params", params).finish(),
        }
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => format!("{path}/"),
    }
}
