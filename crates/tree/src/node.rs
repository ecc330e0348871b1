use crate::{InsertError, Params};
use std::collections::HashMap;

const PARAM_SIGIL: char = ':';
const WILDCARD_SIGIL: char = '*';

/// A node of the segment trie.
///
/// Literal edges live in `children`, keyed by the segment text. The empty key holds the trailing
/// slash continuation of a pattern. A node has at most one parameter edge, either a `:name` or a
/// `*name` segment.
///
/// Children are boxed so a node keeps its address when siblings are added later.
#[derive(Debug)]
pub struct Node<T> {
    segment: String,
    pattern: String,
    name: String,
    endpoint: bool,
    wildcard: bool,
    children: HashMap<String, Box<Node<T>>>,
    param_child: Option<Box<Node<T>>>,
    values: HashMap<String, T>,
}

/// The outcome of [`Node::find`].
#[derive(Debug)]
pub struct Lookup<'t, T> {
    node: Option<&'t Node<T>>,
    params: Params,
    tsr: bool,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self::with_segment(String::new())
    }
}

impl<T> Node<T> {
    fn with_segment(segment: String) -> Self {
        Self {
            segment,
            pattern: String::new(),
            name: String::new(),
            endpoint: false,
            wildcard: false,
            children: HashMap::new(),
            param_child: None,
            values: HashMap::new(),
        }
    }

    fn param(segment: &str, name: &str, wildcard: bool) -> Self {
        Self { name: name.to_owned(), wildcard, ..Self::with_segment(segment.to_owned()) }
    }

    /// Registers `pattern` and returns the node it terminates at.
    ///
    /// The leading `/` is optional, `"a/b"` and `"/a/b"` name the same node. Inserting a pattern
    /// that is already present returns the existing node and leaves the tree unchanged.
    ///
    /// # Errors
    ///
    /// Fails when the pattern contains `//`, when a parameter name is not made of word characters,
    /// when a segment follows a wildcard, or when the pattern is ambiguous against a pattern
    /// registered before:
    ///
    /// - a trailing `*name` next to any literal sibling other than the root slash
    /// - a trailing `:name` next to a literal sibling that is itself an endpoint
    /// - a literal next to a wildcard, or a trailing literal next to an endpoint parameter
    /// - two parameters at one position with different names or kinds
    pub fn insert(&mut self, pattern: &str) -> Result<&mut Node<T>, InsertError> {
        if pattern.contains("//") {
            return Err(InsertError::multi_slash(pattern));
        }

        let trimmed = pattern.strip_prefix('/').unwrap_or(pattern);
        let full_pattern = format!("/{trimmed}");
        let segments = trimmed.split('/').collect::<Vec<_>>();
        let last = segments.len() - 1;

        for (index, segment) in segments.iter().enumerate() {
            if let Some(name) = param_name(segment) {
                if !is_valid_name(name) {
                    return Err(InsertError::invalid_param_name(&full_pattern, name));
                }
                if segment.starts_with(WILDCARD_SIGIL) && index != last {
                    return Err(InsertError::after_wildcard(&full_pattern));
                }
            }
        }

        let mut node = self;
        let mut prefix = String::new();
        for (index, segment) in segments.into_iter().enumerate() {
            let is_last = index == last;

            let child = match param_name(segment) {
                Some(name) => {
                    let wildcard = segment.starts_with(WILDCARD_SIGIL);
                    node.check_param(name, wildcard, is_last, &prefix, &full_pattern)?;
                    node.param_child.get_or_insert_with(|| Box::new(Node::param(segment, name, wildcard)))
                }
                None => {
                    node.check_literal(segment, is_last, &prefix, &full_pattern)?;
                    node.children
                        .entry(segment.to_owned())
                        .or_insert_with(|| Box::new(Node::with_segment(segment.to_owned())))
                }
            };

            prefix.push('/');
            prefix.push_str(segment);
            node = &mut **child;
        }

        node.endpoint = true;
        node.pattern = full_pattern;
        Ok(node)
    }

    fn check_literal(&self, segment: &str, is_last: bool, prefix: &str, pattern: &str) -> Result<(), InsertError> {
        // reusing an edge or adding the trailing slash never makes the tree ambiguous
        if segment.is_empty() || self.children.contains_key(segment) {
            return Ok(());
        }

        match self.param_child.as_deref() {
            Some(child) if child.wildcard || (is_last && child.endpoint) => {
                Err(InsertError::conflict(pattern, child.describe(prefix)))
            }
            _ => Ok(()),
        }
    }

    fn check_param(
        &self,
        name: &str,
        wildcard: bool,
        is_last: bool,
        prefix: &str,
        pattern: &str,
    ) -> Result<(), InsertError> {
        if is_last {
            let conflicting = self.children.values().find(|child| {
                if wildcard { child.pattern != "/" } else { child.endpoint && child.pattern != "/" }
            });
            if let Some(child) = conflicting {
                return Err(InsertError::conflict(pattern, child.describe(prefix)));
            }
        }

        match self.param_child.as_deref() {
            Some(child) if child.name != name || child.wildcard != wildcard => {
                Err(InsertError::conflict(pattern, child.describe(prefix)))
            }
            _ => Ok(()),
        }
    }

    /// A printable pattern for conflict messages, also for nodes no pattern terminates at.
    fn describe(&self, prefix: &str) -> String {
        if self.pattern.is_empty() { format!("{prefix}/{}", self.segment) } else { self.pattern.clone() }
    }

    /// Attaches `value` to this node under `method`.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::DuplicateValue`] if the node already holds a value for `method`.
    pub fn add_value(&mut self, method: impl Into<String>, value: T) -> Result<(), InsertError> {
        let method = method.into();
        if self.values.contains_key(&method) {
            return Err(InsertError::duplicate_value(&self.pattern, method));
        }

        self.values.insert(method, value);
        Ok(())
    }

    /// Walks the tree along `path`.
    ///
    /// The returned [`Lookup`] holds the node the path ended at, which may be a node no pattern
    /// terminates at, the captured parameters and whether the same path with the trailing slash
    /// toggled is registered.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not start with `/`.
    pub fn find(&self, path: &str) -> Lookup<'_, T> {
        assert!(path.starts_with('/'), "path must start with \"/\": \"{path}\"");

        let segments = path[1..].split('/').collect::<Vec<_>>();
        let last = segments.len() - 1;

        let mut tsr = false;
        let mut params = Params::new();
        let mut node = self;
        for (index, segment) in segments.iter().enumerate() {
            let is_last = index == last;

            let mut next = node.children.get(*segment).map(Box::as_ref);
            if let Some(child) = next {
                // `/a/b` was requested and `/a/b/` is registered
                if is_last && child.children.contains_key("") {
                    tsr = true;
                }
                if is_last && !child.endpoint {
                    next = None;
                }
            }

            let Some(next) = next.or(node.param_child.as_deref()) else {
                // `/a/b/` was requested and `/a/b` is registered
                if node.endpoint && is_last && segment.is_empty() {
                    tsr = true;
                }
                return Lookup { node: None, params, tsr };
            };

            node = next;
            if node.wildcard {
                params.insert(node.name.as_str(), segments[index..].join("/"));
                break;
            }
            if !node.name.is_empty() {
                params.insert(node.name.as_str(), *segment);
            }
        }

        if node.children.contains_key("") {
            tsr = true;
        }

        Lookup { node: Some(node), params, tsr }
    }

    /// The full pattern terminating at this node, empty for pure continuation nodes.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// The parameter name bound by this node, empty for literal nodes.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_endpoint(&self) -> bool {
        self.endpoint
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn child(&self, segment: &str) -> Option<&Node<T>> {
        self.children.get(segment).map(Box::as_ref)
    }

    pub fn param_child(&self) -> Option<&Node<T>> {
        self.param_child.as_deref()
    }

    pub fn value(&self, method: &str) -> Option<&T> {
        self.values.get(method)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<'t, T> Lookup<'t, T> {
    pub fn node(&self) -> Option<&'t Node<T>> {
        self.node
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }

    /// Whether the path with its trailing slash added or removed is registered.
    pub fn tsr(&self) -> bool {
        self.tsr
    }
}

fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(PARAM_SIGIL).or_else(|| segment.strip_prefix(WILDCARD_SIGIL))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
