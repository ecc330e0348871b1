//! A segment trie for matching URL paths.
//!
//! Patterns are split on `/` and every segment becomes one edge of the tree. A segment is one of
//!
//! - a literal, matched exactly (`/users`)
//! - a named parameter, matching exactly one segment (`/users/:id`)
//! - a wildcard, matching the rest of the path and only allowed last (`/files/*path`)
//! - the empty segment produced by a trailing slash (`/users/`)
//!
//! Ambiguous registrations are rejected by [`Node::insert`], so [`Node::find`] can match greedily
//! in a single pass: a literal edge is always preferred over the parameter edge and the walk never
//! backtracks.
//!
//! Every node carries a map from a method name to a caller supplied value, the router stores its
//! handler chains there.
//!
//! # Example
//!
//! ```
//! use lattice_tree::Node;
//!
//! let mut tree = Node::default();
//! tree.insert("/users/:id").unwrap().add_value("GET", "show user").unwrap();
//! tree.insert("/static/*path").unwrap().add_value("GET", "serve file").unwrap();
//!
//! let lookup = tree.find("/users/42");
//! assert_eq!(lookup.node().and_then(|n| n.value("GET")), Some(&"show user"));
//! assert_eq!(lookup.params().get("id"), Some("42"));
//!
//! let lookup = tree.find("/static/css/site.css");
//! assert_eq!(lookup.params().get("path"), Some("css/site.css"));
//! ```

mod error;
mod node;
mod params;

pub use error::InsertError;
pub use node::Lookup;
pub use node::Node;
pub use params::Params;
