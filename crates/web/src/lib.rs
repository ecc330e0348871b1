//! A small web framework built around a segment trie router and an onion middleware chain.
//!
//! Routes and middlewares are registered on an [`Engine`], either directly or through a
//! [`RouterGroup`] sharing a path prefix and middlewares. [`Engine::build`] freezes everything
//! into an [`App`], and a [`Server`] serves that app over HTTP/1.1.
//!
//! Every handler receives the per request [`Context`]: it reads the request, writes the
//! buffered response and drives the chain with [`Context::next`] and [`Context::abort`].
//!
//! # Example
//! ```no_run
//! use lattice_web::{Context, Engine, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut engine = Engine::with_default_middlewares();
//!     engine.get("/hello/:name", |c: &mut Context| {
//!         let greeting = format!("hello {}", c.param("name"));
//!         c.string(greeting);
//!     });
//!
//!     let server = Server::builder().app(engine.build()).address("127.0.0.1:3000").build().unwrap();
//!     server.start().await.unwrap();
//! }
//! ```

mod bind;
mod context;
mod engine;
mod error;
mod group;
mod handler;
mod middleware;
mod router;
mod server;
mod static_files;

pub use context::Context;
pub use engine::{App, Config, Engine};
pub use error::{BindError, RouteError, ServerBuildError, ServerError};
pub use group::{RouterGroup, MAX_HANDLERS};
pub use handler::{handler_fn, Handler, HandlerChain, HandlerFunc, IntoHandlers};
pub use middleware::{logger, recover, Logger, Recover};
pub use router::{Outcome, Router};
pub use server::{Server, ServerBuilder};

pub use lattice_tree::{InsertError, Params};
