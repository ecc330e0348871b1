use crate::Context;
use std::fmt;
use std::sync::Arc;

/// One step of a request chain.
///
/// Middlewares and route handlers share this trait. A middleware calls [`Context::next`] to run
/// the rest of the chain and can do work before and after that call.
pub trait Handler: Send + Sync {
    fn handle(&self, c: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn handle(&self, c: &mut Context) {
        self(c);
    }
}

/// A shared, type erased handler.
pub type HandlerFunc = Arc<dyn Handler>;

/// Pins the argument type of a closure so it can be passed where `impl IntoHandlers` is expected
/// without annotating `&mut Context`.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&mut Context) + Send + Sync,
{
    f
}

/// An ordered list of handlers registered together.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<HandlerFunc>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn push(&mut self, handler: HandlerFunc) {
        self.handlers.push(handler);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain").field("len", &self.handlers.len()).finish()
    }
}

impl From<Vec<HandlerFunc>> for HandlerChain {
    fn from(handlers: Vec<HandlerFunc>) -> Self {
        Self { handlers }
    }
}

/// Anything that can be registered as the handlers of a route or as middlewares.
pub trait IntoHandlers {
    fn into_handlers(self) -> Vec<HandlerFunc>;
}

impl<H: Handler + 'static> IntoHandlers for H {
    fn into_handlers(self) -> Vec<HandlerFunc> {
        vec![Arc::new(self)]
    }
}

impl IntoHandlers for HandlerChain {
    fn into_handlers(self) -> Vec<HandlerFunc> {
        self.handlers
    }
}

/// Builds a [`HandlerChain`] from a list of handlers, run in the given order.
///
/// ```
/// use lattice_web::{chain, Context};
///
/// fn auth(c: &mut Context) {
///     c.next();
/// }
///
/// fn show(c: &mut Context) {
///     c.string("ok");
/// }
///
/// let handlers = chain![auth, show];
/// assert_eq!(handlers.len(), 2);
/// ```
#[macro_export]
macro_rules! chain {
    ($($handler:expr),* $(,)?) => {
        $crate::HandlerChain::new()$(.with($handler))*
    };
}
