use crate::handler::{HandlerFunc, IntoHandlers};
use crate::router::{Router, DEFAULT_404_BODY};
use crate::static_files::resolve;
use crate::{Context, RouteError};
use http::{Method, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// The longest chain a route may be registered with, middlewares included.
pub const MAX_HANDLERS: usize = 62;

const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::TRACE,
    Method::CONNECT,
];

macro_rules! method_shortcut {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Shortcut for `handle(Method::", stringify!($method), ", pattern, handlers)`.")]
        ///
        /// # Panics
        ///
        /// Panics if the route can not be registered, see [`crate::RouteError`].
        pub fn $name(&mut self, pattern: &str, handlers: impl $crate::IntoHandlers) -> &mut Self {
            self.handle(http::Method::$method, pattern, handlers)
        }
    };
}

macro_rules! method_shortcuts {
    () => {
        $crate::group::method_shortcut!(get, GET);
        $crate::group::method_shortcut!(post, POST);
        $crate::group::method_shortcut!(put, PUT);
        $crate::group::method_shortcut!(delete, DELETE);
        $crate::group::method_shortcut!(head, HEAD);
        $crate::group::method_shortcut!(options, OPTIONS);
        $crate::group::method_shortcut!(patch, PATCH);
        $crate::group::method_shortcut!(trace, TRACE);
        $crate::group::method_shortcut!(connect, CONNECT);
    };
}

pub(crate) use method_shortcut;
pub(crate) use method_shortcuts;

/// Registers routes below a common path prefix, with middlewares shared by all of them.
///
/// The group middlewares are combined with the route handlers when the route is registered, so
/// middlewares added to a group only apply to routes registered after them.
///
/// ```
/// use lattice_web::{Context, Engine};
///
/// fn auth(c: &mut Context) {
///     if c.header("Authorization").is_none() {
///         c.abort_with_status(http::StatusCode::UNAUTHORIZED);
///     }
/// }
///
/// let mut engine = Engine::new();
/// let mut api = engine.group("/api");
/// api.use_middleware(auth);
/// api.get("/users/:id", |c: &mut Context| {
///     let id = c.param("id").to_owned();
///     c.string(id);
/// });
/// ```
pub struct RouterGroup<'a> {
    base_path: String,
    middlewares: Vec<HandlerFunc>,
    router: &'a mut Router,
}

impl<'a> RouterGroup<'a> {
    pub(crate) fn new(router: &'a mut Router, base_path: &str) -> Self {
        Self { base_path: base_path.to_owned(), middlewares: Vec::new(), router }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Adds middlewares that run before the handlers of routes registered later in this group.
    ///
    /// # Panics
    ///
    /// Panics if `middlewares` is empty.
    pub fn use_middleware(&mut self, middlewares: impl IntoHandlers) -> &mut Self {
        let middlewares = middlewares.into_handlers();
        assert!(!middlewares.is_empty(), "{}", RouteError::NoMiddleware);
        self.middlewares.extend(middlewares);
        self
    }

    /// Creates a nested group, inheriting the base path and the middlewares of this one.
    pub fn group(&mut self, path: &str) -> RouterGroup<'_> {
        RouterGroup {
            base_path: format!("{}{path}", self.base_path),
            middlewares: self.middlewares.iter().map(Arc::clone).collect(),
            router: &mut *self.router,
        }
    }

    /// Registers `handlers` for `method` requests on the base path followed by `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the route can not be registered, see [`RouterGroup::try_handle`].
    pub fn handle(&mut self, method: Method, pattern: &str, handlers: impl IntoHandlers) -> &mut Self {
        if let Err(e) = self.try_handle(method, pattern, handlers) {
            panic!("{e}");
        }
        self
    }

    /// Registers `handlers` for `method` requests on the base path followed by `pattern`.
    ///
    /// # Errors
    ///
    /// Fails when there is no handler, when the combined chain is longer than [`MAX_HANDLERS`],
    /// or when the router rejects the pattern.
    pub fn try_handle(&mut self, method: Method, pattern: &str, handlers: impl IntoHandlers) -> Result<(), RouteError> {
        self.register(method, pattern, handlers.into_handlers())
    }

    fn register(&mut self, method: Method, pattern: &str, handlers: Vec<HandlerFunc>) -> Result<(), RouteError> {
        let pattern = format!("{}{pattern}", self.base_path);
        if handlers.is_empty() {
            return Err(RouteError::no_handlers(pattern));
        }

        let handlers = self.combine(handlers)?;
        self.router.handle(method, &pattern, handlers)
    }

    fn combine(&self, handlers: Vec<HandlerFunc>) -> Result<Vec<HandlerFunc>, RouteError> {
        let count = self.middlewares.len() + handlers.len();
        if count > MAX_HANDLERS {
            return Err(RouteError::too_many_handlers(count, MAX_HANDLERS));
        }

        let mut merged = Vec::with_capacity(count);
        merged.extend(self.middlewares.iter().map(Arc::clone));
        merged.extend(handlers);
        Ok(merged)
    }

    method_shortcuts!();

    /// Registers `handlers` for every standard method:
    /// GET, POST, PUT, DELETE, HEAD, OPTIONS, PATCH, TRACE and CONNECT.
    ///
    /// # Panics
    ///
    /// Panics if any of the routes can not be registered.
    pub fn any(&mut self, pattern: &str, handlers: impl IntoHandlers) -> &mut Self {
        let handlers = handlers.into_handlers();
        for method in ANY_METHODS {
            if let Err(e) = self.register(method, pattern, handlers.clone()) {
                panic!("{e}");
            }
        }
        self
    }

    /// Serves the single file `file` for GET and HEAD requests on `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` contains parameters or can not be registered.
    pub fn static_file(&mut self, pattern: &str, file: impl Into<PathBuf>) -> &mut Self {
        let file = file.into();
        let handler: HandlerFunc = Arc::new(move |c: &mut Context| c.serve_file(&file));
        self.register_static(pattern, pattern, &handler)
    }

    /// Serves the files below `dir` for GET and HEAD requests on `pattern/*filepath`.
    ///
    /// Paths stepping out of `dir` with `..` answer `404`.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` contains parameters or can not be registered.
    pub fn static_dir(&mut self, pattern: &str, dir: impl Into<PathBuf>) -> &mut Self {
        let dir = dir.into();
        let handler: HandlerFunc = Arc::new(move |c: &mut Context| match resolve(&dir, c.param("filepath")) {
            Some(path) => c.serve_file(path),
            None => {
                c.set_status(StatusCode::NOT_FOUND);
                c.string(DEFAULT_404_BODY);
            }
        });

        let url_pattern = format!("{}/*filepath", pattern.trim_end_matches('/'));
        self.register_static(pattern, &url_pattern, &handler)
    }

    fn register_static(&mut self, pattern: &str, url_pattern: &str, handler: &HandlerFunc) -> &mut Self {
        assert!(!pattern.contains([':', '*']), "{}", RouteError::static_with_params(pattern));

        for method in [Method::HEAD, Method::GET] {
            if let Err(e) = self.register(method, url_pattern, vec![Arc::clone(handler)]) {
                panic!("{e}");
            }
        }
        self
    }
}

impl fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup")
            .field("base_path", &self.base_path)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{RouterGroup, MAX_HANDLERS};
    use crate::router::Router;
    use crate::{chain, Context, HandlerChain, RouteError};
    use bytes::Bytes;
    use http::{Method, Request, Response, StatusCode};
    use std::sync::Arc;

    fn serve(router: &Router, method: Method, uri: &str) -> Response<Bytes> {
        let request = Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap();
        let mut c = Context::new(request, None);
        router.handle_request(&mut c);
        c.into_response()
    }

    fn body(response: &Response<Bytes>) -> String {
        String::from_utf8(response.body().to_vec()).unwrap()
    }

    fn tag(name: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
        move |c: &mut Context| {
            c.write(format!("<{name}>"));
            c.next();
            c.write(format!("</{name}>"));
        }
    }

    #[test]
    fn base_path_and_middlewares() {
        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "/api");
        group.use_middleware(tag("api"));
        group.get("/users/:id", |c: &mut Context| {
            let id = c.param("id").to_owned();
            c.write(id);
        });

        assert_eq!(body(&serve(&router, Method::GET, "/api/users/7")), "<api>7</api>");
        assert_eq!(serve(&router, Method::GET, "/users/7").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn middlewares_apply_to_later_routes_only() {
        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "");
        group.get("/before", |c: &mut Context| c.write("before"));
        group.use_middleware(tag("m"));
        group.get("/after", |c: &mut Context| c.write("after"));

        assert_eq!(body(&serve(&router, Method::GET, "/before")), "before");
        assert_eq!(body(&serve(&router, Method::GET, "/after")), "<m>after</m>");
    }

    #[test]
    fn nested_group_inherits() {
        let mut router = Router::new();
        let mut api = RouterGroup::new(&mut router, "/api");
        api.use_middleware(tag("api"));
        {
            let mut v1 = api.group("/v1");
            assert_eq!(v1.base_path(), "/api/v1");
            v1.use_middleware(tag("v1"));
            v1.get("/ping", |c: &mut Context| c.write("pong"));
        }
        api.get("/ping", |c: &mut Context| c.write("pong"));

        assert_eq!(body(&serve(&router, Method::GET, "/api/v1/ping")), "<api><v1>pong</v1></api>");
        assert_eq!(body(&serve(&router, Method::GET, "/api/ping")), "<api>pong</api>");
    }

    #[test]
    fn method_shortcuts() {
        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "");
        group
            .get("/r", |c: &mut Context| c.write("get"))
            .post("/r", |c: &mut Context| c.write("post"))
            .put("/r", |c: &mut Context| c.write("put"))
            .delete("/r", |c: &mut Context| c.write("delete"))
            .head("/r", |c: &mut Context| c.write("head"))
            .options("/r", |c: &mut Context| c.write("options"))
            .patch("/r", |c: &mut Context| c.write("patch"))
            .trace("/r", |c: &mut Context| c.write("trace"))
            .connect("/r", |c: &mut Context| c.write("connect"));

        for method in super::ANY_METHODS {
            let expected = method.as_str().to_lowercase();
            assert_eq!(body(&serve(&router, method, "/r")), expected);
        }
    }

    #[test]
    fn any() {
        let mut router = Router::new();
        RouterGroup::new(&mut router, "").any("/all", |c: &mut Context| {
            let method = c.method().to_string();
            c.write(method);
        });

        for method in super::ANY_METHODS {
            let expected = method.to_string();
            assert_eq!(body(&serve(&router, method, "/all")), expected);
        }
    }

    #[test]
    fn handler_chain() {
        let mut router = Router::new();
        RouterGroup::new(&mut router, "").get("/", chain![tag("a"), |c: &mut Context| c.write("h")]);

        assert_eq!(body(&serve(&router, Method::GET, "/")), "<a>h</a>");
    }

    #[test]
    fn try_handle_errors() {
        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "/api");

        assert_eq!(group.try_handle(Method::GET, "/x", HandlerChain::new()), Err(RouteError::no_handlers("/api/x")));

        let mut handlers = HandlerChain::new();
        for _ in 0..=MAX_HANDLERS {
            handlers = handlers.with(|c: &mut Context| c.next());
        }
        assert_eq!(
            group.try_handle(Method::GET, "/x", handlers),
            Err(RouteError::too_many_handlers(MAX_HANDLERS + 1, MAX_HANDLERS))
        );
    }

    #[test]
    fn longest_chain_accepted() {
        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "");
        group.use_middleware(|c: &mut Context| c.next());

        let mut handlers = HandlerChain::new();
        for _ in 1..MAX_HANDLERS {
            handlers.push(Arc::new(|c: &mut Context| c.next()));
        }
        assert_eq!(handlers.len(), MAX_HANDLERS - 1);
        assert!(group.try_handle(Method::GET, "/", handlers).is_ok());
    }

    #[test]
    #[should_panic(expected = "conflicts with existing pattern")]
    fn handle_panics_on_conflict() {
        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "");
        group.get("/a/:b", |c: &mut Context| c.write("b"));
        group.get("/a/:c", |c: &mut Context| c.write("c"));
    }

    #[test]
    #[should_panic(expected = "there must be at least one middleware")]
    fn empty_middleware_panics() {
        let mut router = Router::new();
        RouterGroup::new(&mut router, "").use_middleware(HandlerChain::new());
    }

    #[test]
    #[should_panic(expected = "URL parameters can not be used")]
    fn static_pattern_with_params_panics() {
        let mut router = Router::new();
        RouterGroup::new(&mut router, "").static_dir("/files/:name", "/tmp");
    }

    #[test]
    fn static_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css").join("site.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();

        let mut router = Router::new();
        let mut group = RouterGroup::new(&mut router, "");
        group.static_file("/robots.txt", dir.path().join("robots.txt"));
        group.static_dir("/assets/", dir.path());
        group.post("/upload", |c: &mut Context| c.write("uploaded"));

        let response = serve(&router, Method::GET, "/robots.txt");
        assert_eq!(body(&response), "User-agent: *");
        assert_eq!(serve(&router, Method::HEAD, "/robots.txt").status(), StatusCode::OK);

        let response = serve(&router, Method::GET, "/assets/css/site.css");
        assert_eq!(response.headers()["content-type"], "text/css; charset=utf-8");
        assert_eq!(body(&response), "body {}");

        assert_eq!(serve(&router, Method::GET, "/assets/missing.css").status(), StatusCode::NOT_FOUND);
        assert_eq!(serve(&router, Method::GET, "/assets/../secret").status(), StatusCode::NOT_FOUND);
        assert_eq!(serve(&router, Method::POST, "/assets/css/site.css").status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
