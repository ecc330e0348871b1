//! The entry point tying the router, the global middlewares and the configuration together.
//!
//! An [`Engine`] collects routes and middlewares and is turned into an immutable [`App`] by
//! [`Engine::build`]. Every request runs through the global middlewares first, the last link of
//! the global chain resolves the request against the router and runs the route chain, or the
//! 404 / 405 / redirect fallbacks. Global middlewares therefore also see unmatched requests.

use crate::group::{method_shortcuts, RouterGroup};
use crate::handler::{Handler, HandlerFunc, IntoHandlers};
use crate::middleware::{logger, recover};
use crate::router::Router;
use crate::{chain, Context, RouteError};
use bytes::Bytes;
use http::{Method, Request, Response};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Engine wide settings, passed to [`Engine::with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Match paths case insensitively. Defaults to `false`.
    pub ignore_case: bool,
    /// Redirect to the path with the trailing slash toggled when only that one is registered.
    /// Defaults to `true`.
    pub trailing_slash_redirect: bool,
    /// Trust `X-Real-Ip` and `X-Forwarded-For` in [`Context::client_ip`]. Defaults to `false`.
    pub forwarded_by_client_ip: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { ignore_case: false, trailing_slash_redirect: true, forwarded_by_client_ip: false }
    }
}

pub struct Engine {
    router: Router,
    middlewares: Vec<HandlerFunc>,
    forwarded_by_client_ip: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut router = Router::new();
        router.set_ignore_case(config.ignore_case);
        router.set_trailing_slash_redirect(config.trailing_slash_redirect);

        Self { router, middlewares: Vec::new(), forwarded_by_client_ip: config.forwarded_by_client_ip }
    }

    /// An engine with the [`logger`] and [`recover`] middlewares installed.
    pub fn with_default_middlewares() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(chain![logger(), recover()]);
        engine
    }

    pub fn set_ignore_case(&mut self, ignore_case: bool) -> &mut Self {
        self.router.set_ignore_case(ignore_case);
        self
    }

    pub fn set_trailing_slash_redirect(&mut self, trailing_slash_redirect: bool) -> &mut Self {
        self.router.set_trailing_slash_redirect(trailing_slash_redirect);
        self
    }

    pub fn set_forwarded_by_client_ip(&mut self, forwarded_by_client_ip: bool) -> &mut Self {
        self.forwarded_by_client_ip = forwarded_by_client_ip;
        self
    }

    /// Adds global middlewares, run for every request in the order they were added.
    ///
    /// # Panics
    ///
    /// Panics if `middlewares` is empty or the global chain grows too long.
    pub fn use_middleware(&mut self, middlewares: impl IntoHandlers) -> &mut Self {
        let middlewares = middlewares.into_handlers();
        assert!(!middlewares.is_empty(), "{}", RouteError::NoMiddleware);

        // one more slot for the dispatching link
        let count = self.middlewares.len() + middlewares.len() + 1;
        assert!(
            count <= crate::MAX_HANDLERS,
            "{}",
            RouteError::too_many_handlers(count, crate::MAX_HANDLERS)
        );

        self.middlewares.extend(middlewares);
        self
    }

    /// Creates a group for routes below `base_path`.
    ///
    /// The group starts without middlewares, global middlewares already run for every request.
    pub fn group(&mut self, base_path: &str) -> RouterGroup<'_> {
        RouterGroup::new(&mut self.router, base_path)
    }

    /// The root group, without base path and middlewares.
    pub fn routes(&mut self) -> RouterGroup<'_> {
        self.group("")
    }

    /// Registers `handlers` for `method` requests on `pattern`.
    ///
    /// # Panics
    ///
    /// Panics if the route can not be registered, see [`RouterGroup::try_handle`].
    pub fn handle(&mut self, method: Method, pattern: &str, handlers: impl IntoHandlers) -> &mut Self {
        self.routes().handle(method, pattern, handlers);
        self
    }

    /// Registers a route, returning the error instead of panicking.
    ///
    /// # Errors
    ///
    /// See [`RouterGroup::try_handle`].
    pub fn try_handle(&mut self, method: Method, pattern: &str, handlers: impl IntoHandlers) -> Result<(), RouteError> {
        self.routes().try_handle(method, pattern, handlers)
    }

    method_shortcuts!();

    /// See [`RouterGroup::any`].
    pub fn any(&mut self, pattern: &str, handlers: impl IntoHandlers) -> &mut Self {
        self.routes().any(pattern, handlers);
        self
    }

    /// See [`RouterGroup::static_file`].
    pub fn static_file(&mut self, pattern: &str, file: impl Into<PathBuf>) -> &mut Self {
        self.routes().static_file(pattern, file);
        self
    }

    /// See [`RouterGroup::static_dir`].
    pub fn static_dir(&mut self, pattern: &str, dir: impl Into<PathBuf>) -> &mut Self {
        self.routes().static_dir(pattern, dir);
        self
    }

    /// Handlers run when no route matches, instead of the default `404 page not found`.
    pub fn no_route(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.router.set_no_route(handlers.into_handlers());
        self
    }

    /// Handlers run when the path matches but the method does not, instead of the default
    /// `405 method not allowed`.
    pub fn no_method(&mut self, handlers: impl IntoHandlers) -> &mut Self {
        self.router.set_no_method(handlers.into_handlers());
        self
    }

    /// Freezes the route table into an [`App`] that can serve requests.
    pub fn build(self) -> App {
        let mut chain = self.middlewares;
        chain.push(Arc::new(Dispatch { router: self.router }));

        App { chain: chain.into(), forwarded_by_client_ip: self.forwarded_by_client_ip }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("router", &self.router)
            .field("middlewares", &self.middlewares.len())
            .field("forwarded_by_client_ip", &self.forwarded_by_client_ip)
            .finish()
    }
}

/// The last link of the global chain.
struct Dispatch {
    router: Router,
}

impl Handler for Dispatch {
    fn handle(&self, c: &mut Context) {
        self.router.handle_request(c);
    }
}

/// A built engine. Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct App {
    chain: Arc<[HandlerFunc]>,
    forwarded_by_client_ip: bool,
}

impl App {
    /// Runs `request` through the global chain and returns the buffered response.
    pub fn serve(&self, request: Request<Bytes>, remote_addr: Option<SocketAddr>) -> Response<Bytes> {
        let mut c = Context::new(request, remote_addr);
        c.set_forwarded_by_client_ip(self.forwarded_by_client_ip);
        c.extend_handlers(self.chain.iter().map(Arc::clone));
        c.next();
        c.into_response()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("chain", &self.chain.len())
            .field("forwarded_by_client_ip", &self.forwarded_by_client_ip)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{App, Config, Engine};
    use crate::{Context, HandlerChain};
    use bytes::Bytes;
    use http::{header, Method, Request, Response, StatusCode};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    fn request(app: &App, method: Method, uri: &str) -> Response<Bytes> {
        let request = Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap();
        app.serve(request, Some(SocketAddr::from(([127, 0, 0, 1], 40000))))
    }

    fn body(response: &Response<Bytes>) -> String {
        String::from_utf8(response.body().to_vec()).unwrap()
    }

    type Trace = Arc<Mutex<Vec<String>>>;

    fn record(trace: &Trace, name: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
        let trace = Arc::clone(trace);
        move |c: &mut Context| {
            trace.lock().unwrap().push(format!("{name}-pre"));
            c.next();
            trace.lock().unwrap().push(format!("{name}-post"));
        }
    }

    #[test]
    fn global_and_group_middlewares_nest() {
        let trace = Trace::default();
        let mut engine = Engine::new();
        engine.use_middleware(record(&trace, "m1")).use_middleware(record(&trace, "m2"));

        let handler_trace = Arc::clone(&trace);
        engine.group("/api").use_middleware(record(&trace, "g")).get("/h", move |_: &mut Context| {
            handler_trace.lock().unwrap().push("h".to_owned());
        });

        let app = engine.build();
        assert_eq!(request(&app, Method::GET, "/api/h").status(), StatusCode::OK);
        assert_eq!(*trace.lock().unwrap(), vec!["m1-pre", "m2-pre", "g-pre", "h", "g-post", "m2-post", "m1-post"]);
    }

    #[test]
    fn global_middlewares_wrap_not_found() {
        let trace = Trace::default();
        let mut engine = Engine::new();
        engine.use_middleware(record(&trace, "m"));
        engine.get("/a", |c: &mut Context| c.string("a"));

        let response = request(&engine.build(), Method::GET, "/missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), "404 page not found\n");
        assert_eq!(*trace.lock().unwrap(), vec!["m-pre", "m-post"]);
    }

    #[test]
    fn global_abort_skips_routing() {
        let mut engine = Engine::new();
        engine.use_middleware(|c: &mut Context| {
            if c.header("Authorization").is_none() {
                c.abort_with_status(StatusCode::UNAUTHORIZED);
            }
        });
        engine.get("/secret", |c: &mut Context| c.string("secret"));
        let app = engine.build();

        let response = request(&app, Method::GET, "/secret");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.body().is_empty());

        let authorized = Request::get("/secret").header("Authorization", "token").body(Bytes::new()).unwrap();
        assert_eq!(body(&app.serve(authorized, None)), "secret");
    }

    #[test]
    fn custom_fallbacks() {
        let mut engine = Engine::new();
        engine.get("/a", |c: &mut Context| c.string("a"));
        engine.no_route(|c: &mut Context| {
            c.set_status(StatusCode::NOT_FOUND);
            c.json(&serde_json::json!({"error": "not found"}));
        });
        engine.no_method(|c: &mut Context| {
            c.set_status(StatusCode::METHOD_NOT_ALLOWED);
            c.string("nope");
        });
        engine.post("/b", |c: &mut Context| c.string("b"));
        let app = engine.build();

        let response = request(&app, Method::GET, "/missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), "{\"error\":\"not found\"}\n");

        let response = request(&app, Method::POST, "/a");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body(&response), "nope");
    }

    #[test]
    fn config() {
        let mut engine = Engine::with_config(Config {
            ignore_case: true,
            trailing_slash_redirect: false,
            forwarded_by_client_ip: true,
        });
        engine.get("/Who", |c: &mut Context| {
            let ip = c.client_ip();
            c.string(ip);
        });
        let app = engine.build();

        let who = Request::get("/WHO").header("X-Forwarded-For", "8.8.8.8").body(Bytes::new()).unwrap();
        assert_eq!(body(&app.serve(who, None)), "8.8.8.8");
        assert_eq!(request(&app, Method::GET, "/who/").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn setters() {
        let mut engine = Engine::new();
        engine.set_trailing_slash_redirect(false).set_forwarded_by_client_ip(false).set_ignore_case(false);
        engine.get("/a/", |c: &mut Context| c.string("a"));

        assert_eq!(request(&engine.build(), Method::GET, "/a").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn default_redirect() {
        let mut engine = Engine::new();
        engine.get("/a/", |c: &mut Context| c.string("a"));

        let response = request(&engine.build(), Method::GET, "/a");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/a/");
    }

    #[test]
    fn default_middlewares_recover_from_panics() {
        let mut engine = Engine::with_default_middlewares();
        engine.get("/panic", |c: &mut Context| {
            c.string("partial");
            panic!("boom");
        });
        engine.get("/ok", |c: &mut Context| c.string("ok"));
        let app = engine.build();

        let response = request(&app, Method::GET, "/panic");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body().is_empty());

        assert_eq!(body(&request(&app, Method::GET, "/ok")), "ok");
    }

    #[test]
    fn app_is_shared_between_threads() {
        let mut engine = Engine::new();
        engine.get("/users/:id", |c: &mut Context| {
            let id = c.param("id").to_owned();
            c.string(id);
        });
        let app = engine.build();

        let handles = (0..4)
            .map(|i| {
                let app = app.clone();
                std::thread::spawn(move || body(&request(&app, Method::GET, &format!("/users/{i}"))))
            })
            .collect::<Vec<_>>();

        let bodies = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
        assert_eq!(bodies, vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn static_routes_on_engine() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();

        let mut engine = Engine::new();
        engine.static_file("/", dir.path().join("index.html"));
        engine.static_dir("/public", dir.path());
        let app = engine.build();

        assert_eq!(body(&request(&app, Method::GET, "/")), "<h1>home</h1>");
        assert_eq!(body(&request(&app, Method::GET, "/public/index.html")), "<h1>home</h1>");
        assert_eq!(body(&request(&app, Method::GET, "/public/")), "<h1>home</h1>");
    }

    #[test]
    fn any_on_engine() {
        let mut engine = Engine::new();
        engine.any("/echo", |c: &mut Context| {
            let method = c.method().to_string();
            c.string(method);
        });
        let app = engine.build();

        assert_eq!(body(&request(&app, Method::PATCH, "/echo")), "PATCH");
        assert_eq!(body(&request(&app, Method::DELETE, "/echo")), "DELETE");
    }

    #[test]
    fn try_handle_reports_conflicts() {
        let mut engine = Engine::new();
        engine.get("/files/*path", |c: &mut Context| c.string("file"));

        let err = engine.try_handle(Method::GET, "/files/readme", |c: &mut Context| c.string("readme")).unwrap_err();
        assert_eq!(err.to_string(), "/files/readme conflicts with existing pattern /files/*path");
    }

    #[test]
    #[should_panic(expected = "there must be at least one middleware")]
    fn empty_global_middleware_panics() {
        Engine::new().use_middleware(HandlerChain::new());
    }

    #[test]
    #[should_panic(expected = "too many handlers")]
    fn global_chain_limit() {
        let mut engine = Engine::new();
        for _ in 0..crate::MAX_HANDLERS {
            engine.use_middleware(|c: &mut Context| c.next());
        }
    }
}
