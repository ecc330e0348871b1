//! The per request context handed to every handler of a chain.
//!
//! A [`Context`] owns the request, the ordered handler chain with its cursor, the captured path
//! parameters and the buffered response. Handlers read from the request side, write to the
//! response side and drive the chain with [`Context::next`] and [`Context::abort`].
//!
//! The response is buffered: status, headers and body are collected while the chain runs and
//! turned into an [`http::Response`] once it returns, so a later [`Context::set_status`] wins over
//! an earlier one.

use crate::handler::HandlerFunc;
use bytes::{Bytes, BytesMut};
use cookie::Cookie;
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use lattice_tree::Params;
use mime::Mime;
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, warn};

/// Cursor value marking an aborted chain, far past any chain length the router accepts.
const ABORT_INDEX: usize = usize::MAX / 2;

const PLAIN_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const FORM_ESSENCE: &str = "application/x-www-form-urlencoded";

pub struct Context {
    request: Request<Bytes>,
    remote_addr: Option<SocketAddr>,
    forwarded_by_client_ip: bool,
    params: Params,

    handlers: Vec<HandlerFunc>,
    index: usize,

    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    error_message: String,
}

impl Context {
    /// Creates a context for `request` with an empty chain and a `200 OK` response.
    pub fn new(request: Request<Bytes>, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            request,
            remote_addr,
            forwarded_by_client_ip: false,
            params: Params::new(),
            handlers: Vec::new(),
            index: 0,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            error_message: String::new(),
        }
    }

    pub(crate) fn set_forwarded_by_client_ip(&mut self, forwarded_by_client_ip: bool) {
        self.forwarded_by_client_ip = forwarded_by_client_ip;
    }

    pub(crate) fn extend_handlers(&mut self, handlers: impl IntoIterator<Item = HandlerFunc>) {
        self.handlers.extend(handlers);
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    // chain

    /// Runs the pending handlers of the chain.
    ///
    /// Should be called from middlewares: code before the call runs on the way in, code after it
    /// on the way out. Calling it when the chain is exhausted or aborted does nothing.
    pub fn next(&mut self) {
        while self.index < self.handlers.len() {
            let handler = Arc::clone(&self.handlers[self.index]);
            self.index += 1;
            handler.handle(self);
        }
    }

    /// Prevents pending handlers from being called.
    ///
    /// The current handler keeps running, return from it to stop it as well. Handlers that already
    /// called [`Context::next`] still run their code after that call.
    pub fn abort(&mut self) {
        self.index = ABORT_INDEX;
    }

    /// Sets the response status and aborts the chain.
    pub fn abort_with_status(&mut self, status: StatusCode) {
        self.set_status(status);
        self.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.index >= ABORT_INDEX
    }

    // request

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    /// The path of the request uri, without the query string.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Returns the first value of request header `key`, if it is present and visible ASCII.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.request.headers().get(key).and_then(|value| value.to_str().ok())
    }

    /// The raw request body.
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns the path parameter `name`, or an empty string when the route did not capture it.
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).unwrap_or_default()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the first value of query parameter `key`.
    ///
    /// ```text
    /// GET /path?name=zava&age=23
    ///     c.query("name") == Some("zava")
    ///     c.query("sex") == None
    /// ```
    pub fn query(&self, key: &str) -> Option<String> {
        let pairs = self.request.uri().query().map(parse_pairs).unwrap_or_default();
        first_value(pairs, key)
    }

    /// Like [`Context::query`], falling back to `default` when the key is absent or empty.
    pub fn default_query(&self, key: &str, default: &str) -> String {
        self.query(key).filter(|value| !value.is_empty()).unwrap_or_else(|| default.to_owned())
    }

    /// Returns the first value of `key` from an `application/x-www-form-urlencoded` body.
    pub fn post_form(&self, key: &str) -> Option<String> {
        let is_form = self.mime_type().is_some_and(|content_type| content_type.essence_str() == FORM_ESSENCE);
        if !is_form {
            return None;
        }

        let pairs = serde_urlencoded::from_bytes(self.request.body()).unwrap_or_default();
        first_value(pairs, key)
    }

    /// Like [`Context::post_form`], falling back to `default` when the key is absent or empty.
    pub fn default_post_form(&self, key: &str, default: &str) -> String {
        self.post_form(key).filter(|value| !value.is_empty()).unwrap_or_else(|| default.to_owned())
    }

    /// The raw `Content-Type` request header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// The parsed `Content-Type` request header.
    pub fn mime_type(&self) -> Option<Mime> {
        self.content_type().and_then(|content_type| content_type.parse().ok())
    }

    /// Returns the percent decoded value of request cookie `name`.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.request
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse_encoded)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_owned())
    }

    /// Best effort client address.
    ///
    /// When the engine is configured with `forwarded_by_client_ip`, `X-Real-Ip` and then the first
    /// entry of `X-Forwarded-For` are used, as set by reverse proxies such as nginx. Otherwise, or
    /// when both are missing, the peer address of the connection. Empty if nothing is known.
    pub fn client_ip(&self) -> String {
        if self.forwarded_by_client_ip {
            if let Some(ip) = self.header("X-Real-Ip").map(str::trim).filter(|ip| !ip.is_empty()) {
                return ip.to_owned();
            }

            let forwarded = self.header("X-Forwarded-For").and_then(|value| value.split(',').next());
            if let Some(ip) = forwarded.map(str::trim).filter(|ip| !ip.is_empty()) {
                return ip.to_owned();
            }
        }

        self.remote_addr.map(|addr| addr.ip().to_string()).unwrap_or_default()
    }

    // response

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets response header `key`, an empty `value` removes it.
    pub fn set_header(&mut self, key: &str, value: &str) {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                warn!(cause = %e, key, "invalid response header name");
                return;
            }
        };

        if value.is_empty() {
            self.headers.remove(name);
            return;
        }

        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => warn!(cause = %e, key, "invalid response header value"),
        }
    }

    pub fn response_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|value| value.to_str().ok())
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Appends a `Set-Cookie` header, the value is percent encoded.
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) {
        match HeaderValue::from_str(&cookie.encoded().to_string()) {
            Ok(value) => {
                self.headers.append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(cause = %e, name = cookie.name(), "invalid cookie"),
        }
    }

    /// Appends raw bytes to the response body.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    /// Writes `body` as `text/plain`.
    pub fn string(&mut self, body: impl AsRef<str>) {
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PLAIN_CONTENT_TYPE));
        self.write(body.as_ref());
    }

    /// Serializes `data` as the `application/json` response body, followed by a newline.
    ///
    /// A value that fails to serialize turns the response into a `500` and is logged.
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) {
        match serde_json::to_vec(data) {
            Ok(json) => {
                self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                self.write(json);
                self.write(b"\n");
            }
            Err(e) => {
                error!(cause = %e, "failed to render json");
                self.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                self.error(e.to_string());
            }
        }
    }

    /// Writes already rendered markup as `text/html`.
    pub fn html(&mut self, markup: impl AsRef<str>) {
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        self.write(markup.as_ref());
    }

    /// Writes `data` with an explicit content type.
    pub fn data(&mut self, content_type: &str, data: impl AsRef<[u8]>) {
        self.set_header(header::CONTENT_TYPE.as_str(), content_type);
        self.write(data);
    }

    /// Redirects to `location` with `302 Found`.
    pub fn redirect(&mut self, location: &str) {
        self.redirect_with_status(StatusCode::FOUND, location);
    }

    pub(crate) fn redirect_with_status(&mut self, status: StatusCode, location: &str) {
        self.set_header(header::LOCATION.as_str(), location);
        self.set_status(status);
    }

    /// Records an error message for this request, reported by the logger middleware.
    pub fn error(&mut self, message: impl Into<String>) {
        self.error_message = message.into();
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn response_body(&self) -> &[u8] {
        &self.body
    }

    /// Drops everything written to the response so far.
    pub(crate) fn reset_response(&mut self) {
        self.headers.clear();
        self.body.clear();
        self.status = StatusCode::OK;
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("params", &self.params)
            .field("handlers", &self.handlers.len())
            .field("index", &self.index)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(raw).unwrap_or_default()
}

fn first_value(pairs: Vec<(String, String)>, key: &str) -> Option<String> {
    pairs.into_iter().find(|(k, _)| k == key).map(|(_, value)| value)
}
