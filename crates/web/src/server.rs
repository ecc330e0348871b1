use crate::{App, ServerBuildError, ServerError};
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub struct ServerBuilder {
    app: Option<App>,
    address: Option<Result<Vec<SocketAddr>, ServerBuildError>>,
    max_log_level: Level,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { app: None, address: None, max_log_level: Level::INFO }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(
            address.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>()).map_err(ServerBuildError::from),
        );
        self
    }

    pub fn app(mut self, app: App) -> Self {
        self.app = Some(app);
        self
    }

    /// The most verbose level printed by the subscriber installed in [`Server::start`].
    pub fn max_log_level(mut self, level: Level) -> Self {
        self.max_log_level = level;
        self
    }

    /// # Errors
    ///
    /// Fails when the app or the address is missing, or when the address did not resolve.
    pub fn build(self) -> Result<Server, ServerBuildError> {
        let app = self.app.ok_or(ServerBuildError::MissingApp)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)??;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }
        Ok(Server { app, address, max_log_level: self.max_log_level })
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("app", &self.app)
            .field("address", &self.address.as_ref().map(|a| a.as_ref().ok()))
            .field("max_log_level", &self.max_log_level)
            .finish()
    }
}

/// Serves an [`App`] over HTTP/1.1.
///
/// Request bodies are collected before the chain runs, the chain itself runs on the blocking
/// thread pool so handlers are free to do synchronous work.
#[derive(Debug)]
pub struct Server {
    app: App,
    address: Vec<SocketAddr>,
    max_log_level: Level,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    /// Binds the address and serves connections until the process stops.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener can not be bound.
    pub async fn start(self) -> Result<(), ServerError> {
        let subscriber = FmtSubscriber::builder().with_max_level(self.max_log_level).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            warn!(cause = %e, "global subscriber already set");
        }

        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return Err(ServerError::bind(e));
            }
        };

        self.serve(tcp_listener).await;
        Ok(())
    }

    /// Accepts connections from an already bound listener.
    pub async fn serve(self, tcp_listener: TcpListener) {
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let app = self.app.clone();

            tokio::spawn(async move {
                let service = service_fn(move |request| handle(app.clone(), request, remote_addr));
                match http1::Builder::new().serve_connection(TokioIo::new(tcp_stream), service).await {
                    Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(cause = %e, %remote_addr, "service has error, connection shutdown"),
                }
            });
        }
    }
}

async fn handle(
    app: App,
    request: Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(cause = %e, "failed to read request body");
            return Ok(status_response(StatusCode::BAD_REQUEST));
        }
    };

    let request = Request::from_parts(parts, body);
    match tokio::task::spawn_blocking(move || app.serve(request, Some(remote_addr))).await {
        Ok(response) => Ok(response.map(Full::new)),
        Err(e) => {
            error!(cause = %e, "request handling task failed");
            Ok(status_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
