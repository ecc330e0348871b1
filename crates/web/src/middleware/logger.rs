use crate::{Context, Handler};
use std::time::Instant;
use tracing::info;

/// Logs one line per request once the rest of the chain has run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

pub fn logger() -> Logger {
    Logger
}

impl Handler for Logger {
    fn handle(&self, c: &mut Context) {
        let start = Instant::now();
        let method = c.method().clone();
        let path = c.uri().path_and_query().map_or_else(|| c.path().to_owned(), |p| p.as_str().to_owned());

        c.next();

        info!(
            status = c.status().as_u16(),
            latency = ?start.elapsed(),
            client_ip = %c.client_ip(),
            method = %method,
            path = %path,
            error = %c.error_message(),
            "request finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::logger;
    use crate::middleware::capture_logs;
    use crate::{Context, Engine};
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use std::net::SocketAddr;

    #[test]
    fn logs_matched_and_unmatched_requests() {
        let mut engine = Engine::new();
        engine.use_middleware(logger());
        engine.get("/users/:id", |c: &mut Context| {
            c.set_status(StatusCode::CREATED);
            c.error("quota exceeded");
        });
        let app = engine.build();
        let remote = Some(SocketAddr::from(([10, 0, 0, 1], 5000)));

        let ((), logs) = capture_logs(|| {
            app.serve(Request::get("/users/1?verbose=true").body(Bytes::new()).unwrap(), remote);
            app.serve(Request::post("/missing").body(Bytes::new()).unwrap(), remote);
        });

        let lines = logs.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);

        assert!(lines[0].contains("request finished"));
        assert!(lines[0].contains("status=201"));
        assert!(lines[0].contains("client_ip=10.0.0.1"));
        assert!(lines[0].contains("method=GET"));
        assert!(lines[0].contains("path=/users/1?verbose=true"));
        assert!(lines[0].contains("error=quota exceeded"));

        assert!(lines[1].contains("status=404"));
        assert!(lines[1].contains("method=POST"));
        assert!(lines[1].contains("path=/missing"));
    }
}
