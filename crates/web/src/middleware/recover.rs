use crate::{Context, Handler};
use http::StatusCode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Turns a panic in the rest of the chain into an empty `500` response.
///
/// Whatever the panicking handlers wrote is discarded and the chain is aborted, the middlewares
/// before this one still see the request complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

pub fn recover() -> Recover {
    Recover
}

impl Handler for Recover {
    fn handle(&self, c: &mut Context) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| c.next())) {
            error!(
                cause = panic_message(payload.as_ref()),
                method = %c.method(),
                path = %c.path(),
                "handler panicked"
            );
            c.reset_response();
            c.abort_with_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
