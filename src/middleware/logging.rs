//! Per-request structured logging.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::handler::{BoxedHandler, boxed};
use crate::middleware::Filter;
use crate::request::Request;

/// Emits one event when a request enters and one when it leaves, with status
/// and latency. Failures are logged and passed on untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logging;

impl Filter for Logging {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                let method = req.method().to_owned();
                let path = req.path().to_owned();
                let started = Instant::now();
                info!(%method, %path, "request started");

                let outcome = next.call(req).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match &outcome {
                    Ok(res) => info!(
                        %method,
                        %path,
                        status = res.status_code().as_u16(),
                        elapsed_ms,
                        "request finished"
                    ),
                    Err(e) => warn!(%method, %path, elapsed_ms, error = %e, "request failed"),
                }
                outcome
            }
        })
    }
}
