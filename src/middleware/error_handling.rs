//! Failure boundary as a filter.
//!
//! Where this sits in the chain decides what the filters around it see:
//! outer filters observe the translated 500, inner ones the raw failure.
//!
//! Two kinds are left for the dispatcher to answer and pass through
//! untouched: path parameter failures (400 behind a
//! [`MethodOverride`](crate::MethodOverride), 500 otherwise) and unknown
//! methods (405 at the transport).

use std::sync::Arc;

use tracing::error;

use crate::error::ErrorKind;
use crate::handler::{BoxedHandler, boxed, call_guarded};
use crate::middleware::Filter;
use crate::request::Request;

/// Converts any failure or panic from the wrapped handler into
/// `500 {"message": "Internal server error: …", "code": "INTERNAL_ERROR"}`,
/// except path parameter failures and unknown methods.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorHandling;

impl Filter for ErrorHandling {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                match call_guarded(&next, req).await {
                    Ok(res) => Ok(res),
                    Err(e) if passes_through(e.kind()) => Err(e),
                    Err(e) => {
                        error!(error = %e, "handler failed");
                        Ok(e.to_internal_response())
                    }
                }
            }
        })
    }
}

fn passes_through(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::PathParam | ErrorKind::UnknownMethod)
}
