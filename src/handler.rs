//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The route table holds handlers of *different* types in one `Vec`, and
//! filters wrap handlers they know nothing about. Both need a single type, so
//! every handler is erased to [`BoxedHandler`] (`Arc<dyn ErasedHandler>`) the
//! moment it is registered.
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                       ← stored as BoxedHandler
//!        ↓  filters.apply(boxed)                   ← each filter wraps it once
//! handler.call(req)  at request time               ← one vtable dispatch per layer
//!        ↓
//! Box::pin(async { hello(req).await.into_outcome() })
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::error::{Error, panic_message};
use crate::request::Request;
use crate::response::{IntoOutcome, Outcome};

/// A heap-allocated, type-erased future that resolves to an [`Outcome`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// Object-safe dispatch interface behind [`BoxedHandler`].
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure returning a future) with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoOutcome
/// ```
///
/// `IntoOutcome` covers plain responses as well as `Result<impl IntoResponse,
/// impl Into<Error>>`, so a handler can fail with `?`.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Erases any [`Handler`]. Filters use this to build the handler they return.
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    handler.into_boxed_handler()
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

/// Runs `handler` and turns a panic, whether raised while building the future
/// or while polling it, into [`Error::Panic`].
pub(crate) async fn call_guarded(handler: &BoxedHandler, req: Request) -> Outcome {
    let handler = Arc::clone(handler);
    let run = async move { handler.call(req).await };
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(Error::Panic(panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    #[tokio::test]
    async fn plain_and_fallible_handlers_erase_to_the_same_type() {
        let plain = boxed(|_req: Request| async { Response::text("ok") });
        let failing = boxed(|_req: Request| async {
            Err::<Response, _>(Error::BadRequest("nope".into()))
        });

        let ok = plain.call(Request::builder().build()).await.unwrap();
        assert_eq!(ok.body_text(), "ok");
        assert!(failing.call(Request::builder().build()).await.is_err());
    }

    #[tokio::test]
    async fn guarded_call_catches_panics() {
        let h = boxed(|_req: Request| async {
            if true {
                panic!("kaboom");
            }
            Response::text("unreachable")
        });
        match call_guarded(&h, Request::builder().build()).await {
            Err(Error::Panic(msg)) => assert_eq!(msg, "kaboom"),
            other => panic!("expected panic error, got {other:?}"),
        }
    }
}
