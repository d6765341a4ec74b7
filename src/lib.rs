//! # switchyard
//!
//! A small routing and filter layer for HTTP services. It is a DSL over a
//! transport, not a framework: hyper handles the wire, switchyard decides which
//! handler runs and what wraps it.
//!
//! - Segment routing: literals, `{name}` parameters, trailing `{*rest}`
//!   wildcards. Routes are scanned in registration order, first match wins.
//! - Filters: handler-to-handler transforms folded around each route at
//!   registration, or around the whole dispatcher with
//!   [`Dispatcher::filter`] / [`Server::filter`]. CORS, logging, error
//!   handling, correlation ids and bearer auth ship in [`middleware`].
//! - Typed routes: JSON in, JSON out, with type shapes recorded for
//!   documentation generators.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use switchyard::{Error, Request, Response, Router, Server};
//! use switchyard::middleware::{CorrelationId, ErrorHandling, Logging};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .filter(Logging)
//!         .filter(CorrelationId::default())
//!         .filter(ErrorHandling)
//!         .get("/users/{id}", get_user)
//!         .get("/files/{*path}", get_file);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Result<Response, Error> {
//!     let id: u64 = req.param_as("id")?;
//!     Ok(Response::json(format!(r#"{{"id":{id}}}"#)))
//! }
//!
//! async fn get_file(req: Request) -> Response {
//!     Response::text(req.param("path").unwrap_or_default().to_owned())
//! }
//! ```

mod dispatch;
mod error;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod handler;
pub mod json;
pub mod matcher;
pub mod middleware;
pub mod typed;

pub use http::StatusCode;

pub use dispatch::{Dispatcher, MethodOverride};
pub use error::{Error, ErrorBody, ErrorKind, PathParamError};
pub use handler::{BoxedHandler, Handler};
pub use json::Json;
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::{Body, ContentType, IntoOutcome, IntoResponse, Outcome, Response, ResponseBuilder};
pub use router::{MatchResult, Route, RouteTable, Router};
pub use server::Server;
