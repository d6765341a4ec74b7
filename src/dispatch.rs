//! Request dispatch: route lookup, parameter injection and the final failure
//! boundary.
//!
//! ```text
//! Request ─▶ application filters ─▶ parse method ─▶ strip "?…" ─▶ RouteTable::lookup
//!                                                         │ miss            │ hit
//!                                                         ▼                 ▼
//!                                               404 ROUTE_NOT_FOUND   with_path_params ─▶ filtered handler
//!                                                                                            │ Err / panic
//!                                                                                            ▼
//!                                                                                    500 INTERNAL_ERROR
//! ```
//!
//! Route filters only run once a route has matched. Filters added with
//! [`Dispatcher::filter`] wrap the lookup itself, so they also see requests
//! that match nothing, such as a CORS preflight for a path that only has a
//! `POST` route.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error};

use crate::error::{Error, ErrorKind};
use crate::handler::{BoxedHandler, boxed, call_guarded};
use crate::method::Method;
use crate::middleware::{BoxedFilter, Filter, FilterChain};
use crate::request::Request;
use crate::response::{Outcome, Response};
use crate::router::RouteTable;

/// Routes requests through an immutable [`RouteTable`].
///
/// Cheap to clone; every clone shares the same table.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    filters: FilterChain,
    params_as_bad_request: bool,
    entry: BoxedHandler,
}

impl Dispatcher {
    pub fn new(table: RouteTable) -> Self {
        Self::assemble(Arc::new(table), FilterChain::new(), false)
    }

    fn assemble(table: Arc<RouteTable>, filters: FilterChain, params_as_bad_request: bool) -> Self {
        let lookup = {
            let table = Arc::clone(&table);
            boxed(move |req: Request| {
                let table = Arc::clone(&table);
                async move { route(&table, req, params_as_bad_request).await }
            })
        };
        let entry = filters.apply(lookup);
        Self { table, filters, params_as_bad_request, entry }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Wraps the whole application, route lookup included. The first filter
    /// added is outermost, and every application filter runs outside the
    /// route filters.
    pub fn filter(self, filter: impl Filter) -> Self {
        self.with_filters([Arc::new(filter) as BoxedFilter])
    }

    pub(crate) fn with_filters(self, extra: impl IntoIterator<Item = BoxedFilter>) -> Self {
        let mut filters = self.filters;
        filters.extend(extra);
        Self::assemble(self.table, filters, self.params_as_bad_request)
    }

    /// Handles one request.
    ///
    /// The only `Err` is [`Error::UnknownMethod`]; every other failure is
    /// already a 500 response by the time this returns.
    pub async fn handle(&self, req: Request) -> Result<Response, Error> {
        match call_guarded(&self.entry, req).await {
            Ok(res) => Ok(res),
            Err(Error::UnknownMethod(method)) => Err(Error::UnknownMethod(method)),
            Err(e) => {
                error!(error = %e, "application filter failed");
                Ok(e.to_internal_response())
            }
        }
    }

    /// Wraps this dispatcher with method-override support.
    pub fn with_method_override(self, header: impl Into<String>) -> MethodOverride {
        MethodOverride {
            inner: Self::assemble(self.table, self.filters, true),
            header: header.into(),
        }
    }
}

async fn route(table: &RouteTable, req: Request, params_as_bad_request: bool) -> Outcome {
    let method: Method = req.method().parse()?;
    let path = strip_query(req.path()).to_owned();

    let Some(matched) = table.lookup(method, &path) else {
        debug!(%method, %path, "no route");
        return Ok(Response::error(
            StatusCode::NOT_FOUND,
            format!("Route not found: {method} {path}"),
            "ROUTE_NOT_FOUND",
        ));
    };

    let req = req.with_path_params(matched.params);
    let outcome = call_guarded(matched.route.handler(), req).await;
    Ok(outcome.unwrap_or_else(|e| {
        if params_as_bad_request && e.kind() == ErrorKind::PathParam {
            debug!(%method, %path, error = %e, "bad path parameter");
            return Response::error(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_PATH_PARAMETER");
        }
        error!(%method, %path, error = %e, "handler failed");
        e.to_internal_response()
    }))
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(p, _)| p)
}

/// A [`Dispatcher`] that honours a method-override header on `POST`
/// requests and answers path parameter failures with 400 instead of 500.
///
/// Only `POST` can be overridden, so a plain `GET` never reaches a
/// `DELETE` route.
#[derive(Clone)]
pub struct MethodOverride {
    inner: Dispatcher,
    header: String,
}

impl MethodOverride {
    pub async fn handle(&self, mut req: Request) -> Result<Response, Error> {
        if req.method.eq_ignore_ascii_case("POST") {
            let requested = req.header(&self.header).map(|m| m.trim().to_ascii_uppercase());
            if let Some(method) = requested.filter(|m| !m.is_empty() && *m != req.method) {
                debug!(from = %req.method, to = %method, "method override");
                req.method = method;
            }
        }
        self.inner.handle(req).await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner
    }
}
