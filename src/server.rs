//! HTTP transport and graceful shutdown.
//!
//! The server owns everything the router does not: sockets, HTTP/1 and
//! HTTP/2 framing (hyper), body buffering and the conversion between wire
//! messages and [`Request`]/[`Response`] values.
//!
//! On SIGTERM or Ctrl-C it stops accepting, lets in-flight connections finish,
//! then returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, MethodOverride};
use crate::error::{Error, internal_error};
use crate::middleware::{BoxedFilter, Filter};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    method_override: Option<String>,
    filters: Vec<BoxedFilter>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called. Method overrides use the default `X-HTTP-Method-Override`.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self {
            addr,
            method_override: ServerConfig::default().method_override_header,
            filters: Vec::new(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, Error> {
        Ok(Self {
            addr: config.bind_addr()?,
            method_override: config.method_override_header.clone(),
            filters: Vec::new(),
        })
    }

    /// Adds an application filter around the dispatcher. Unlike route
    /// filters it also sees requests that match no route, which is where a
    /// [`Cors`](crate::middleware::Cors) filter answers preflights.
    pub fn filter(mut self, filter: impl Filter) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Builds `router` and serves it until a shutdown signal arrives and
    /// every in-flight connection has finished.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let dispatcher = Dispatcher::new(router.build()).with_filters(self.filters);
        let entry = Arc::new(match self.method_override {
            Some(header) => Entry::Override(dispatcher.with_method_override(header)),
            None => Entry::Plain(dispatcher),
        });

        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "switchyard listening");

        let mut tasks = tokio::task::JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting immediately.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let entry = Arc::clone(&entry);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let entry = Arc::clone(&entry);
                            async move { serve_one(entry, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("switchyard stopped");
        Ok(())
    }
}

enum Entry {
    Plain(Dispatcher),
    Override(MethodOverride),
}

impl Entry {
    async fn handle(&self, req: Request) -> Result<Response, Error> {
        match self {
            Self::Plain(d) => d.handle(req).await,
            Self::Override(d) => d.handle(req).await,
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one exchange, dispatches it exactly once and never fails towards
/// hyper: unknown methods become 405, anything else that escapes becomes 500.
async fn serve_one(
    entry: Arc<Entry>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let request = match into_request(req, remote_addr).await {
        Ok(r) => r,
        Err(e) => {
            error!(peer = %remote_addr, error = %e, "failed to read request body");
            return Ok(Response::error(StatusCode::BAD_REQUEST, e.to_string(), "BAD_REQUEST").into_http());
        }
    };

    let response = match AssertUnwindSafe(entry.handle(request)).catch_unwind().await {
        Ok(Ok(res)) => res,
        Ok(Err(Error::UnknownMethod(method))) => Response::error(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method not allowed: {method}"),
            "METHOD_NOT_ALLOWED",
        ),
        Ok(Err(e)) => {
            error!(error = %e, "dispatcher failed");
            e.to_internal_response()
        }
        Err(_) => {
            error!("dispatcher panicked");
            internal_error("dispatcher panicked")
        }
    };

    Ok(response.into_http())
}

/// Buffers the body and copies method, URI, path, query, headers and peer
/// address into a [`Request`]. Non-UTF-8 header values are dropped; a
/// non-UTF-8 body is decoded lossily.
async fn into_request(req: hyper::Request<Incoming>, remote_addr: SocketAddr) -> Result<Request, Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await.map_err(Error::other)?.to_bytes();

    let mut builder = Request::builder()
        .method(parts.method.as_str())
        .uri(parts.uri.to_string())
        .path(parts.uri.path())
        .body(String::from_utf8_lossy(&body).into_owned())
        .remote_addr(remote_addr);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            builder = builder.header(name.as_str(), value);
        }
    }
    Ok(builder.build())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM or SIGINT (Ctrl-C); Ctrl-C only off Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
