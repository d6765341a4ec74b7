//! Cross-origin resource sharing.
//!
//! Preflight (`OPTIONS`) requests never reach the wrapped handler. Any other
//! request runs normally and picks up the origin headers on the way out.
//!
//! An `Origin` outside a non-wildcard allow-list gets no CORS headers at all,
//! which the browser treats as a refusal.

use std::sync::Arc;

use http::StatusCode;

use crate::config::CorsConfig;
use crate::handler::{BoxedHandler, boxed};
use crate::middleware::Filter;
use crate::request::Request;
use crate::response::Response;

const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
const MAX_AGE: &str = "Access-Control-Max-Age";

#[derive(Clone, Debug, Default)]
pub struct Cors {
    config: Arc<CorsConfig>,
}

impl Cors {
    pub fn new(config: CorsConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    /// Restricts responses to the listed origins.
    pub fn allow_origins<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CorsConfig {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
            ..CorsConfig::default()
        })
    }
}

impl Filter for Cors {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let config = Arc::clone(&self.config);
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            let config = Arc::clone(&config);
            async move {
                let origin = allowed_origin(&config, &req);
                if req.method() == "OPTIONS" {
                    return Ok(preflight(&config, origin));
                }
                let res = next.call(req).await?;
                Ok::<_, crate::Error>(with_origin(&config, res, origin))
            }
        })
    }
}

fn allowed_origin(config: &CorsConfig, req: &Request) -> Option<String> {
    if config.is_wildcard() {
        return Some("*".to_owned());
    }
    req.header("origin")
        .filter(|o| config.allowed_origins.iter().any(|a| a.as_str() == *o))
        .map(str::to_owned)
}

fn preflight(config: &CorsConfig, origin: Option<String>) -> Response {
    let res = Response::status(StatusCode::OK)
        .with_header(ALLOW_METHODS, config.allowed_methods.join(", "))
        .with_header(ALLOW_HEADERS, config.allowed_headers.join(", "))
        .with_header(MAX_AGE, config.max_age_secs.to_string());
    with_origin(config, res, origin)
}

fn with_origin(config: &CorsConfig, res: Response, origin: Option<String>) -> Response {
    match origin {
        Some(origin) => res
            .with_header(ALLOW_ORIGIN, origin)
            .with_header(ALLOW_CREDENTIALS, config.allow_credentials.to_string()),
        None => res,
    }
}
