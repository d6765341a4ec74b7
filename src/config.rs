//! Declarative configuration.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! bind = "0.0.0.0:8080"
//! method_override_header = "X-HTTP-Method-Override"
//!
//! [cors]
//! allowed_origins = ["http://localhost:3000"]
//! allow_credentials = true
//!
//! [correlation]
//! response_header = "X-Correlation-ID"
//! ```

use std::net::SocketAddr;

use serde::Deserialize;

use crate::error::Error;

/// Top-level configuration for a [`Server`](crate::Server).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Header that may override the method of a `POST` request; other
    /// methods are never overridden. On by default with
    /// `X-HTTP-Method-Override`; `None` disables overrides.
    pub method_override_header: Option<String>,
    pub cors: CorsConfig,
    pub correlation: CorrelationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_owned(),
            method_override_header: Some("X-HTTP-Method-Override".to_owned()),
            cors: CorsConfig::default(),
            correlation: CorrelationConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, Error> {
        self.bind
            .parse()
            .map_err(|_| Error::Config(format!("invalid bind address `{}`", self.bind)))
    }
}

/// Settings for the [`Cors`](crate::middleware::Cors) filter.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    /// Empty, or containing `"*"`, means any origin.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_owned()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: ["Content-Type", "Authorization", "X-Correlation-ID"]
                .map(String::from)
                .to_vec(),
            allow_credentials: false,
            max_age_secs: 86_400,
        }
    }
}

impl CorsConfig {
    pub fn is_wildcard(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Settings for the [`CorrelationId`](crate::middleware::CorrelationId) filter.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Checked in order; the first one present wins.
    pub request_headers: Vec<String>,
    pub response_header: String,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            request_headers: ["X-Correlation-ID", "X-Request-ID", "X-Trace-ID"]
                .map(String::from)
                .to_vec(),
            response_header: "X-Correlation-ID".to_owned(),
        }
    }
}
