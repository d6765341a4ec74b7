//! Incoming HTTP request type.
//!
//! Header names are lowercased on the way in, so every lookup is
//! case-insensitive. Path parameters start empty and are filled in by the
//! dispatcher after a route matches.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{Error, PathParamError};

/// An incoming HTTP request with a fully buffered body.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: String,
    uri: String,
    path: String,
    query: HashMap<String, String>,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: String,
    remote_addr: Option<SocketAddr>,
    correlation_id: Option<String>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn uri(&self) -> &str { &self.uri }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &str { &self.body }
    pub fn headers(&self) -> &HashMap<String, String> { &self.headers }
    pub fn query_params(&self) -> &HashMap<String, String> { &self.query }
    pub fn path_params(&self) -> &HashMap<String, String> { &self.params }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }
    pub fn correlation_id(&self) -> Option<&str> { self.correlation_id.as_deref() }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Deserialises the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn require_param(&self, key: &str) -> Result<&str, PathParamError> {
        self.param(key).ok_or_else(|| PathParamError::Missing(key.to_owned()))
    }

    /// Parses a path parameter, e.g. `req.param_as::<i64>("id")`.
    pub fn param_as<T: FromStr>(&self, key: &str) -> Result<T, PathParamError> {
        let raw = self.require_param(key)?;
        raw.parse().map_err(|_| PathParamError::Invalid {
            name: key.to_owned(),
            value: raw.to_owned(),
        })
    }

    pub fn param_uuid(&self, key: &str) -> Result<Uuid, PathParamError> {
        self.param_as(key)
    }

    /// Like [`param_as`](Request::param_as) but absent or malformed values
    /// come back as `None`.
    pub fn param_opt_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.param(key)?.parse().ok()
    }

    pub fn param_uuid_opt(&self, key: &str) -> Option<Uuid> {
        self.param_opt_as(key)
    }

    pub(crate) fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Returns a copy carrying `id` as its correlation identifier.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// Builder for [`Request`]; used by the transport and by tests.
///
/// ```rust
/// use switchyard::Request;
///
/// let req = Request::builder()
///     .method("GET")
///     .uri("/users/42?verbose=1")
///     .header("Accept", "application/json")
///     .build();
/// assert_eq!(req.query("verbose"), Some("1"));
/// assert_eq!(req.header("accept"), Some("application/json"));
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    method: String,
    uri: String,
    path: Option<String>,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: String,
    remote_addr: Option<SocketAddr>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: "GET".to_owned(),
            uri: "/".to_owned(),
            path: None,
            query: HashMap::new(),
            headers: HashMap::new(),
            body: String::new(),
            remote_addr: None,
        }
    }
}

impl RequestBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets the full request URI and parses its query string. Unless
    /// [`path`](RequestBuilder::path) is called, the path is the URI verbatim;
    /// the dispatcher strips the query part before matching.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        if let Some((_, raw)) = self.uri.split_once('?') {
            self.query = parse_query(raw);
        }
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a header; names are stored lowercased, a repeated name keeps the last value.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn build(self) -> Request {
        let path = self.path.unwrap_or_else(|| self.uri.clone());
        Request {
            method: self.method,
            uri: self.uri,
            path,
            query: self.query,
            params: HashMap::new(),
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
            correlation_id: None,
        }
    }
}

/// Parses `a=1&b=2` into a map. Duplicate keys keep the last value.
pub(crate) fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}
