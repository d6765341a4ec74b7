//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is a value: filters never mutate one in place, they take it
//! and hand back a copy with an extra header via [`Response::with_header`].

use bytes::Bytes;
use http::StatusCode;

use crate::error::{Error, ErrorBody};

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug)]
pub enum ContentType {
    Csv,          // text/csv
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Pdf,          // application/pdf
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// Response payload. A binary response carries bytes and no text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Bytes),
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use switchyard::Response;
/// use http::StatusCode;
///
/// Response::json(r#"{"id":1}"#);
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(r#"{"id":42}"#);
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    body: Body,
    content_type: String,
    headers: Vec<(String, String)>,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: impl Into<String>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK` with a binary body.
    pub fn bytes(content_type: ContentType, body: impl Into<Bytes>) -> Self {
        Self::builder().bytes(content_type, body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    /// Structured JSON error: `{"message": ..., "code": ...}`.
    pub fn error(status: StatusCode, message: impl Into<String>, code: &str) -> Self {
        let body = ErrorBody { message: message.into(), code: code.to_owned() };
        // Two string fields cannot fail to serialise.
        let json = serde_json::to_string(&body).unwrap_or_default();
        Self::builder().status(status).json(json)
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    /// Returns a copy carrying `name: value`, replacing any header of the
    /// same name (compared case-insensitively).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &Body { &self.body }
    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Text body, or `""` for binary responses.
    pub fn body_text(&self) -> &str {
        match &self.body {
            Body::Text(s) => s,
            Body::Binary(_) => "",
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the `http` crate's response type for the transport.
    pub(crate) fn into_http(self) -> http::Response<http_body_util::Full<Bytes>> {
        let body = match self.body {
            Body::Binary(b) => b,
            Body::Text(s) => Bytes::from(s),
        };
        let mut builder = http::Response::builder().status(self.status);
        if !self.content_type.is_empty() {
            builder = builder.header(http::header::CONTENT_TYPE, &self.content_type);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(http_body_util::Full::new(body))
            .unwrap_or_else(|_| {
                let mut res = http::Response::new(http_body_util::Full::new(Bytes::new()));
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                res
            })
    }
}

impl From<StatusCode> for Response {
    fn from(code: StatusCode) -> Self {
        Response::builder().status(code).no_body()
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method — you always know what you're sending.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Json.as_str(), Body::Text(body.into()))
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text.as_str(), Body::Text(body.into()))
    }

    /// Terminate with a binary body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type.as_str(), Body::Binary(body.into()))
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        self.finish("", Body::Text(String::new()))
    }

    fn finish(self, content_type: &str, body: Body) -> Response {
        Response {
            status: self.status,
            body,
            content_type: content_type.to_owned(),
            headers: self.headers,
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::from(self) }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a handler produces once erased: a response, or a failure that a
/// filter or the dispatcher will translate.
pub type Outcome = Result<Response, Error>;

/// Conversion of a handler's return value into an [`Outcome`].
///
/// Implemented for every [`IntoResponse`] type in this crate and for
/// `Result<T, E>` where `T: IntoResponse` and `E: Into<Error>`, so handlers can
/// use `?` freely.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl<T: IntoResponse, E: Into<Error>> IntoOutcome for Result<T, E> {
    fn into_outcome(self) -> Outcome {
        self.map(IntoResponse::into_response).map_err(Into::into)
    }
}

macro_rules! infallible_outcome {
    ($($ty:ty),* $(,)?) => {
        $(impl IntoOutcome for $ty {
            fn into_outcome(self) -> Outcome { Ok(self.into_response()) }
        })*
    };
}

infallible_outcome!(Response, &'static str, String, StatusCode);
