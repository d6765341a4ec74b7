//! Typed JSON routes.
//!
//! A typed route deserialises the request body into a `Req`, hands it to a
//! business function and serialises the returned `Res`:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use switchyard::{Error, Router};
//! use switchyard::typed::{Describe, TypeShape};
//!
//! #[derive(Deserialize)]
//! struct NewWidget { name: String }
//!
//! #[derive(Serialize)]
//! struct Widget { id: String, name: String }
//!
//! impl Describe for NewWidget {
//!     fn shape() -> TypeShape {
//!         TypeShape::object("NewWidget", [("name", TypeShape::String)])
//!     }
//! }
//!
//! impl Describe for Widget {
//!     fn shape() -> TypeShape {
//!         TypeShape::object("Widget", [("id", TypeShape::String), ("name", TypeShape::String)])
//!     }
//! }
//!
//! let router = Router::new().typed_post("/widgets", |w: NewWidget| async move {
//!     Ok::<_, Error>(Widget { id: "w-1".into(), name: w.name })
//! });
//! ```
//!
//! Every typed route also records its method, path and type shapes in the
//! router's [`TypedRouteRegistry`] when the route table is built. API
//! documentation generators read the registry; nothing on the request path
//! does.

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, boxed};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

// ── Type shapes ───────────────────────────────────────────────────────────────

/// A serialisable description of a payload type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeShape {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array { items: Box<TypeShape> },
    Optional { inner: Box<TypeShape> },
    Object { name: String, fields: Vec<FieldShape> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldShape {
    pub name: String,
    pub shape: TypeShape,
}

impl TypeShape {
    pub fn object<I, S>(name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeShape)>,
        S: Into<String>,
    {
        Self::Object {
            name: name.to_owned(),
            fields: fields
                .into_iter()
                .map(|(name, shape)| FieldShape { name: name.into(), shape })
                .collect(),
        }
    }

    pub fn array(items: TypeShape) -> Self {
        Self::Array { items: Box::new(items) }
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String)
    }
}

/// Supplies the [`TypeShape`] of a payload type.
pub trait Describe {
    fn shape() -> TypeShape;
}

macro_rules! describe_as {
    ($shape:expr => $($ty:ty),+) => {
        $(impl Describe for $ty {
            fn shape() -> TypeShape { $shape }
        })+
    };
}

describe_as!(TypeShape::Null => ());
describe_as!(TypeShape::Boolean => bool);
describe_as!(TypeShape::Integer => i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
describe_as!(TypeShape::Number => f32, f64);
describe_as!(TypeShape::String => String, uuid::Uuid);

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::array(T::shape())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::Optional { inner: Box::new(T::shape()) }
    }
}

impl Describe for Value {
    fn shape() -> TypeShape {
        TypeShape::object("Any", std::iter::empty::<(String, TypeShape)>())
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// What a typed route declared about itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypedRouteMetadata {
    pub method: Method,
    pub path: String,
    pub request: Option<TypeShape>,
    pub response: TypeShape,
    /// Element shape when a `GET` route returns a list.
    pub element: Option<TypeShape>,
}

/// Shapes carried by a typed route until the table is built.
#[derive(Clone, Debug)]
pub(crate) struct RouteShapes {
    pub(crate) request: Option<TypeShape>,
    pub(crate) response: TypeShape,
}

impl RouteShapes {
    pub(crate) fn into_metadata(self, method: Method, path: &str) -> TypedRouteMetadata {
        let element = match (&self.response, method) {
            (TypeShape::Array { items }, Method::Get) => Some((**items).clone()),
            _ => None,
        };
        TypedRouteMetadata {
            method,
            path: path.to_owned(),
            request: self.request,
            response: self.response,
            element,
        }
    }
}

/// Append-only record of typed routes, shared by cloning the handle.
///
/// Pass the same registry to every router that should report into it and
/// call [`clear`](TypedRouteRegistry::clear) between independent runs.
#[derive(Clone, Debug, Default)]
pub struct TypedRouteRegistry {
    entries: Arc<RwLock<Vec<TypedRouteMetadata>>>,
}

impl TypedRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, entry: TypedRouteMetadata) {
        self.entries.write().push(entry);
    }

    /// Snapshot in registration order.
    pub fn entries(&self) -> Vec<TypedRouteMetadata> {
        self.entries.read().clone()
    }

    pub fn find(&self, method: Method, path: &str) -> Option<TypedRouteMetadata> {
        self.entries.read().iter().find(|e| e.method == method && e.path == path).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Serialize for TypedRouteRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.read().serialize(serializer)
    }
}

// ── Adapters ──────────────────────────────────────────────────────────────────

/// Decodes the body according to `Content-Type`: JSON when absent or
/// `application/json`, verbatim text for `text/plain` into textual targets.
pub(crate) fn decode_body<T: DeserializeOwned + Describe>(req: &Request) -> Result<T, Error> {
    let media_type = req
        .header("content-type")
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match media_type.as_deref() {
        None | Some("application/json") => Ok(serde_json::from_str(req.body())?),
        Some("text/plain") if T::shape().is_textual() => {
            Ok(serde_json::from_value(Value::String(req.body().to_owned()))?)
        }
        Some(other) => Err(Error::UnsupportedContentType(other.to_owned())),
    }
}

fn respond<Res: Serialize>(success: StatusCode, result: Result<Res, Error>) -> Response {
    match result.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(json) => Response::builder().status(success).json(json),
        Err(e) => {
            debug!(error = %e, "typed route failed");
            e.to_typed_response()
        }
    }
}

/// Handler for routes that read a body: `(Req, Request) -> Result<Res, E>`.
pub(crate) fn body_route<Req, Res, E, F, Fut>(success: StatusCode, handler: F) -> BoxedHandler
where
    Req: DeserializeOwned + Describe + Send + 'static,
    Res: Serialize + Send + 'static,
    E: Into<Error> + Send + 'static,
    F: Fn(Req, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
{
    let handler = Arc::new(handler);
    boxed(move |req: Request| {
        let handler = Arc::clone(&handler);
        async move {
            let result = match decode_body::<Req>(&req) {
                Ok(body) => (*handler)(body, req).await.map_err(Into::into),
                Err(e) => Err(e),
            };
            respond(success, result)
        }
    })
}

/// Handler for body-less routes: `Request -> Result<Res, E>`.
pub(crate) fn query_route<Res, E, F, Fut>(handler: F) -> BoxedHandler
where
    Res: Serialize + Send + 'static,
    E: Into<Error> + Send + 'static,
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
{
    let handler = Arc::new(handler);
    boxed(move |req: Request| {
        let handler = Arc::clone(&handler);
        async move { respond(StatusCode::OK, (*handler)(req).await.map_err(Into::into)) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    impl Describe for Named {
        fn shape() -> TypeShape {
            TypeShape::object("Named", [("name", TypeShape::String)])
        }
    }

    fn req(content_type: Option<&str>, body: &str) -> Request {
        let mut b = Request::builder().method("POST").body(body);
        if let Some(ct) = content_type {
            b = b.header("Content-Type", ct);
        }
        b.build()
    }

    #[test]
    fn json_is_the_default() {
        let n: Named = decode_body(&req(None, r#"{"name":"a","extra":1}"#)).unwrap();
        assert_eq!(n, Named { name: "a".into() });
        let n: Named = decode_body(&req(Some("application/json; charset=utf-8"), r#"{"name":"b"}"#)).unwrap();
        assert_eq!(n.name, "b");
    }

    #[test]
    fn plain_text_only_for_textual_targets() {
        let s: String = decode_body(&req(Some("text/plain"), "raw words")).unwrap();
        assert_eq!(s, "raw words");
        let err = decode_body::<Named>(&req(Some("text/plain"), "raw")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedContentType(ct) if ct == "text/plain"));
    }

    #[test]
    fn form_bodies_are_unsupported() {
        let err = decode_body::<Named>(&req(Some("application/x-www-form-urlencoded"), "name=a")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedContentType(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(decode_body::<Named>(&req(None, "{")), Err(Error::Json(_))));
    }

    #[test]
    fn list_shapes_record_their_element() {
        let shapes = RouteShapes { request: None, response: Vec::<Named>::shape() };
        let meta = shapes.clone().into_metadata(Method::Get, "/names");
        assert_eq!(meta.element, Some(Named::shape()));
        let meta = shapes.into_metadata(Method::Post, "/names");
        assert_eq!(meta.element, None);
    }

    #[test]
    fn registry_clear_and_serialize() {
        let registry = TypedRouteRegistry::new();
        let handle = registry.clone();
        handle.record(RouteShapes { request: Some(Named::shape()), response: u64::shape() }
            .into_metadata(Method::Post, "/count"));
        assert_eq!(registry.len(), 1);
        assert!(registry.find(Method::Post, "/count").is_some());

        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json[0]["method"], "POST");
        assert_eq!(json[0]["response"]["type"], "integer");
        assert_eq!(json[0]["request"]["fields"][0]["name"], "name");

        registry.clear();
        assert!(handle.is_empty());
    }
}
