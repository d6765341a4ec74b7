//! Route registration and the immutable route table.
//!
//! [`Router`] is the mutable construction context: it collects filters and
//! routes, and nested [`group`](Router::group)s add a shared prefix.
//! [`Router::build`] freezes everything into a [`RouteTable`], an ordered list
//! scanned first-match-wins. Specificity plays no part: register `/users/me`
//! before `/users/{id}` if both should be reachable.

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::matcher::{PathParams, Pattern};
use crate::method::Method;
use crate::middleware::{BoxedFilter, Filter, FilterChain};
use crate::request::Request;
use crate::typed::{self, Describe, RouteShapes, TypedRouteRegistry};

struct PendingRoute {
    method: Method,
    path: String,
    handler: BoxedHandler,
    shapes: Option<RouteShapes>,
}

/// The application router.
///
/// ```rust
/// use switchyard::{Method, Request, Response, Router};
/// use switchyard::middleware::{Cors, Logging};
///
/// async fn get_user(req: Request) -> Response {
///     Response::text(req.param("id").unwrap_or("unknown").to_owned())
/// }
///
/// let table = Router::new()
///     .filter(Logging)
///     .get("/health", |_req: Request| async { "ok" })
///     .group("/api", |api| {
///         api.filter(Cors::default())
///            .route(Method::Get, "/users/{id}", get_user)
///     })
///     .build();
/// assert_eq!(table.len(), 2);
/// ```
pub struct Router {
    routes: Vec<PendingRoute>,
    filters: FilterChain,
    registry: TypedRouteRegistry,
}

impl Router {
    pub fn new() -> Self {
        Self::with_registry(TypedRouteRegistry::new())
    }

    /// Reports typed routes into `registry` when built.
    pub fn with_registry(registry: TypedRouteRegistry) -> Self {
        Self { routes: Vec::new(), filters: FilterChain::new(), registry }
    }

    pub fn registry(&self) -> &TypedRouteRegistry {
        &self.registry
    }

    /// Appends a filter. Only routes registered afterwards are wrapped by it.
    pub fn filter(mut self, filter: impl Filter) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Registers a handler for a method + path pair.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid pattern (a wildcard that is not the
    /// final segment). Routes are registered at startup, where a typo should
    /// stop the process.
    pub fn route(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.push(method, path, handler.into_boxed_handler(), None)
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Put, path, handler)
    }

    pub fn patch(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Patch, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Delete, path, handler)
    }

    pub fn head(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Head, path, handler)
    }

    pub fn options(self, path: &str, handler: impl Handler) -> Self {
        self.route(Method::Options, path, handler)
    }

    /// Registers the routes produced by `body` under `prefix`.
    ///
    /// The child starts with a snapshot of this router's filters; filters the
    /// child adds stay inside the group, and filters added here later do not
    /// reach back into it.
    pub fn group(self, prefix: &str, body: impl FnOnce(Router) -> Router) -> Self {
        self.group_with(prefix, Vec::new(), body)
    }

    /// Like [`group`](Router::group), appending `filters` to the child first.
    pub fn group_with(
        mut self,
        prefix: &str,
        filters: Vec<BoxedFilter>,
        body: impl FnOnce(Router) -> Router,
    ) -> Self {
        let mut child = Router {
            routes: Vec::new(),
            filters: self.filters.clone(),
            registry: self.registry.clone(),
        };
        child.filters.extend(filters);
        let child = body(child);

        for route in child.routes {
            let path = join_path(prefix, &route.path);
            validate(&path);
            self.routes.push(PendingRoute { path, ..route });
        }
        self
    }

    // ── Typed routes ──────────────────────────────────────────────────────────

    /// `POST` with a JSON body; answers `201 Created`.
    pub fn typed_post<Req, Res, E, F, Fut>(self, path: &str, handler: F) -> Self
    where
        Req: DeserializeOwned + Describe + Send + 'static,
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.typed_post_with_request(path, move |body: Req, _req: Request| handler(body))
    }

    /// `POST` whose handler also receives the request (path and query params).
    pub fn typed_post_with_request<Req, Res, E, F, Fut>(self, path: &str, handler: F) -> Self
    where
        Req: DeserializeOwned + Describe + Send + 'static,
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Req, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.typed_body(Method::Post, StatusCode::CREATED, path, handler)
    }

    /// `PUT` with a JSON body; answers `200 OK`.
    pub fn typed_put<Req, Res, E, F, Fut>(self, path: &str, handler: F) -> Self
    where
        Req: DeserializeOwned + Describe + Send + 'static,
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Req, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.typed_body(Method::Put, StatusCode::OK, path, handler)
    }

    /// `PATCH` with a JSON body; answers `200 OK`.
    pub fn typed_patch<Req, Res, E, F, Fut>(self, path: &str, handler: F) -> Self
    where
        Req: DeserializeOwned + Describe + Send + 'static,
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.typed_patch_with_request(path, move |body: Req, _req: Request| handler(body))
    }

    pub fn typed_patch_with_request<Req, Res, E, F, Fut>(self, path: &str, handler: F) -> Self
    where
        Req: DeserializeOwned + Describe + Send + 'static,
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Req, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        self.typed_body(Method::Patch, StatusCode::OK, path, handler)
    }

    /// `GET` returning JSON; answers `200 OK`. A `Vec<T>` response also
    /// records `T` as the element shape.
    pub fn typed_get<Res, E, F, Fut>(self, path: &str, handler: F) -> Self
    where
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        let shapes = RouteShapes { request: None, response: Res::shape() };
        self.push(Method::Get, path, typed::query_route(handler), Some(shapes))
    }

    fn typed_body<Req, Res, E, F, Fut>(
        self,
        method: Method,
        success: StatusCode,
        path: &str,
        handler: F,
    ) -> Self
    where
        Req: DeserializeOwned + Describe + Send + 'static,
        Res: Serialize + Describe + Send + 'static,
        E: Into<Error> + Send + 'static,
        F: Fn(Req, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        let shapes = RouteShapes { request: Some(Req::shape()), response: Res::shape() };
        self.push(method, path, typed::body_route(success, handler), Some(shapes))
    }

    fn push(
        mut self,
        method: Method,
        path: &str,
        handler: BoxedHandler,
        shapes: Option<RouteShapes>,
    ) -> Self {
        validate(path);
        let handler = self.filters.apply(handler);
        self.routes.push(PendingRoute { method, path: path.to_owned(), handler, shapes });
        self
    }

    /// Freezes the router into a route table, recording typed routes in the
    /// registry with their final (prefixed) paths.
    pub fn build(self) -> RouteTable {
        let registry = self.registry;
        let routes = self
            .routes
            .into_iter()
            .map(|route| {
                if let Some(shapes) = route.shapes {
                    registry.record(shapes.into_metadata(route.method, &route.path));
                }
                Route {
                    method: route.method,
                    pattern: compile(&route.path),
                    handler: route.handler,
                }
            })
            .collect();
        RouteTable { routes }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn compile(path: &str) -> Pattern {
    Pattern::parse(path).unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"))
}

fn validate(path: &str) {
    compile(path);
}

/// Joins a group prefix and a route path with exactly one `/` between them.
/// An empty route path yields the prefix itself.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.is_empty() {
        return if prefix.is_empty() { "/".to_owned() } else { prefix.to_owned() };
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

// ── Route table ───────────────────────────────────────────────────────────────

/// One registered route. Its handler is already wrapped by its filters.
pub struct Route {
    method: Method,
    pattern: Pattern,
    handler: BoxedHandler,
}

impl Route {
    pub fn method(&self) -> Method { self.method }
    pub fn pattern(&self) -> &str { self.pattern.as_str() }
    pub fn handler(&self) -> &BoxedHandler { &self.handler }
}

/// A route that matched, with the parameters it captured.
pub struct MatchResult<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// Immutable, ordered list of routes.
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// First route, in registration order, whose method and pattern match.
    pub fn lookup(&self, method: Method, path: &str) -> Option<MatchResult<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                route.pattern.matches(path).map(|params| MatchResult { route, params })
            })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    fn named(name: &'static str) -> impl Handler {
        move |_req: Request| async move { Response::text(name) }
    }

    async fn call(table: &RouteTable, method: Method, path: &str) -> Option<String> {
        let m = table.lookup(method, path)?;
        let res = m.route.handler().call(Request::builder().build()).await.ok()?;
        Some(res.body_text().to_owned())
    }

    #[tokio::test]
    async fn first_registered_route_wins() {
        let table = Router::new()
            .get("/users/{id}", named("by-id"))
            .get("/users/me", named("me"))
            .build();
        assert_eq!(call(&table, Method::Get, "/users/me").await.as_deref(), Some("by-id"));
    }

    #[test]
    fn method_must_match() {
        let table = Router::new().post("/users", named("create")).build();
        assert!(table.lookup(Method::Get, "/users").is_none());
        assert!(table.lookup(Method::Post, "/users").is_some());
    }

    #[test]
    fn registration_order_is_preserved_through_groups() {
        let table = Router::new()
            .get("/a", named("a"))
            .group("/g", |g| g.get("/b", named("b")).get("/c", named("c")))
            .get("/d", named("d"))
            .build();
        let patterns: Vec<&str> = table.routes().iter().map(Route::pattern).collect();
        assert_eq!(patterns, ["/a", "/g/b", "/g/c", "/d"]);
    }

    #[test]
    fn nested_groups_accumulate_prefixes() {
        let table = Router::new()
            .group("/api/", |api| api.group("v1", |v1| v1.get("users/{id}", named("u"))))
            .build();
        let m = table.lookup(Method::Get, "/api/v1/users/7").unwrap();
        assert_eq!(m.params.get("id").map(String::as_str), Some("7"));
    }

    #[test]
    fn join_normalises_the_seam() {
        assert_eq!(join_path("/api", "/users"), "/api/users");
        assert_eq!(join_path("/api/", "/users"), "/api/users");
        assert_eq!(join_path("/api", "users"), "/api/users");
        assert_eq!(join_path("/api", ""), "/api");
        assert_eq!(join_path("/api", "/"), "/api/");
        assert_eq!(join_path("", ""), "/");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn inner_wildcard_panics_at_registration() {
        let _ = Router::new().get("/files/{*path}/meta", named("x"));
    }

    #[test]
    fn typed_routes_are_recorded_with_prefix_on_build() {
        let registry = TypedRouteRegistry::new();
        let router = Router::with_registry(registry.clone()).group("/api", |api| {
            api.typed_get("/names", |_req: Request| async {
                Ok::<_, Error>(vec!["a".to_owned()])
            })
        });
        assert!(registry.is_empty());
        let _table = router.build();
        let meta = registry.find(Method::Get, "/api/names").unwrap();
        assert_eq!(meta.element, Some(crate::typed::TypeShape::String));
    }
}
