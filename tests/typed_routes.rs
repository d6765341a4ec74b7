//! Typed JSON routes and the metadata registry.

mod common;

use common::error_body;
use serde::{Deserialize, Serialize};
use switchyard::typed::{Describe, TypeShape, TypedRouteRegistry};
use switchyard::{Dispatcher, Error, Method, Request, Router, StatusCode};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NewWidget {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Widget {
    id: String,
    name: String,
}

impl Describe for NewWidget {
    fn shape() -> TypeShape {
        TypeShape::object("NewWidget", [("name", TypeShape::String)])
    }
}

impl Describe for Widget {
    fn shape() -> TypeShape {
        TypeShape::object("Widget", [("id", TypeShape::String), ("name", TypeShape::String)])
    }
}

async fn create(new: NewWidget) -> Result<Widget, Error> {
    if new.name.is_empty() {
        return Err(Error::BadRequest("name must not be empty".into()));
    }
    Ok(Widget { id: Uuid::new_v4().to_string(), name: new.name })
}

fn app(registry: &TypedRouteRegistry) -> Dispatcher {
    Dispatcher::new(
        Router::with_registry(registry.clone())
            .typed_post("/widgets", create)
            .typed_patch_with_request("/widgets/{id}", |patch: NewWidget, req: Request| async move {
                let id = req.param_uuid("id")?;
                if id.is_nil() {
                    return Err(Error::NotFound(format!("widget {id}")));
                }
                Ok::<_, Error>(Widget { id: id.to_string(), name: patch.name })
            })
            .typed_get("/widgets", |req: Request| async move {
                if req.header("authorization").is_none() {
                    return Err(Error::Unauthorized("login required".into()));
                }
                Ok::<_, Error>(vec![Widget { id: "w1".into(), name: "bolt".into() }])
            })
            .typed_put("/notes/{id}", |note: String, _req: Request| async move {
                Ok::<_, Error>(note.to_uppercase())
            })
            .typed_post("/locked", |_w: NewWidget| async {
                Err::<Widget, _>(Error::Forbidden("read only".into()))
            })
            .build(),
    )
}

fn post_json(path: &str, body: &str) -> Request {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("Content-Type", "application/json")
        .body(body)
        .build()
}

#[tokio::test]
async fn typed_post_answers_201_with_generated_id() {
    let registry = TypedRouteRegistry::new();
    let res = app(&registry).handle(post_json("/widgets", r#"{"name":"Widget"}"#)).await.unwrap();

    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.content_type(), "application/json");
    assert!(res.body_text().contains(r#""name":"Widget""#));
    let widget: Widget = serde_json::from_str(res.body_text()).unwrap();
    assert!(Uuid::parse_str(&widget.id).is_ok());
}

#[tokio::test]
async fn missing_content_type_defaults_to_json() {
    let req = Request::builder().method("POST").uri("/widgets").body(r#"{"name":"n"}"#).build();
    let res = app(&TypedRouteRegistry::new()).handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn business_errors_map_by_kind() {
    let registry = TypedRouteRegistry::new();
    let app = app(&registry);

    let res = app.handle(post_json("/widgets", r#"{"name":""}"#)).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body = error_body(&res);
    assert_eq!(body.code, "BAD_REQUEST");
    assert_eq!(body.message, "name must not be empty");

    let res = app.handle(post_json("/locked", r#"{"name":"x"}"#)).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = app.handle(Request::builder().method("GET").uri("/widgets").build()).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let nil = Uuid::nil();
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/widgets/{nil}"))
        .body(r#"{"name":"y"}"#)
        .build();
    let res = app.handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(&res).code, "NOT_FOUND");
}

#[tokio::test]
async fn patch_sees_path_params_and_answers_200() {
    let id = Uuid::new_v4();
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/widgets/{id}"))
        .header("Content-Type", "application/json")
        .body(r#"{"name":"renamed"}"#)
        .build();
    let res = app(&TypedRouteRegistry::new()).handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::OK);
    let widget: Widget = serde_json::from_str(res.body_text()).unwrap();
    assert_eq!(widget, Widget { id: id.to_string(), name: "renamed".into() });
}

#[tokio::test]
async fn bad_path_param_in_typed_route_is_400() {
    let req = Request::builder().method("PATCH").uri("/widgets/not-a-uuid").body(r#"{"name":"y"}"#).build();
    let res = app(&TypedRouteRegistry::new()).handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn content_type_selects_the_decoder() {
    let app = app(&TypedRouteRegistry::new());

    let req = Request::builder()
        .method("PUT")
        .uri("/notes/1")
        .header("Content-Type", "text/plain")
        .body("shout")
        .build();
    let res = app.handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body_text(), r#""SHOUT""#);

    let req = Request::builder()
        .method("POST")
        .uri("/widgets")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("name=a")
        .build();
    let res = app.handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&res).code, "UNSUPPORTED_CONTENT_TYPE");

    let res = app.handle(post_json("/widgets", "{not json")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&res).code, "BAD_REQUEST");
}

#[tokio::test]
async fn registry_records_shapes_and_clears() {
    let registry = TypedRouteRegistry::new();
    let _app = app(&registry);
    assert_eq!(registry.len(), 5);

    let post = registry.find(Method::Post, "/widgets").unwrap();
    assert_eq!(post.request, Some(NewWidget::shape()));
    assert_eq!(post.response, Widget::shape());
    assert_eq!(post.element, None);

    let list = registry.find(Method::Get, "/widgets").unwrap();
    assert_eq!(list.request, None);
    assert_eq!(list.element, Some(Widget::shape()));

    let order: Vec<String> = registry.entries().iter().map(|e| format!("{} {}", e.method, e.path)).collect();
    assert_eq!(
        order,
        ["POST /widgets", "PATCH /widgets/{id}", "GET /widgets", "PUT /notes/{id}", "POST /locked"]
    );

    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn payloads_survive_a_serialize_round_trip() {
    let widget = Widget { id: "w-9".into(), name: "washer".into() };
    let json = switchyard::json::serialize(&widget).unwrap();
    assert_eq!(switchyard::json::deserialize::<Widget>(&json).unwrap(), widget);

    let list = vec![widget.clone(), widget];
    let json = switchyard::json::serialize_pretty(&list).unwrap();
    assert_eq!(switchyard::json::deserialize::<Vec<Widget>>(&json).unwrap(), list);
}
