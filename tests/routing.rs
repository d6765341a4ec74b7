//! End-to-end routing through the dispatcher.

mod common;

use common::{error_body, get};
use switchyard::{Dispatcher, Error, Method, Request, Response, Router, StatusCode};

fn app() -> Dispatcher {
    Dispatcher::new(
        Router::new()
            .get("/users/{id}", |req: Request| async move {
                Response::text(format!("user {}", req.param("id").unwrap_or("?")))
            })
            .get("/users/{id}/posts/{post}", |req: Request| async move {
                let id = req.require_param("id")?;
                let post = req.require_param("post")?;
                Ok::<_, Error>(Response::text(format!("{id}:{post}")))
            })
            .get("/files/{*path}", |req: Request| async move {
                Response::text(req.param("path").unwrap_or_default().to_owned())
            })
            .post("/users", |req: Request| async move {
                Response::builder().status(StatusCode::CREATED).text(req.body().to_owned())
            })
            .get("/boom", |_req: Request| async {
                Err::<Response, _>(Error::other("database unreachable"))
            })
            .build(),
    )
}

#[tokio::test]
async fn named_params_reach_the_handler() {
    let res = app().handle(get("/users/42")).await.unwrap();
    assert_eq!(res.body_text(), "user 42");

    let res = app().handle(get("/users/7/posts/first")).await.unwrap();
    assert_eq!(res.body_text(), "7:first");
}

#[tokio::test]
async fn wildcard_keeps_internal_slashes() {
    let res = app().handle(get("/files/docs/2024/report.pdf")).await.unwrap();
    assert_eq!(res.body_text(), "docs/2024/report.pdf");
}

#[tokio::test]
async fn query_string_is_ignored_for_matching() {
    let req = Request::builder().method("GET").uri("/users/9?expand=posts").build();
    assert_eq!(req.query("expand"), Some("posts"));
    let res = app().handle(req).await.unwrap();
    assert_eq!(res.body_text(), "user 9");
}

#[tokio::test]
async fn trailing_slash_is_a_different_path() {
    for path in ["/users", "/users/1/", "/users/1/posts"] {
        let res = app().handle(get(path)).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn unknown_route_names_method_and_stripped_path() {
    let req = Request::builder().method("DELETE").uri("/nowhere?x=1").build();
    let res = app().handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    let body = error_body(&res);
    assert_eq!(body.message, "Route not found: DELETE /nowhere");
    assert_eq!(body.code, "ROUTE_NOT_FOUND");
}

#[tokio::test]
async fn method_is_part_of_the_match() {
    let req = Request::builder().method("POST").uri("/users").body("alice").build();
    let res = app().handle(req).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.body_text(), "alice");

    let res = app().handle(get("/users")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn handler_failure_is_a_structured_500() {
    let res = app().handle(get("/boom")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(&res);
    assert_eq!(body.message, "Internal server error: database unreachable");
    assert_eq!(body.code, "INTERNAL_ERROR");
}

#[tokio::test]
async fn panicking_handler_is_contained() {
    let app = Dispatcher::new(
        Router::new()
            .get("/panic", |_req: Request| async {
                let v: Vec<u8> = Vec::new();
                Response::text(v[3].to_string())
            })
            .build(),
    );
    let res = app.handle(get("/panic")).await.unwrap();
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(&res).code, "INTERNAL_ERROR");
}

#[tokio::test]
async fn earlier_overlapping_route_always_wins() {
    let app = Dispatcher::new(
        Router::new()
            .get("/items/{*rest}", |_req: Request| async { "wildcard" })
            .get("/items/{id}", |_req: Request| async { "by-id" })
            .get("/items/special", |_req: Request| async { "special" })
            .build(),
    );
    for path in ["/items/1", "/items/special", "/items/a/b"] {
        let res = app.handle(get(path)).await.unwrap();
        assert_eq!(res.body_text(), "wildcard", "{path}");
    }
}

#[tokio::test]
async fn groups_prefix_and_route_table_is_inspectable() {
    let table = Router::new()
        .group("/api", |api| {
            api.get("", |_req: Request| async { "root" })
                .group("/v1/", |v1| v1.get("/ping", |_req: Request| async { "pong" }))
        })
        .build();
    let listed: Vec<(Method, &str)> = table.routes().iter().map(|r| (r.method(), r.pattern())).collect();
    assert_eq!(listed, [(Method::Get, "/api"), (Method::Get, "/api/v1/ping")]);

    let app = Dispatcher::new(table);
    assert_eq!(app.handle(get("/api")).await.unwrap().body_text(), "root");
    assert_eq!(app.handle(get("/api/v1/ping")).await.unwrap().body_text(), "pong");
}
