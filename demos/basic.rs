//! Minimal switchyard example: plain routes, a typed JSON route and filters.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/widgets \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Widget"}'
//!   curl -X POST http://localhost:3000/users/42 -H 'x-http-method-override: DELETE'
//!   curl -i -X OPTIONS http://localhost:3000/widgets -H 'origin: http://localhost:5173'
//!   curl http://localhost:3000/files/docs/readme.txt

use serde::{Deserialize, Serialize};
use switchyard::config::ServerConfig;
use switchyard::middleware::{Cors, CorrelationId, ErrorHandling, Logging};
use switchyard::typed::{Describe, TypeShape};
use switchyard::{Error, Request, Response, Router, Server, StatusCode};

const CONFIG: &str = r#"
bind = "0.0.0.0:3000"

[cors]
allowed_origins = ["http://localhost:5173"]
allow_credentials = true
"#;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_toml_str(CONFIG)?;

    let app = Router::new()
        .filter(CorrelationId::new(config.correlation.clone()))
        .filter(ErrorHandling)
        .get("/users/{id}", get_user)
        .delete("/users/{id}", delete_user)
        .get("/files/{*path}", get_file)
        .typed_post("/widgets", create_widget);

    // Application filters also see requests that match no route, so CORS
    // preflights for `/widgets` are answered here.
    Server::from_config(&config)?
        .filter(Logging)
        .filter(Cors::new(config.cors.clone()))
        .serve(app)
        .await
}

#[derive(Deserialize)]
struct NewWidget {
    name: String,
}

#[derive(Serialize)]
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

// GET /users/{id}
async fn get_user(req: Request) -> Result<Response, Error> {
    let id: u64 = req.param_as("id")?;
    Ok(Response::json(format!(r#"{{"id":{id},"name":"alice"}}"#)))
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(_req: Request) -> Response {
    Response::status(StatusCode::NO_CONTENT)
}

async fn get_file(req: Request) -> Response {
    Response::text(format!("would serve {}", req.param("path").unwrap_or_default()))
}

// POST /widgets → 201 Created
async fn create_widget(new: NewWidget) -> Result<Widget, Error> {
    if new.name.trim().is_empty() {
        return Err(Error::BadRequest("name must not be empty".into()));
    }
    Ok(Widget { id: uuid::Uuid::new_v4().to_string(), name: new.name })
}
