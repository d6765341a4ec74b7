//! Shared helpers for integration tests.

#![allow(dead_code)]

use switchyard::{ErrorBody, Request, Response};

pub fn get(path: &str) -> Request {
    Request::builder().method("GET").uri(path).build()
}

pub fn error_body(res: &Response) -> ErrorBody {
    serde_json::from_str(res.body_text()).expect("structured error body")
}

/// Installs a test subscriber once so `RUST_LOG` output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
