//! Bearer-token gate.
//!
//! Token verification (JWT or otherwise) lives outside this crate; the filter
//! only extracts `Authorization: Bearer <token>` and asks the validator.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::handler::{BoxedHandler, boxed};
use crate::middleware::Filter;
use crate::request::Request;
use crate::response::Response;

type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct BearerAuth {
    validate: Validator,
}

impl BearerAuth {
    pub fn new(validate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self { validate: Arc::new(validate) }
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.header("authorization")?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim()).filter(|t| !t.is_empty())
}

impl Filter for BearerAuth {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        let validate = Arc::clone(&self.validate);
        boxed(move |req: Request| {
            let next = Arc::clone(&next);
            let verdict = match bearer_token(&req) {
                None => Some("Missing bearer token"),
                Some(token) if !validate(token) => Some("Invalid bearer token"),
                Some(_) => None,
            };
            async move {
                match verdict {
                    Some(message) => Ok(Response::error(StatusCode::UNAUTHORIZED, message, "UNAUTHORIZED")),
                    None => next.call(req).await,
                }
            }
        })
    }
}
