//! JSON codec.
//!
//! Thin wrappers over `serde_json` with the crate's error type. Unknown input
//! fields are ignored and every field is written on output, which is serde's
//! behaviour as long as types do not opt into `deny_unknown_fields` or
//! `skip_serializing_if`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::response::{IntoOutcome, IntoResponse, Outcome, Response};

pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string(value)?)
}

pub fn serialize_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn deserialize<T: DeserializeOwned>(s: &str) -> Result<T, Error> {
    Ok(serde_json::from_str(s)?)
}

/// Serialises `T` as a `200 OK` JSON response.
///
/// ```rust
/// use serde::Serialize;
/// use switchyard::{Json, Request};
///
/// #[derive(Serialize)]
/// struct User { id: u64, name: String }
///
/// async fn get_user(_req: Request) -> Json<User> {
///     Json(User { id: 1, name: "alice".into() })
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serialize(&self.0) {
            Ok(body) => Response::json(body),
            Err(e) => e.to_internal_response(),
        }
    }
}

impl<T: Serialize> IntoOutcome for Json<T> {
    fn into_outcome(self) -> Outcome {
        serialize(&self.0).map(Response::json)
    }
}
