//! Visit Panel backend API client.
//!
//! Thin typed wrappers over the backend's form-in / JSON-out endpoints.
//!
//! # Architecture
//!
//! - Two generic helpers, [`ApiClient::post`] (multipart form body) and
//!   [`ApiClient::get_json`], parse the body as JSON whatever the HTTP
//!   status. The backend reports failures in the payload, not the status.
//! - Typed endpoint methods interpret the payload envelope and turn anything
//!   that is not a success into [`ClientError::Rejected`] carrying the raw
//!   payload, so the caller can show it unchanged.
//! - Credentials travel the way the backend expects them: the session token
//!   and the admin password as form fields or query parameters.
//!
//! [`ClientError::Rejected`]: crate::error::ClientError::Rejected

mod client;
mod types;

pub use client::{ApiClient, Form};
pub use types::{LoginResponse, Registration, StartedTask};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Accept payloads that carry `ok: true`.
fn expect_ok(payload: Value) -> ClientResult<Value> {
    if payload.get("ok").and_then(Value::as_bool) == Some(true) {
        Ok(payload)
    } else {
        Err(ClientError::Rejected(payload))
    }
}

/// Reject payloads that carry an `error` key.
fn expect_no_error(payload: Value) -> ClientResult<Value> {
    if payload.get("error").is_some() {
        Err(ClientError::Rejected(payload))
    } else {
        Ok(payload)
    }
}

/// Extract a list under `key`. A missing or null list is empty.
fn take_list<T: DeserializeOwned>(payload: Value, key: &str) -> ClientResult<Vec<T>> {
    let mut payload = expect_no_error(payload)?;
    match payload.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => Ok(serde_json::from_value(list)?),
    }
}
