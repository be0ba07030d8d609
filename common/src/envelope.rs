//! Success/failure envelope carried by every request/response exchange.
//!
//! Handler return values and handler errors never cross the transport
//! unwrapped. The presentation side always receives a `ResponseEnvelope`, so
//! it can tell "my call failed with reason X" apart from "the channel itself
//! is broken" (a transport-level rejection).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message used when a failure carries no readable reason.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Wire value `{ success, data?, error? }`.
///
/// `success == true` never carries `error`; `success == false` never carries
/// `data` and always carries a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Success with nothing to report.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Split into the payload or the failure message.
    ///
    /// A failure without a message, or with an empty one, reports
    /// [`UNKNOWN_ERROR`].
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            return Ok(self.data);
        }

        match self.error {
            Some(message) if !message.is_empty() => Err(message),
            _ => Err(UNKNOWN_ERROR.to_string()),
        }
    }
}

impl ResponseEnvelope<Value> {
    /// Envelope as the JSON value handed to the transport.
    pub fn into_value(self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert(String::from("success"), Value::Bool(self.success));
        if let Some(data) = self.data {
            object.insert(String::from("data"), data);
        }
        if let Some(error) = self.error {
            object.insert(String::from("error"), Value::String(error));
        }
        Value::Object(object)
    }
}
