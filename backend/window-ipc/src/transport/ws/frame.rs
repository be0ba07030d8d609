use crate::error::transport::TransportError;
use crate::transport::Payload;

use common::ErrorLocation;

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};

/// One JSON text frame on the wire.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireFrame {
    Hello {
        token: String,
        window: String,
    },
    HelloResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Invoke {
        id: u64,
        channel: String,
        #[serde(default)]
        payload: Payload,
    },
    /// Either the handler's reply or, in `error`, why no handler ran.
    Reply {
        id: u64,
        #[serde(default)]
        payload: Payload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Broadcast {
        channel: String,
        #[serde(default)]
        payload: Payload,
    },
}

impl WireFrame {
    #[track_caller]
    pub fn encode(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Frame {
            message: format!("Failed to encode frame: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    pub fn decode(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(|e| TransportError::Frame {
            message: format!("Invalid frame: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WireFrame::Hello { .. } => "hello",
            WireFrame::HelloResult { .. } => "hello_result",
            WireFrame::Invoke { .. } => "invoke",
            WireFrame::Reply { .. } => "reply",
            WireFrame::Broadcast { .. } => "broadcast",
        }
    }
}

impl fmt::Debug for WireFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Never print the token
            WireFrame::Hello { window, .. } => f
                .debug_struct("Hello")
                .field("token", &"[REDACTED]")
                .field("window", window)
                .finish(),
            WireFrame::HelloResult { success, error } => f
                .debug_struct("HelloResult")
                .field("success", success)
                .field("error", error)
                .finish(),
            WireFrame::Invoke {
                id,
                channel,
                payload,
            } => f
                .debug_struct("Invoke")
                .field("id", id)
                .field("channel", channel)
                .field("payload", payload)
                .finish(),
            WireFrame::Reply { id, payload, error } => f
                .debug_struct("Reply")
                .field("id", id)
                .field("payload", payload)
                .field("error", error)
                .finish(),
            WireFrame::Broadcast { channel, payload } => f
                .debug_struct("Broadcast")
                .field("channel", channel)
                .field("payload", payload)
                .finish(),
        }
    }
}
