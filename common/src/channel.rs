//! Channel naming scheme shared by both sides of the transport.
//!
//! The host-side controller and the presentation-side proxy never exchange
//! channel names; each derives them from `(window id, method name)` with the
//! functions below. Any change here must ship to both sides together.

use crate::WindowId;

use once_cell::sync::Lazy;
use regex::Regex;

/// Broadcast channel carrying the initial data handshake.
pub const DATA_CHANNEL: &str = "window:data";

/// Method name of the implicit close handler every window owns.
pub const CLOSE_METHOD: &str = "close";

/// Method name of the one-shot handshake acknowledgement.
pub const ACK_METHOD: &str = "ack";

/// Suffix of the companion channel a response-wait method completes on.
pub const RESPONSE_SUFFIX: &str = "Response";

/// Method names owned by the controller itself.
pub const RESERVED_METHODS: &[&str] = &[CLOSE_METHOD, ACK_METHOD];

const METHOD_NAME_PATTERN: &str = r"^[A-Za-z_$][A-Za-z0-9_$.\-]*$";

static METHOD_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(METHOD_NAME_PATTERN).expect("valid regex pattern"));

/// `"<windowId>:<methodName>"`
pub fn scoped_name(window_id: &WindowId, method: &str) -> String {
    format!("{window_id}:{method}")
}

pub fn close_channel(window_id: &WindowId) -> String {
    scoped_name(window_id, CLOSE_METHOD)
}

pub fn ack_channel(window_id: &WindowId) -> String {
    scoped_name(window_id, ACK_METHOD)
}

/// `"<windowId>:<windowId>:<methodName>Response"`.
///
/// The id appears twice because the response name is scoped on top of an
/// already scoped method name.
pub fn response_channel(window_id: &WindowId, method: &str) -> String {
    format!(
        "{window_id}:{scoped}{RESPONSE_SUFFIX}",
        scoped = scoped_name(window_id, method)
    )
}

/// Method names never contain `:`, so a scoped name splits back into exactly
/// one `(window id, method)` pair.
pub fn is_valid_method_name(method: &str) -> bool {
    METHOD_NAME_REGEX.is_match(method)
}

pub fn is_reserved_method_name(method: &str) -> bool {
    RESERVED_METHODS.contains(&method)
}
