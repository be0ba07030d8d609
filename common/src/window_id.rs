//! Per-window identity used to namespace every channel a window owns.

use std::fmt::{Display, Formatter, Result as FormatResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default id length. Other processes may assume this length, so changing it
/// is a protocol change.
pub const WINDOW_ID_LENGTH: usize = 5;

/// Shortest id worth generating; below this, random ids collide too often.
pub const WINDOW_ID_MIN_LENGTH: usize = 4;

/// Longest id a single v4 UUID can supply in base 36.
pub const WINDOW_ID_MAX_LENGTH: usize = 24;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque short token identifying one live window.
///
/// Ids are random lowercase base-36 strings with no collision check. They are
/// good enough to keep channel names apart on a same-machine transport and
/// must not be treated as a security boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn generate() -> Self {
        Self::generate_with_length(WINDOW_ID_LENGTH)
    }

    /// Generate an id of `length` characters, clamped to `4..=24`.
    pub fn generate_with_length(length: usize) -> Self {
        let length = length.clamp(WINDOW_ID_MIN_LENGTH, WINDOW_ID_MAX_LENGTH);
        let mut value = Uuid::new_v4().as_u128();
        let mut id = String::with_capacity(length);
        for _ in 0..length {
            id.push(BASE36_DIGITS[(value % 36) as usize] as char);
            value /= 36;
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for WindowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for WindowId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}
