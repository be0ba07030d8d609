//! Shared-secret token presented by a presentation process when it connects
//! to the host over a socket transport.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use uuid::Uuid;
use zeroize::Zeroize;

/// A connection token that never exposes its value in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    inner: String,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: token.into(),
        }
    }

    /// Fresh random token for one host session.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().simple().to_string())
    }

    /// Get the actual token value for transmission.
    ///
    /// # Security Note
    /// Only call this when putting the token on the wire or comparing it.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Constant-time comparison against a presented token.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.inner.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken([REDACTED])")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED AUTH TOKEN]")
    }
}

impl Drop for AuthToken {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Tokens only leave the process through `as_str()`.
impl serde::Serialize for AuthToken {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from("AuthToken cannot be serialized - use as_str() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
