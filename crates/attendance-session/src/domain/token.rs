//! Token Generator
//!
//! Tokens are opaque: callers compare them, never parse them.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// A short-lived redemption credential.
///
/// `Debug` is redacted so tokens never reach logs; equality is constant-time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a submitted token.
    pub fn matches(&self, submitted: &str) -> bool {
        self.0.as_bytes().ct_eq(submitted.as_bytes()).into()
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for SessionToken {}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} chars>)", self.0.len())
    }
}

/// Source of fresh session tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produce a new token. Never fails; an exhausted entropy source aborts
    /// the process.
    fn generate(&self) -> SessionToken;
}

/// Hex-encoded bytes from the operating system CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct OsTokenGenerator {
    byte_len: usize,
}

impl OsTokenGenerator {
    pub fn new(byte_len: usize) -> Self {
        Self { byte_len }
    }
}

impl TokenGenerator for OsTokenGenerator {
    fn generate(&self) -> SessionToken {
        let mut bytes = vec![0u8; self.byte_len];
        OsRng.fill_bytes(&mut bytes);
        SessionToken(hex::encode(bytes))
    }
}
