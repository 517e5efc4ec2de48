use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Upload,
    Ask,
    Reset,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Upload => "upload",
            Endpoint::Ask => "ask",
            Endpoint::Reset => "reset",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// An `ok: false` body returned by one of the endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint:?} rejected: {}", .message.as_deref().unwrap_or("no error message"))]
pub struct ServerRejection {
    pub endpoint: Endpoint,
    pub message: Option<String>,
}

impl ServerRejection {
    pub fn new(endpoint: Endpoint, message: Option<String>) -> Self {
        Self {
            endpoint,
            message: message.filter(|m| !m.is_empty()),
        }
    }

    /// The server-provided message, or `fallback` when none was sent.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}
