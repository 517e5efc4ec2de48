use std::path::PathBuf;

use shared::error::{Endpoint, ServerRejection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Rejected(#[from] ServerRejection),
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response body from {endpoint}: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid server url {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("speech recognition failed: {0}")]
    Dictation(String),
}

impl ClientError {
    pub fn rejection(&self) -> Option<&ServerRejection> {
        match self {
            ClientError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
