//! Backend port and its HTTP implementation.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::Endpoint,
    protocol::{
        Answer, AskRequest, AskResponse, ResetResponse, UploadAccepted, UploadResponse,
        PDF_MIME_TYPE, UPLOAD_FIELD_NAME,
    },
};
use tracing::{debug, info};
use url::Url;

use crate::error::ClientError;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadAccepted, ClientError>;
    async fn ask(&self, question: &str) -> Result<Answer, ClientError>;
    async fn reset(&self) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        Ok(Self { filename, bytes })
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// Applied to every request; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

pub struct HttpChatBackend {
    http: Client,
    base_url: Url,
}

impl HttpChatBackend {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_options(server_url, HttpOptions::default())
    }

    pub fn with_options(server_url: &str, options: HttpOptions) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(server_url)?;
        // The server tracks the loaded document in a cookie session.
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::ClientBuild)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ClientError> {
        self.base_url
            .join(endpoint.path())
            .map_err(|source| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source,
            })
    }

    async fn read_json<T: DeserializeOwned>(
        endpoint: Endpoint,
        response: Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Http { endpoint, source })?;
        debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            body_len = body.len(),
            "received backend response"
        );
        // Rejections arrive as JSON with 4xx/5xx codes, so the status is not checked.
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode { endpoint, source })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadAccepted, ClientError> {
        let endpoint = Endpoint::Upload;
        let url = self.endpoint_url(endpoint)?;
        info!(
            filename = %upload.filename,
            size_bytes = upload.bytes.len(),
            "uploading pdf"
        );
        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(PDF_MIME_TYPE)
            .map_err(|source| ClientError::Http { endpoint, source })?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Http { endpoint, source })?;
        let body: UploadResponse = Self::read_json(endpoint, response).await?;
        Ok(body.into_result()?)
    }

    async fn ask(&self, question: &str) -> Result<Answer, ClientError> {
        let endpoint = Endpoint::Ask;
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .http
            .post(url)
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(|source| ClientError::Http { endpoint, source })?;
        let body: AskResponse = Self::read_json(endpoint, response).await?;
        Ok(body.into_result()?)
    }

    async fn reset(&self) -> Result<(), ClientError> {
        let endpoint = Endpoint::Reset;
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|source| ClientError::Http { endpoint, source })?;
        let body: ResetResponse = Self::read_json(endpoint, response).await?;
        Ok(body.into_result()?)
    }
}

/// Endpoints are joined relative to the base, so its path must end in `/`.
pub fn normalize_base_url(server_url: &str) -> Result<Url, ClientError> {
    let trimmed = server_url.trim();
    let mut url = Url::parse(trimmed).map_err(|source| ClientError::InvalidBaseUrl {
        url: trimmed.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
