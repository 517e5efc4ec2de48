use serde::{Deserialize, Serialize};

use crate::error::{Endpoint, ServerRejection};

/// Multipart field name the `/upload` endpoint reads the document from.
pub const UPLOAD_FIELD_NAME: &str = "pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAccepted {
    pub pdf_name: String,
    pub pdf_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// Present only when the server sent a non-empty source annotation.
    pub source: Option<String>,
}

impl UploadResponse {
    pub fn into_result(self) -> Result<UploadAccepted, ServerRejection> {
        if !self.ok {
            return Err(ServerRejection::new(Endpoint::Upload, self.error));
        }
        Ok(UploadAccepted {
            pdf_name: self.pdf_name.unwrap_or_default(),
            pdf_id: self.pdf_id,
        })
    }
}

impl AskResponse {
    pub fn into_result(self) -> Result<Answer, ServerRejection> {
        if !self.ok {
            return Err(ServerRejection::new(Endpoint::Ask, self.error));
        }
        Ok(Answer {
            text: self.answer.unwrap_or_default(),
            source: self.source.filter(|s| !s.is_empty()),
        })
    }
}

impl ResetResponse {
    pub fn into_result(self) -> Result<(), ServerRejection> {
        if self.ok {
            Ok(())
        } else {
            Err(ServerRejection::new(Endpoint::Reset, self.error))
        }
    }
}
