use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeStyle {
    /// No document loaded for the session.
    Warning,
    /// A document is loaded and ready for questions.
    Light,
}

/// Server-tracked session status as far as the client knows it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    NoPdf,
    PdfLoaded {
        pdf_name: String,
    },
}

impl SessionStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SessionStatus::PdfLoaded { .. })
    }

    pub fn pdf_name(&self) -> Option<&str> {
        match self {
            SessionStatus::NoPdf => None,
            SessionStatus::PdfLoaded { pdf_name } => Some(pdf_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_status_reports_loaded_document() {
        let status = SessionStatus::PdfLoaded {
            pdf_name: "doc.pdf".to_string(),
        };
        assert!(status.is_loaded());
        assert_eq!(status.pdf_name(), Some("doc.pdf"));
        assert!(!SessionStatus::default().is_loaded());
        assert_eq!(SessionStatus::NoPdf.pdf_name(), None);
    }

    #[test]
    fn message_role_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).expect("json"),
            "\"assistant\""
        );
    }
}
