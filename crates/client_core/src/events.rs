//! UI events published by the controller and error classification for front ends.

use shared::error::Endpoint;

use crate::{
    error::ClientError,
    types::{Control, ControlStates, MessageEntry, PdfBadge},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    StatusChanged(String),
    BadgeChanged(PdfBadge),
    /// Transcript wiped back to the empty-state placeholder.
    TranscriptReset,
    PlaceholderRemoved,
    MessageAppended(MessageEntry),
    ControlsChanged(ControlStates),
    QuestionChanged(String),
    FocusRequested(Control),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    /// `ok: false` with a server-provided message.
    Application,
    /// Network failure, unreadable body, local I/O.
    Transport,
    CapabilityAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Upload,
    Ask,
    Reset,
    Dictation,
}

impl From<Endpoint> for UiErrorContext {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Upload => UiErrorContext::Upload,
            Endpoint::Ask => UiErrorContext::Ask,
            Endpoint::Reset => UiErrorContext::Reset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Rejected(_) => UiErrorCategory::Application,
            _ => UiErrorCategory::Transport,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn capability_absent(control: Control) -> Self {
        Self {
            category: UiErrorCategory::CapabilityAbsent,
            context: UiErrorContext::Dictation,
            message: format!("{control:?} disabled: speech recognition is not available"),
        }
    }

    /// Every failure is recovered by repeating the action, except a missing capability.
    pub fn is_retryable(&self) -> bool {
        self.category != UiErrorCategory::CapabilityAbsent
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
