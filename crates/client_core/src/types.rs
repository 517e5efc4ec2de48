//! Client-held UI state and the transitions each flow drives it through.
//!
//! Every mutation goes through a transition method; the visible changes are
//! recorded as [`UiEvent`]s and drained by the controller after each step.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{BadgeStyle, MessageRole, SessionStatus},
    protocol::Answer,
};

use crate::events::UiEvent;

pub const STATUS_UPLOADING: &str = "Uploading and indexing PDF...";
pub const STATUS_UPLOAD_ERROR: &str = "Upload error. Please try again.";
pub const STATUS_THINKING: &str = "Thinking...";
pub const STATUS_DONE: &str = "Done.";
pub const STATUS_ASK_ERROR: &str = "Ask error. Please try again.";
pub const STATUS_RESET_FAILED: &str = "Reset failed.";
pub const STATUS_RESET_DONE: &str = "Reset complete. Upload a new PDF.";
pub const STATUS_RESET_ERROR: &str = "Reset error. Please try again.";
pub const STATUS_LISTENING: &str = "Listening...";
pub const STATUS_VOICE_CAPTURED: &str = "Voice captured. Review your question, then press Send.";
pub const STATUS_MIC_ERROR: &str = "Mic error. Please try again.";

const ASK_REJECTED_FALLBACK: &str = "Error.";
const UPLOAD_REJECTED_FALLBACK: &str = "unknown error";

pub const EMPTY_STATE_HEADING: &str = "Upload a PDF, then ask your question.";
pub const EMPTY_STATE_HINT: &str = "The system will answer only from the uploaded PDF.";
pub const NO_PDF_BADGE_TEXT: &str = "No PDF uploaded";
pub const MIC_LABEL: &str = "Speak";
pub const MIC_UNSUPPORTED_LABEL: &str = "Voice input not supported";

pub fn upload_ready_status(pdf_name: &str) -> String {
    format!("PDF ready: {pdf_name}. You can now ask questions.")
}

pub fn upload_rejected_status(error: Option<&str>) -> String {
    format!(
        "Upload failed: {}",
        error.unwrap_or(UPLOAD_REJECTED_FALLBACK)
    )
}

/// Which optional page elements exist. Transitions touching an absent
/// element skip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiLayout {
    pub badge: bool,
    pub reset: bool,
    pub mic: bool,
    pub transcript: bool,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            badge: true,
            reset: true,
            mic: true,
            transcript: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Upload,
    QuestionInput,
    Send,
    Mic,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfBadge {
    pub text: String,
    pub style: BadgeStyle,
}

impl PdfBadge {
    pub fn ready(pdf_name: &str) -> Self {
        Self {
            text: format!("PDF: {pdf_name}"),
            style: BadgeStyle::Light,
        }
    }

    pub fn empty() -> Self {
        Self {
            text: NO_PDF_BADGE_TEXT.to_string(),
            style: BadgeStyle::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: MessageRole,
    pub text: String,
    /// Secondary line shown under assistant replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl MessageEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
            source: None,
        }
    }

    pub fn assistant(text: impl Into<String>, source: Option<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
            source: source.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub placeholder_visible: bool,
    pub entries: Vec<MessageEntry>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            placeholder_visible: true,
            entries: Vec::new(),
        }
    }
}

impl Transcript {
    /// True when only the empty-state placeholder is rendered.
    pub fn is_empty_state(&self) -> bool {
        self.placeholder_visible && self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicControl {
    pub enabled: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlStates {
    pub upload: bool,
    pub question: bool,
    pub send: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic: Option<MicControl>,
}

impl ControlStates {
    pub fn mic_enabled(&self) -> bool {
        self.mic.as_ref().is_some_and(|mic| mic.enabled)
    }
}

/// Read-only copy of everything a front end renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSnapshot {
    pub session: SessionStatus,
    pub status: String,
    pub badge: Option<PdfBadge>,
    pub transcript: Option<Transcript>,
    pub controls: ControlStates,
    pub question: String,
    pub listening: bool,
    pub focus: Option<Control>,
}

#[derive(Debug)]
pub struct UiState {
    layout: UiLayout,
    mic_supported: bool,
    session: SessionStatus,
    status: String,
    badge: Option<PdfBadge>,
    transcript: Option<Transcript>,
    controls: ControlStates,
    question: String,
    listening: bool,
    focus: Option<Control>,
    pending: Vec<UiEvent>,
}

impl UiState {
    pub fn new(layout: UiLayout, mic_supported: bool) -> Self {
        let mic = layout.mic.then(|| MicControl {
            enabled: false,
            label: if mic_supported {
                MIC_LABEL.to_string()
            } else {
                MIC_UNSUPPORTED_LABEL.to_string()
            },
        });
        Self {
            layout,
            mic_supported,
            session: SessionStatus::NoPdf,
            status: String::new(),
            badge: layout.badge.then(PdfBadge::empty),
            transcript: layout.transcript.then(Transcript::default),
            controls: ControlStates {
                upload: true,
                question: false,
                send: false,
                mic,
            },
            question: String::new(),
            listening: false,
            focus: None,
            pending: Vec::new(),
        }
    }

    /// Starts with a document the server already holds for this session.
    pub fn resumed(layout: UiLayout, mic_supported: bool, pdf_name: &str) -> Self {
        let mut state = Self::new(layout, mic_supported);
        state.session = SessionStatus::PdfLoaded {
            pdf_name: pdf_name.to_string(),
        };
        if let Some(badge) = state.badge.as_mut() {
            *badge = PdfBadge::ready(pdf_name);
        }
        state.controls.question = true;
        state.controls.send = true;
        state.refresh_mic();
        state.pending.clear();
        state
    }

    pub fn layout(&self) -> UiLayout {
        self.layout
    }

    pub fn mic_supported(&self) -> bool {
        self.mic_supported
    }

    pub fn session(&self) -> &SessionStatus {
        &self.session
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn badge(&self) -> Option<&PdfBadge> {
        self.badge.as_ref()
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    pub fn controls(&self) -> &ControlStates {
        &self.controls
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            session: self.session.clone(),
            status: self.status.clone(),
            badge: self.badge.clone(),
            transcript: self.transcript.clone(),
            controls: self.controls.clone(),
            question: self.question.clone(),
            listening: self.listening,
            focus: self.focus,
        }
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Typing into the question input. Ignored while the input is disabled.
    pub fn set_question_text(&mut self, text: &str) -> bool {
        if !self.controls.question {
            return false;
        }
        self.set_question(text.to_string());
        true
    }

    pub fn on_upload_started(&mut self) -> bool {
        if !self.controls.upload {
            return false;
        }
        self.set_status(STATUS_UPLOADING.to_string());
        self.update_controls(|controls| {
            controls.upload = false;
            controls.question = false;
            controls.send = false;
        });
        true
    }

    pub fn on_upload_success(&mut self, pdf_name: &str) {
        self.session = SessionStatus::PdfLoaded {
            pdf_name: pdf_name.to_string(),
        };
        self.set_badge(PdfBadge::ready(pdf_name));
        self.reset_transcript();
        self.set_status(upload_ready_status(pdf_name));
        self.update_controls(|controls| {
            controls.question = true;
            controls.send = true;
            controls.upload = true;
        });
        self.request_focus(Control::QuestionInput);
    }

    pub fn on_upload_rejected(&mut self, error: Option<&str>) {
        self.set_status(upload_rejected_status(error));
        self.update_controls(|controls| controls.upload = true);
    }

    pub fn on_upload_error(&mut self) {
        self.set_status(STATUS_UPLOAD_ERROR.to_string());
        self.update_controls(|controls| controls.upload = true);
    }

    /// Typing `text` and pressing Enter as one step, so no other flow can
    /// replace the text between the two. Text that cannot be sent yet stays
    /// in the question input.
    pub fn on_submit(&mut self, text: &str) -> Option<String> {
        if !self.set_question_text(text) {
            return None;
        }
        self.on_ask_started()
    }

    /// Returns the trimmed question to send, or `None` when nothing is sent.
    pub fn on_ask_started(&mut self) -> Option<String> {
        if !self.controls.send {
            return None;
        }
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return None;
        }

        self.remove_placeholder();
        self.append_message(MessageEntry::user(question.clone()));
        self.set_question(String::new());
        self.set_status(STATUS_THINKING.to_string());
        self.update_controls(|controls| controls.send = false);
        Some(question)
    }

    pub fn on_ask_success(&mut self, answer: Answer) {
        self.finish_ask();
        self.set_status(STATUS_DONE.to_string());
        self.append_message(MessageEntry::assistant(answer.text, answer.source));
    }

    pub fn on_ask_rejected(&mut self, error: Option<&str>) {
        let text = error.unwrap_or(ASK_REJECTED_FALLBACK).to_string();
        self.finish_ask();
        self.set_status(text.clone());
        self.append_message(MessageEntry::assistant(text, None));
    }

    pub fn on_ask_error(&mut self) {
        self.finish_ask();
        self.set_status(STATUS_ASK_ERROR.to_string());
        self.append_message(MessageEntry::assistant(STATUS_ASK_ERROR, None));
    }

    pub fn on_reset_success(&mut self) {
        self.session = SessionStatus::NoPdf;
        self.set_badge(PdfBadge::empty());
        self.reset_transcript();
        self.set_question(String::new());
        self.update_controls(|controls| {
            controls.question = false;
            controls.send = false;
            controls.upload = true;
        });
        self.set_status(STATUS_RESET_DONE.to_string());
    }

    pub fn on_reset_rejected(&mut self) {
        self.set_status(STATUS_RESET_FAILED.to_string());
    }

    pub fn on_reset_error(&mut self) {
        self.set_status(STATUS_RESET_ERROR.to_string());
    }

    pub fn on_dictation_started(&mut self) -> bool {
        if !self.mic_supported || !self.controls.mic_enabled() {
            return false;
        }
        self.listening = true;
        self.refresh_mic_and_publish();
        self.set_status(STATUS_LISTENING.to_string());
        true
    }

    /// The transcript lands in the question input even if an upload or reset
    /// disabled it while listening.
    pub fn on_dictation_result(&mut self, transcript: &str) {
        self.set_question(transcript.to_string());
        self.set_status(STATUS_VOICE_CAPTURED.to_string());
    }

    pub fn on_dictation_error(&mut self) {
        self.set_status(STATUS_MIC_ERROR.to_string());
    }

    pub fn on_dictation_end(&mut self) {
        self.listening = false;
        self.refresh_mic_and_publish();
    }

    fn finish_ask(&mut self) {
        let loaded = self.session.is_loaded();
        self.update_controls(|controls| controls.send = loaded);
    }

    fn set_status(&mut self, status: String) {
        self.status = status.clone();
        self.pending.push(UiEvent::StatusChanged(status));
    }

    fn set_badge(&mut self, badge: PdfBadge) {
        if let Some(current) = self.badge.as_mut() {
            *current = badge.clone();
            self.pending.push(UiEvent::BadgeChanged(badge));
        }
    }

    fn set_question(&mut self, text: String) {
        if self.question != text {
            self.question = text.clone();
            self.pending.push(UiEvent::QuestionChanged(text));
        }
    }

    fn request_focus(&mut self, control: Control) {
        self.focus = Some(control);
        self.pending.push(UiEvent::FocusRequested(control));
    }

    fn reset_transcript(&mut self) {
        if let Some(transcript) = self.transcript.as_mut() {
            *transcript = Transcript::default();
            self.pending.push(UiEvent::TranscriptReset);
        }
    }

    fn remove_placeholder(&mut self) {
        if let Some(transcript) = self.transcript.as_mut() {
            if transcript.placeholder_visible {
                transcript.placeholder_visible = false;
                self.pending.push(UiEvent::PlaceholderRemoved);
            }
        }
    }

    fn append_message(&mut self, entry: MessageEntry) {
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.entries.push(entry.clone());
            self.pending.push(UiEvent::MessageAppended(entry));
        }
    }

    fn update_controls(&mut self, apply: impl FnOnce(&mut ControlStates)) {
        let before = self.controls.clone();
        apply(&mut self.controls);
        self.refresh_mic();
        if self.controls != before {
            self.pending.push(UiEvent::ControlsChanged(self.controls.clone()));
        }
    }

    fn refresh_mic_and_publish(&mut self) {
        self.update_controls(|_| {});
    }

    // The mic feeds the question input, so it follows that input's enablement.
    fn refresh_mic(&mut self) {
        let enabled = self.mic_supported && !self.listening && self.controls.question;
        if let Some(mic) = self.controls.mic.as_mut() {
            mic.enabled = enabled;
        }
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
