//! Terminal rendering of controller events and page snapshots.

use client_core::{
    types::{EMPTY_STATE_HEADING, EMPTY_STATE_HINT, STATUS_VOICE_CAPTURED},
    Control, ControlStates, MessageEntry, UiEvent, UiSnapshot,
};
use shared::domain::{BadgeStyle, MessageRole};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Renderer {
    question: String,
}

impl Renderer {
    /// Lines to print for one event; empty when the event has no visible effect.
    pub fn render_event(&mut self, event: &UiEvent) -> Vec<String> {
        match event {
            UiEvent::StatusChanged(status) => {
                let mut lines = vec![status_line(status)];
                // Dictated text is shown for review; typed text is already on screen.
                if status == STATUS_VOICE_CAPTURED && !self.question.is_empty() {
                    lines.push(format!("question> {}", self.question));
                }
                lines
            }
            UiEvent::BadgeChanged(badge) => vec![badge_line(&badge.text, badge.style)],
            UiEvent::TranscriptReset => placeholder_lines(),
            UiEvent::MessageAppended(entry) => message_lines(entry),
            UiEvent::QuestionChanged(text) => {
                self.question = text.clone();
                Vec::new()
            }
            UiEvent::Error(err) => {
                debug!(
                    category = ?err.category(),
                    context = ?err.context(),
                    message = err.message(),
                    retryable = err.is_retryable(),
                    "flow error"
                );
                Vec::new()
            }
            UiEvent::PlaceholderRemoved
            | UiEvent::ControlsChanged(_)
            | UiEvent::FocusRequested(_) => Vec::new(),
        }
    }
}

pub fn render_snapshot(snapshot: &UiSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(badge) = &snapshot.badge {
        lines.push(badge_line(&badge.text, badge.style));
    }
    if let Some(transcript) = &snapshot.transcript {
        if transcript.is_empty_state() {
            lines.extend(placeholder_lines());
        }
        for entry in &transcript.entries {
            lines.extend(message_lines(entry));
        }
    }
    lines.push(controls_line(&snapshot.controls));
    let awaiting_question =
        snapshot.focus == Some(Control::QuestionInput) && snapshot.controls.question;
    if !snapshot.question.is_empty() || awaiting_question {
        lines.push(format!("question> {}", snapshot.question).trim_end().to_string());
    }
    if !snapshot.status.is_empty() {
        lines.push(status_line(&snapshot.status));
    }
    lines
}

fn status_line(status: &str) -> String {
    format!("· {status}")
}

fn badge_line(text: &str, style: BadgeStyle) -> String {
    match style {
        BadgeStyle::Warning => format!("[! {text}]"),
        BadgeStyle::Light => format!("[{text}]"),
    }
}

fn placeholder_lines() -> Vec<String> {
    vec![
        format!("  {EMPTY_STATE_HEADING}"),
        format!("  {EMPTY_STATE_HINT}"),
    ]
}

fn message_lines(entry: &MessageEntry) -> Vec<String> {
    let mut lines = match entry.role {
        MessageRole::User => vec![format!("you> {}", entry.text)],
        MessageRole::Assistant => vec![format!("pdf> {}", entry.text)],
    };
    if let Some(source) = &entry.source {
        lines.push(format!("     {source}"));
    }
    lines
}

fn controls_line(controls: &ControlStates) -> String {
    let flag = |enabled: bool| if enabled { "on" } else { "off" };
    let mut line = format!(
        "controls: upload={} question={} send={}",
        flag(controls.upload),
        flag(controls.question),
        flag(controls.send)
    );
    if let Some(mic) = &controls.mic {
        line.push_str(&format!(" mic={} ({})", flag(mic.enabled), mic.label));
    }
    line
}
