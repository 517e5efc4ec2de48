//! Drives the upload, ask, reset and dictation flows against the UI state.
//!
//! Each flow runs a "started" transition, awaits the backend without holding
//! the state lock, then runs the matching completion transition. Controls
//! gating a flow stay disabled while its request is in flight, so a second
//! trigger of the same kind is ignored.

use std::{path::PathBuf, sync::Arc};

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    dictation::{DictationCapability, RecognitionOptions},
    error::ClientError,
    events::{UiError, UiErrorContext, UiEvent},
    transport::{ChatBackend, PdfUpload},
    types::{Control, UiLayout, UiSnapshot, UiState},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Nothing was sent: empty input or the triggering control was disabled.
    Skipped,
    Completed,
    /// The server answered `ok: false`.
    Rejected,
    /// Transport, decode, local I/O or recognizer failure.
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    pub layout: UiLayout,
    pub recognition: RecognitionOptions,
    /// Name of a document the server already holds for this session.
    pub resume_pdf: Option<String>,
}

pub struct ClientController {
    backend: Arc<dyn ChatBackend>,
    dictation: DictationCapability,
    recognition: RecognitionOptions,
    state: Mutex<UiState>,
    events: broadcast::Sender<UiEvent>,
}

impl ClientController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        dictation: DictationCapability,
        options: ControllerOptions,
    ) -> Arc<Self> {
        let mic_supported = dictation.is_available();
        let state = match options.resume_pdf.as_deref() {
            Some(pdf_name) => UiState::resumed(options.layout, mic_supported, pdf_name),
            None => UiState::new(options.layout, mic_supported),
        };
        if options.layout.mic && !mic_supported {
            info!("speech recognition unavailable; mic control disabled");
        }
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            backend,
            dictation,
            recognition: options.recognition,
            state: Mutex::new(state),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> UiSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Reported once for a page that has a mic control but no recognizer.
    pub async fn capability_notice(&self) -> Option<UiError> {
        let state = self.state.lock().await;
        (state.layout().mic && !state.mic_supported())
            .then(|| UiError::capability_absent(Control::Mic))
    }

    pub async fn set_question_text(&self, text: &str) -> bool {
        self.transition(|state| state.set_question_text(text)).await
    }

    /// File picker selection. Only the first file is uploaded.
    pub async fn select_files(&self, files: &[PathBuf]) -> FlowOutcome {
        let Some(path) = files.first() else {
            return FlowOutcome::Skipped;
        };
        if !self.transition(UiState::on_upload_started).await {
            debug!(path = %path.display(), "upload control disabled; ignoring selection");
            return FlowOutcome::Skipped;
        }

        let result = match PdfUpload::from_path(path).await {
            Ok(upload) => self.backend.upload_pdf(upload).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(accepted) => {
                info!(
                    pdf_name = %accepted.pdf_name,
                    pdf_id = accepted.pdf_id.as_deref().unwrap_or("-"),
                    "pdf ready"
                );
                self.transition(|state| state.on_upload_success(&accepted.pdf_name))
                    .await;
                FlowOutcome::Completed
            }
            Err(ClientError::Rejected(rejection)) => {
                warn!(error = %rejection, "upload rejected");
                self.transition(|state| state.on_upload_rejected(rejection.message.as_deref()))
                    .await;
                self.publish_error(UiErrorContext::Upload, &ClientError::Rejected(rejection));
                FlowOutcome::Rejected
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                self.transition(UiState::on_upload_error).await;
                self.publish_error(UiErrorContext::Upload, &err);
                FlowOutcome::Failed
            }
        }
    }

    /// Send control or Enter in the question input.
    pub async fn ask_question(&self) -> FlowOutcome {
        let Some(question) = self.transition(UiState::on_ask_started).await else {
            return FlowOutcome::Skipped;
        };
        self.send_question(question).await
    }

    async fn send_question(&self, question: String) -> FlowOutcome {
        debug!(question_len = question.len(), "asking question");

        match self.backend.ask(&question).await {
            Ok(answer) => {
                self.transition(|state| state.on_ask_success(answer)).await;
                FlowOutcome::Completed
            }
            Err(ClientError::Rejected(rejection)) => {
                warn!(error = %rejection, "question rejected");
                self.transition(|state| state.on_ask_rejected(rejection.message.as_deref()))
                    .await;
                self.publish_error(UiErrorContext::Ask, &ClientError::Rejected(rejection));
                FlowOutcome::Rejected
            }
            Err(err) => {
                warn!(error = %err, "ask failed");
                self.transition(UiState::on_ask_error).await;
                self.publish_error(UiErrorContext::Ask, &err);
                FlowOutcome::Failed
            }
        }
    }

    /// Types `text` into the question input, then asks.
    pub async fn submit_question(&self, text: &str) -> FlowOutcome {
        let Some(question) = self.transition(|state| state.on_submit(text)).await else {
            return FlowOutcome::Skipped;
        };
        self.send_question(question).await
    }

    pub async fn reset(&self) -> FlowOutcome {
        if !self.state.lock().await.layout().reset {
            return FlowOutcome::Skipped;
        }

        match self.backend.reset().await {
            Ok(()) => {
                info!("session reset");
                self.transition(UiState::on_reset_success).await;
                FlowOutcome::Completed
            }
            // Session and controls are left untouched on failure.
            Err(ClientError::Rejected(rejection)) => {
                warn!(error = %rejection, "reset rejected");
                self.transition(UiState::on_reset_rejected).await;
                self.publish_error(UiErrorContext::Reset, &ClientError::Rejected(rejection));
                FlowOutcome::Rejected
            }
            Err(err) => {
                warn!(error = %err, "reset failed");
                self.transition(UiState::on_reset_error).await;
                self.publish_error(UiErrorContext::Reset, &err);
                FlowOutcome::Failed
            }
        }
    }

    /// Mic control. The recognized text is placed in the question input, never sent.
    pub async fn start_dictation(&self) -> FlowOutcome {
        let DictationCapability::Available(recognizer) = &self.dictation else {
            return FlowOutcome::Skipped;
        };
        if !self.transition(UiState::on_dictation_started).await {
            return FlowOutcome::Skipped;
        }

        let outcome = match recognizer.recognize_once(&self.recognition).await {
            Ok(Some(text)) => {
                debug!(text_len = text.len(), "dictation captured");
                self.transition(|state| state.on_dictation_result(&text)).await;
                FlowOutcome::Completed
            }
            Ok(None) => {
                debug!("dictation ended without a result");
                FlowOutcome::Completed
            }
            Err(err) => {
                warn!(error = %err, "dictation failed");
                self.transition(UiState::on_dictation_error).await;
                self.publish_error(UiErrorContext::Dictation, &err);
                FlowOutcome::Failed
            }
        };

        self.transition(UiState::on_dictation_end).await;
        outcome
    }

    async fn transition<R>(&self, apply: impl FnOnce(&mut UiState) -> R) -> R {
        let (result, events) = {
            let mut state = self.state.lock().await;
            let result = apply(&mut state);
            (result, state.drain_events())
        };
        for event in events {
            let _ = self.events.send(event);
        }
        result
    }

    fn publish_error(&self, context: UiErrorContext, err: &ClientError) {
        let _ = self
            .events
            .send(UiEvent::Error(UiError::from_client_error(context, err)));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
