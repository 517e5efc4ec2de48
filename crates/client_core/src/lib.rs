//! Client controller for the PDF chat service: UI state, flows, and backend plumbing.

pub mod controller;
pub mod dictation;
pub mod error;
pub mod events;
pub mod transport;
pub mod types;

pub use controller::{ClientController, ControllerOptions, FlowOutcome};
pub use dictation::{
    CommandSpeechRecognizer, DictationCapability, RecognitionOptions, SpeechRecognizer,
    DEFAULT_DICTATION_LOCALE,
};
pub use error::ClientError;
pub use events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};
pub use transport::{ChatBackend, HttpChatBackend, HttpOptions, PdfUpload};
pub use types::{
    Control, ControlStates, MessageEntry, MicControl, PdfBadge, Transcript, UiLayout, UiSnapshot,
    UiState,
};
