//! Optional speech-to-text capability feeding the question input.

use std::{fmt, process::Stdio, sync::Arc};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ClientError;

pub const DEFAULT_DICTATION_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u8,
}

impl RecognitionOptions {
    /// One utterance, final result only, best alternative only.
    pub fn single_utterance(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self::single_utterance(DEFAULT_DICTATION_LOCALE)
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listens for one utterance. `Ok(None)` means recognition ended without a result.
    async fn recognize_once(
        &self,
        options: &RecognitionOptions,
    ) -> Result<Option<String>, ClientError>;
}

#[derive(Clone, Default)]
pub enum DictationCapability {
    Available(Arc<dyn SpeechRecognizer>),
    #[default]
    Unavailable,
}

impl DictationCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, DictationCapability::Available(_))
    }
}

impl fmt::Debug for DictationCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictationCapability::Available(_) => f.write_str("Available"),
            DictationCapability::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Runs an external speech-to-text program and reads the transcript from its stdout.
///
/// The program receives the locale in `DICTATION_LOCALE`. The first non-empty
/// output line is the result; no output means nothing was recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpeechRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandSpeechRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a whitespace-separated command line. Returns `None` when blank.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl SpeechRecognizer for CommandSpeechRecognizer {
    async fn recognize_once(
        &self,
        options: &RecognitionOptions,
    ) -> Result<Option<String>, ClientError> {
        debug!(program = %self.program, locale = %options.locale, "starting dictation command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .env("DICTATION_LOCALE", &options.locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| ClientError::Dictation(format!("failed to run {}: {err}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Dictation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_utterance_options_match_dictation_defaults() {
        let options = RecognitionOptions::default();
        assert_eq!(options.locale, "en-US");
        assert!(!options.continuous);
        assert!(!options.interim_results);
        assert_eq!(options.max_alternatives, 1);
    }

    #[test]
    fn command_line_is_split_into_program_and_args() {
        let recognizer =
            CommandSpeechRecognizer::from_command_line("  whisper-listen --model base.en ")
                .expect("command");
        assert_eq!(recognizer.program(), "whisper-listen");
        assert_eq!(recognizer.args, vec!["--model", "base.en"]);
        assert!(CommandSpeechRecognizer::from_command_line("   ").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_output_first_line_is_the_transcript() {
        let recognizer = CommandSpeechRecognizer::new(
            "sh",
            vec![
                "-c".to_string(),
                "printf '\\n  what is the refund policy  \\nsecond\\n'".to_string(),
            ],
        );
        let text = recognizer
            .recognize_once(&RecognitionOptions::default())
            .await
            .expect("recognize");
        assert_eq!(text.as_deref(), Some("what is the refund policy"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_receives_locale_from_options() {
        let recognizer = CommandSpeechRecognizer::new(
            "sh",
            vec!["-c".to_string(), "echo \"$DICTATION_LOCALE\"".to_string()],
        );
        let text = recognizer
            .recognize_once(&RecognitionOptions::single_utterance("de-DE"))
            .await
            .expect("recognize");
        assert_eq!(text.as_deref(), Some("de-DE"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_output_means_no_result() {
        let recognizer = CommandSpeechRecognizer::new("true", Vec::new());
        let text = recognizer
            .recognize_once(&RecognitionOptions::default())
            .await
            .expect("recognize");
        assert_eq!(text, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_is_a_dictation_error() {
        let recognizer = CommandSpeechRecognizer::new(
            "sh",
            vec!["-c".to_string(), "echo 'no microphone' >&2; exit 3".to_string()],
        );
        let err = recognizer
            .recognize_once(&RecognitionOptions::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, ClientError::Dictation(ref msg) if msg.contains("no microphone")));
    }
}
