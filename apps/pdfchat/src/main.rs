use std::{
    path::PathBuf,
    sync::{Arc, Weak},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ClientController, CommandSpeechRecognizer, ControllerOptions, DictationCapability,
    FlowOutcome, HttpChatBackend, HttpOptions, RecognitionOptions, UiEvent, UiLayout,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinSet,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{parse_line, Command, HELP_TEXT};
use config::{load_settings, Settings};
use render::{render_snapshot, Renderer};

#[derive(Parser, Debug)]
#[command(about = "Chat with an uploaded PDF from the terminal")]
struct Args {
    /// Settings file (defaults to ./pdfchat.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// Speech-to-text command used for `:mic`.
    #[arg(long)]
    dictation_command: Option<String>,
    #[arg(long)]
    locale: Option<String>,
    /// Per-request timeout; requests wait indefinitely when unset.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Start with a PDF the server already holds for this session.
    #[arg(long)]
    resume_pdf: Option<String>,
    #[arg(long)]
    no_mic: bool,
    #[arg(long)]
    no_reset: bool,
    #[arg(long)]
    no_badge: bool,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = &self.dictation_command {
            settings.dictation_command = Some(v.clone());
        }
        if let Some(v) = &self.locale {
            settings.dictation_locale = v.clone();
        }
        if let Some(v) = self.timeout_secs {
            settings.request_timeout_secs = (v > 0).then_some(v);
        }
    }

    fn layout(&self) -> UiLayout {
        UiLayout {
            badge: !self.no_badge,
            reset: !self.no_reset,
            mic: !self.no_mic,
            transcript: true,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_to(&mut settings);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let backend = HttpChatBackend::with_options(
        &settings.server_url,
        HttpOptions {
            request_timeout: settings.request_timeout_secs.map(Duration::from_secs),
        },
    )
    .with_context(|| format!("failed to set up client for {}", settings.server_url))?;
    info!(server_url = %backend.base_url(), "pdfchat client ready");

    let dictation = settings
        .dictation_command
        .as_deref()
        .and_then(CommandSpeechRecognizer::from_command_line)
        .map(|recognizer| DictationCapability::Available(Arc::new(recognizer)))
        .unwrap_or_default();

    let controller = ClientController::new(
        Arc::new(backend),
        dictation,
        ControllerOptions {
            layout: args.layout(),
            recognition: RecognitionOptions::single_utterance(settings.dictation_locale.clone()),
            resume_pdf: args.resume_pdf.clone(),
        },
    );
    if let Some(notice) = controller.capability_notice().await {
        info!(reason = notice.message(), "dictation disabled");
    }

    let render_task = tokio::spawn(render_events(
        controller.subscribe_events(),
        Arc::downgrade(&controller),
    ));
    print_lines(&render_snapshot(&controller.snapshot().await));
    println!("Type :help for commands.");

    let mut flows = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_line(&line) {
            Command::Quit => {
                flows.abort_all();
                break;
            }
            Command::Help => println!("{HELP_TEXT}"),
            Command::Show => print_lines(&render_snapshot(&controller.snapshot().await)),
            Command::Unknown(name) => println!("unknown command :{name} (try :help)"),
            Command::Ask(text) => {
                let controller = Arc::clone(&controller);
                flows.spawn(async move {
                    let outcome = controller.submit_question(&text).await;
                    if !text.trim().is_empty() {
                        report_skipped(
                            outcome,
                            "question not sent; upload a PDF or wait for the answer",
                        );
                    }
                });
            }
            Command::SendCurrent => {
                let controller = Arc::clone(&controller);
                flows.spawn(async move {
                    controller.ask_question().await;
                });
            }
            Command::Upload(files) => {
                let controller = Arc::clone(&controller);
                flows.spawn(async move {
                    let outcome = controller.select_files(&files).await;
                    if !files.is_empty() {
                        report_skipped(outcome, "upload already in progress");
                    }
                });
            }
            Command::Reset => {
                let controller = Arc::clone(&controller);
                flows.spawn(async move {
                    report_skipped(controller.reset().await, "reset is not available");
                });
            }
            Command::Mic => {
                let controller = Arc::clone(&controller);
                flows.spawn(async move {
                    report_skipped(controller.start_dictation().await, "mic is disabled");
                });
            }
        }
        // Reap finished flows so the set does not grow with the session.
        while flows.try_join_next().is_some() {}
    }

    while let Some(joined) = flows.join_next().await {
        if let Err(err) = joined {
            if !err.is_cancelled() {
                warn!(error = %err, "flow task failed");
            }
        }
    }
    // Dropping the last controller closes the event channel and ends the renderer.
    drop(controller);
    let _ = render_task.await;
    Ok(())
}

async fn render_events(
    mut events: broadcast::Receiver<UiEvent>,
    controller: Weak<ClientController>,
) {
    let mut renderer = Renderer::default();
    loop {
        match events.recv().await {
            Ok(event) => print_lines(&renderer.render_event(&event)),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "renderer fell behind; redrawing");
                if let Some(controller) = controller.upgrade() {
                    print_lines(&render_snapshot(&controller.snapshot().await));
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn report_skipped(outcome: FlowOutcome, reason: &str) {
    if outcome == FlowOutcome::Skipped {
        println!("({reason})");
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
