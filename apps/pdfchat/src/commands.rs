//! Line commands typed at the prompt.

use std::path::PathBuf;

pub const HELP_TEXT: &str = "\
Type a question and press Enter to send it.
  <empty line>      send the text currently in the question field
  :upload <path>    choose a PDF to upload
  :reset            forget the current PDF and conversation
  :mic              dictate a question (review it, then press Enter)
  :show             redraw the page
  :help             show this help
  :quit             exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Text typed into the question field, followed by Enter.
    Ask(String),
    /// Enter on whatever the question field already holds.
    SendCurrent,
    /// File picker result; empty when nothing was chosen.
    Upload(Vec<PathBuf>),
    Reset,
    Mic,
    Show,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Command::SendCurrent;
    }

    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return Command::Ask(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "upload" | "u" => Command::Upload(parse_path(arg).into_iter().collect()),
        "reset" => Command::Reset,
        "mic" | "voice" => Command::Mic,
        "show" => Command::Show,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn parse_path(arg: &str) -> Option<PathBuf> {
    let unquoted = arg
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| arg.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(arg);
    (!unquoted.is_empty()).then(|| PathBuf::from(unquoted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_line("What is the refund policy?\n"),
            Command::Ask("What is the refund policy?".to_string())
        );
        assert_eq!(parse_line("   "), Command::Ask("   ".to_string()));
    }

    #[test]
    fn empty_line_sends_current_field() {
        assert_eq!(parse_line("\n"), Command::SendCurrent);
        assert_eq!(parse_line(""), Command::SendCurrent);
    }

    #[test]
    fn upload_accepts_quoted_paths_with_spaces() {
        assert_eq!(
            parse_line(":upload \"/tmp/Policy Handbook.pdf\""),
            Command::Upload(vec![PathBuf::from("/tmp/Policy Handbook.pdf")])
        );
        assert_eq!(
            parse_line(":u docs/doc.pdf"),
            Command::Upload(vec![PathBuf::from("docs/doc.pdf")])
        );
    }

    #[test]
    fn upload_without_path_is_an_empty_selection() {
        assert_eq!(parse_line(":upload"), Command::Upload(Vec::new()));
        assert_eq!(parse_line(":upload   ''"), Command::Upload(Vec::new()));
    }

    #[test]
    fn named_commands_are_case_insensitive() {
        assert_eq!(parse_line(":RESET"), Command::Reset);
        assert_eq!(parse_line(":mic"), Command::Mic);
        assert_eq!(parse_line(":q"), Command::Quit);
        assert_eq!(parse_line(":show"), Command::Show);
        assert_eq!(parse_line(":?"), Command::Help);
        assert_eq!(
            parse_line(":frobnicate now"),
            Command::Unknown("frobnicate".to_string())
        );
    }
}
