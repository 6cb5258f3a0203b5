//! `moodchat chat` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::core::aggregator::AnalysisOptions;
use crate::core::alerts::AlertMonitor;
use crate::core::session::ChatSession;
use crate::error::Result;
use crate::providers::{Classifier, ResponseProvider, build_classifier, build_provider};
use crate::report;
use crate::storage::SessionStore;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

const HELP: &str = "\
Commands:
  /analyze   analyze the sentiment of your messages
  /history   show the conversation so far
  /clear     discard the conversation
  /save      save the session
  /quit      save and exit";

/// Slash command entered in the chat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Analyze,
    History,
    Clear,
    Save,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse a line starting with `/`. Returns `None` for ordinary messages.
    fn parse(line: &str) -> Option<Self> {
        let name = line.strip_prefix('/')?.split_whitespace().next().unwrap_or("");
        Some(match name.to_lowercase().as_str() {
            "analyze" | "analyse" => Self::Analyze,
            "history" => Self::History,
            "clear" => Self::Clear,
            "save" => Self::Save,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Run the chat command.
///
/// Resumes `session_id` if it was saved before, otherwise starts a new
/// session. The session is saved on `/save` and on exit. A stored session
/// that was cleared is saved empty, so the cleared turns do not come back.
///
/// # Errors
///
/// Returns an error if configuration, the provider, or storage cannot be
/// set up. Provider and classifier failures during the chat are reported
/// inline.
pub fn run(session_id: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let provider = build_provider(&config.provider)?;
    let classifier = build_classifier(&config.classifier)?;

    let (session, persisted) = match session_id {
        Some(id) => match store.get_session(id)? {
            Some(record) => {
                info!(session = id, turns = record.turns.len(), "resuming session");
                (ChatSession::from_record(record), true)
            }
            None => (ChatSession::with_id(id), false),
        },
        None => (ChatSession::new(), false),
    };

    let mut chat = ChatLoop {
        session: session.with_alerts(AlertMonitor::from_config(&config.alerts)),
        persisted,
        provider: provider.as_ref(),
        classifier: classifier.as_ref(),
        store: &store,
        options: config.analysis.options(),
    };

    let stdin = io::stdin();
    chat.run(stdin.lock(), io::stdout().lock())
}

struct ChatLoop<'a> {
    session: ChatSession,
    /// Whether the store holds a record for this session.
    persisted: bool,
    provider: &'a dyn ResponseProvider,
    classifier: &'a dyn Classifier,
    store: &'a dyn SessionStore,
    options: AnalysisOptions,
}

impl ChatLoop<'_> {
    fn run(&mut self, mut input: impl BufRead, mut out: impl Write) -> Result<()> {
        writeln!(
            out,
            "moodchat session {} ({}). Type /help for commands.",
            self.session.id(),
            self.provider.name()
        )?;

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match Command::parse(line) {
                Some(Command::Quit) => break,
                Some(command) => self.handle_command(&command, &mut out)?,
                None => self.handle_message(line, &mut out)?,
            }
        }

        if self.persisted || !self.session.conversation().is_empty() {
            self.save(&mut out)?;
        }
        Ok(())
    }

    fn handle_message(&mut self, text: &str, out: &mut impl Write) -> Result<()> {
        match self.session.send(self.provider, text) {
            Ok(reply) => writeln!(out, "{}", reply.text())?,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                return Ok(());
            }
        }

        match self.session.screen(self.classifier, text) {
            Ok(Some(alert)) => writeln!(out, "{}", report::render_alert(&alert))?,
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "mood check failed");
                writeln!(out, "warning: mood check failed: {e}")?;
            }
        }
        Ok(())
    }

    fn handle_command(&mut self, command: &Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::Analyze => match self.session.analyze(self.classifier, &self.options) {
                Ok(analysis) => write!(out, "{}", report::render(analysis))?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::History => {
                if self.session.conversation().is_empty() {
                    writeln!(out, "(no messages yet)")?;
                } else {
                    writeln!(out, "{}", self.session.conversation().transcript())?;
                }
            }
            Command::Clear => {
                self.session.clear();
                writeln!(out, "Conversation cleared.")?;
            }
            Command::Save => self.save(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Unknown(name) => {
                writeln!(out, "unknown command: /{name} (try /help)")?;
            }
            // Handled by the loop
            Command::Quit => {}
        }
        Ok(())
    }

    fn save(&mut self, out: &mut impl Write) -> Result<()> {
        self.store.put_session(&self.session.to_record())?;
        self.persisted = true;
        writeln!(out, "Saved session {}", self.session.id())?;
        Ok(())
    }
}
