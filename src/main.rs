//! moodchat CLI - Terminal chat with sentiment analysis.

use clap::{Parser, Subcommand};
use moodchat::{cli, config};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "moodchat")]
#[command(author, version, about = "Terminal chat with sentiment analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume an interactive chat.
    Chat {
        /// Session ID to resume (or create).
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Analyze the sentiment of a saved session.
    Analyze {
        /// Session ID.
        session_id: String,

        /// Number of key moments to show.
        #[arg(long)]
        top_k: Option<usize>,

        /// Skip emotion classification.
        #[arg(long)]
        no_emotions: bool,
    },

    /// List recent sessions.
    List {
        /// Maximum number of sessions to show. Defaults to 20.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a saved session as JSON.
    Show {
        /// Session ID.
        session_id: String,
    },

    /// Export a saved session.
    Export {
        /// Session ID.
        session_id: String,

        /// Output format (json or csv).
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include sentiment analysis.
        #[arg(long)]
        with_analysis: bool,
    },

    /// Remove old sessions.
    Clean {
        /// Duration (e.g., "7d", "30d", "24h"). Defaults to the configured retention.
        #[arg(long)]
        before: Option<String>,

        /// Remove all sessions.
        #[arg(long)]
        all: bool,
    },

    /// Serve the JSON HTTP API.
    Serve {
        /// Address to listen on. Defaults to the configured address.
        #[arg(short, long)]
        bind: Option<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MOODCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env_file = config::load_env_file(&config::get_moodchat_home());
    init_logging();
    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let result = match cli.command {
        Commands::Chat { session } => cli::chat::run(session.as_deref()),
        Commands::Analyze {
            session_id,
            top_k,
            no_emotions,
        } => cli::analyze::run(&session_id, top_k, no_emotions),
        Commands::List { limit } => cli::list::run(limit),
        Commands::Show { session_id } => cli::show::run(&session_id),
        Commands::Export {
            session_id,
            format,
            output,
            with_analysis,
        } => cli::export::run(&session_id, &format, output.as_deref(), with_analysis),
        Commands::Clean { before, all } => cli::clean::run(before.as_deref(), all),
        Commands::Serve { bind } => cli::serve::run(bind.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("moodchat: error: {e}");
            if e.is_external() {
                eprintln!("moodchat: hint: check network access and API credentials");
            }
            ExitCode::FAILURE
        }
    }
}
