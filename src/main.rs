// src/main.rs

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dudil::chat::{ChatEngine, GENERATION_APOLOGY};
use dudil::config::DudilConfig;
use dudil::error::DudilError;
use dudil::server::{self, AppState};
use dudil::store::ConversationStore;

#[derive(Parser)]
#[command(name = "dudil", about = "Emotion-aware chatbot", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API for the chat widget
    Serve,
    /// Chat interactively in the terminal
    Chat {
        /// Continue an existing conversation instead of starting a new one
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List stored conversations, most recently active first
    List,
    /// Delete a conversation (no-op if it does not exist)
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Only a missing API key may stop the process; everything after this
    // point degrades instead of exiting.
    let config = match DudilConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = ConversationStore::load(&config.history_file)?;

    match cli.command {
        Command::Serve => {
            info!("Starting Dudil (model: {})", config.gemini_model);
            info!("Emotion model: {}", config.emotion_model);
            let state = Arc::new(AppState {
                engine: ChatEngine::from_config(&config),
                store: Mutex::new(store),
            });
            server::serve(state, &config.host, config.port).await?;
        }
        Command::Chat { conversation } => {
            run_repl(&config, store, conversation).await?;
        }
        Command::List => {
            let summaries = store.list();
            if summaries.is_empty() {
                println!("No conversations yet.");
            }
            for s in summaries {
                println!(
                    "{}  {:>3} turns  last active {}  {}",
                    s.id,
                    s.turn_count,
                    s.last_active_at.format("%Y-%m-%d %H:%M"),
                    s.title
                );
            }
        }
        Command::Delete { id } => {
            let mut store = store;
            store.delete(&id)?;
            println!("Deleted {} (if it existed).", id);
        }
    }

    Ok(())
}

/// Terminal chat loop. Each line is one turn; Ctrl-D or "/quit" exits.
async fn run_repl(
    config: &DudilConfig,
    mut store: ConversationStore,
    conversation: Option<String>,
) -> anyhow::Result<()> {
    let engine = ChatEngine::from_config(config);

    let conversation_id = match conversation {
        Some(id) => {
            if store.get(&id).is_none() {
                anyhow::bail!("conversation {} no longer exists", id);
            }
            id
        }
        None => store.create()?,
    };

    println!("Dudil - emotion-aware chat (conversation {})", conversation_id);
    println!("Type your message, or /quit to exit.\n");

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        match engine.respond(&mut store, &conversation_id, line).await {
            Ok(outcome) => {
                println!(
                    "[{} {}  intensity {}/5  confidence {:.1}%]",
                    outcome.emotion,
                    outcome.emotion.emoji(),
                    outcome.intensity,
                    outcome.confidence * 100.0
                );
                println!("dudil> {}\n", outcome.reply);
            }
            Err(e @ DudilError::Generation(_)) => {
                tracing::warn!(error = %e, "generation failed; turn not recorded");
                println!("dudil> {}\n", GENERATION_APOLOGY);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
