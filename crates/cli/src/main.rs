//! mathtiles CLI - memory tiles and arithmetic with saved progress.

mod config;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mathtiles_core::{NoopSink, PlayerIdentity, ProgressSink, MIN_LEVEL};
use mathtiles_game::{GameRunner, GameState};
use mathtiles_progress::{LedgerSink, ProgressLedger};
use mathtiles_storage::FirestoreRestStore;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::terminal::TerminalDisplay;

#[derive(Parser)]
#[command(name = "mathtiles")]
#[command(about = "Remember the tiles, then solve the sum", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Web API key of the document store
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Project id of the document store
    #[arg(long, global = true)]
    project_id: Option<String>,

    /// Logged-in username
    #[arg(short, long, global = true, conflicts_with = "player_id")]
    username: Option<String>,

    /// Saved account document id
    #[arg(long, global = true)]
    player_id: Option<String>,

    /// Play without saving progress
    #[arg(long, global = true)]
    offline: bool,

    /// Seed for repeatable sequences
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Commands {
    /// Play in the terminal (default)
    Play,
    /// Print the stored level
    Level,
    /// Start a new session record and print its number
    Session,
}

impl Cli {
    fn player(&self) -> Option<PlayerIdentity> {
        match (&self.username, &self.player_id) {
            (Some(name), _) => Some(PlayerIdentity::username(name.as_str())),
            (None, Some(id)) => Some(PlayerIdentity::document_id(id.as_str())),
            (None, None) => None,
        }
    }

    fn require_player(&self) -> Result<PlayerIdentity> {
        self.player()
            .context("--username or --player-id is required")
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_ledger(config: &AppConfig) -> Result<ProgressLedger> {
    let store = FirestoreRestStore::new(config.firestore()?)
        .context("Failed to create store client")?;
    Ok(ProgressLedger::new(Arc::new(store)).with_schema(config.schema.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = AppConfig::discover(cli.config.as_deref())?
        .with_overrides(cli.api_key.clone(), cli.project_id.clone());

    match cli.command.unwrap_or(Commands::Play) {
        Commands::Play => play(&cli, &config).await?,
        Commands::Level => {
            let player = cli.require_player()?;
            let ledger = open_ledger(&config)?;
            match ledger.load_account_level(&player).await? {
                Some(level) => println!("{}: level {}", player, level),
                None => println!("No account for {}", player),
            }
        }
        Commands::Session => {
            let player = cli.require_player()?;
            let ledger = open_ledger(&config)?;
            let level = ledger
                .load_account_level(&player)
                .await?
                .unwrap_or(MIN_LEVEL);
            let session = ledger.resolve_or_create_session(&player, level).await?;
            println!(
                "Created session {} for {} at level {}",
                session.number, player, level
            );
        }
    }

    Ok(())
}

/// Load progress, play until `quit` or end of input, then flush writes.
async fn play(cli: &Cli, config: &AppConfig) -> Result<()> {
    let mut level = MIN_LEVEL;
    let mut recorder: Option<Arc<LedgerSink>> = None;

    if cli.offline {
        info!("Offline, progress will not be saved");
    } else if let Some(player) = cli.player() {
        let ledger = Arc::new(open_ledger(config)?);

        level = match ledger.load_account_level(&player).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                warn!("No account for {}, starting at level {}", player, MIN_LEVEL);
                MIN_LEVEL
            }
            Err(e) => {
                warn!("Could not load level for {}: {}", player, e);
                MIN_LEVEL
            }
        };

        let session = match ledger.resolve_or_create_session(&player, level).await {
            Ok(session) => {
                info!("Session {} started for {}", session.number, player);
                Some(session)
            }
            Err(e) => {
                warn!("Could not start a session for {}: {}", player, e);
                None
            }
        };

        recorder = Some(Arc::new(LedgerSink::new(ledger, player, session)));
    } else {
        warn!("No player given, progress will not be saved");
    }

    let sink: Arc<dyn ProgressSink> = match &recorder {
        Some(recorder) => recorder.clone(),
        None => Arc::new(NoopSink),
    };

    let mut state = GameState::new(Arc::new(TerminalDisplay::stdout()), sink)
        .with_level(level)
        .with_policy(config.failure_policy)
        .with_timing(config.timing)
        .with_engine(config.expression_engine()?);
    if let Some(seed) = cli.seed {
        state = state.with_seed(seed);
    }

    println!("Watch the tiles, type them back (e.g. `4 2 3`), then type the answer.");
    println!("Type `{}` to stop.", terminal::QUIT);

    let (tx, rx) = mpsc::channel(32);
    let input = tokio::spawn(terminal::read_events(
        BufReader::new(tokio::io::stdin()),
        state.subscribe_phase(),
        tx,
    ));

    let summary = GameRunner::new(state).run(rx).await;
    match input.await {
        Ok(Err(e)) => warn!("Input error: {}", e),
        Err(e) => warn!("Input task failed: {}", e),
        Ok(Ok(())) => {}
    }

    println!(
        "Finished at level {} after {} rounds ({}s).",
        summary.level,
        summary.rounds,
        summary.elapsed.as_secs()
    );

    if let Some(recorder) = recorder {
        recorder.drain().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_play() {
        let cli = Cli::try_parse_from(["mathtiles", "--offline"]).unwrap();
        assert_eq!(cli.command, None);
        assert!(cli.offline);
        assert!(cli.player().is_none());
    }

    #[test]
    fn test_player_identity_flags() {
        let cli = Cli::try_parse_from(["mathtiles", "level", "--username", "lizzy"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Level));
        assert_eq!(cli.player(), Some(PlayerIdentity::username("lizzy")));

        let cli = Cli::try_parse_from(["mathtiles", "--player-id", "abc123", "session"]).unwrap();
        assert_eq!(cli.player(), Some(PlayerIdentity::document_id("abc123")));

        assert!(Cli::try_parse_from(["mathtiles", "-u", "a", "--player-id", "b"]).is_err());
    }

    #[test]
    fn test_require_player() {
        let cli = Cli::try_parse_from(["mathtiles", "level"]).unwrap();
        assert!(cli.require_player().is_err());
    }
}
