use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chessbot::actuation::command_dispatcher::CommandDispatcher;
use chessbot::actuation::simulated_arm::SimulatedArm;
use chessbot::config::settings::Settings;
use chessbot::console::console_top::run_stdio_loop;
use chessbot::controllers::controller_registry::ControllerRegistry;
use chessbot::coordinator::game_session::GameSession;
use chessbot::coordinator::turn_coordinator::TurnCoordinator;
use chessbot::game_state::game_state::GameState;
use chessbot::persistence::snapshot::SnapshotStore;
use chessbot::utils::logging::init_logger;
use clap::Parser;

const DEFAULT_CONFIG_PATH: &str = "chessbot.toml";

#[derive(Parser)]
#[command(name = "chessbot")]
#[command(about = "Game coordination console for the assistive chess robot")]
struct Args {
    /// Path to the TOML configuration file (defaults to ./chessbot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Start from this position instead of the standard setup
    #[arg(long)]
    fen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => Settings::load(DEFAULT_CONFIG_PATH)?,
        None => Settings::default(),
    };
    if args.json_logs {
        settings.logging.json = true;
    }
    init_logger(&settings.logging, args.verbose);

    let game = match &args.fen {
        Some(fen) => GameState::from_fen(fen)?,
        None => GameState::new_game(),
    };
    let coordinator = TurnCoordinator::with_game(game, settings.actuation_policy()).with_clock(settings.game_clock());

    let arm = SimulatedArm::new(settings.simulated_motion());
    let dispatcher = CommandDispatcher::new(Arc::new(arm), settings.dispatch_config());
    let mut session = GameSession::new(coordinator, dispatcher, settings.ack_timeout());
    if let Some(path) = &settings.persistence.snapshot_path {
        session = session.with_snapshots(SnapshotStore::new(path), settings.persistence.autosave);
    }
    if settings.persistence.restore_on_start && session.load_snapshot().await? {
        tracing::info!("previous game restored");
    }

    let session = Arc::new(session);
    if settings.game_clock().is_some() {
        spawn_flag_watch(Arc::clone(&session));
    }

    let mut registry = ControllerRegistry::new(settings.heartbeat_timeout());
    registry.register(&settings.controllers.board_id, env!("CARGO_PKG_VERSION"))?;

    tracing::info!(
        actuated = ?settings.actuation_policy().sides(),
        board_id = %settings.controllers.board_id,
        "console ready, type 'help' for commands"
    );
    run_stdio_loop(session, registry).await?;
    Ok(())
}

/// Ends a timed game when the side to move runs out, even if nobody types.
fn spawn_flag_watch(session: Arc<GameSession>) {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(Duration::from_millis(250));
        loop {
            ticks.tick().await;
            if let Some(result) = session.check_clock().await {
                tracing::info!(%result, "game ended on time");
            }
        }
    });
}
