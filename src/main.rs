use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dice_bot::application::errors::BotError;
use dice_bot::application::messaging::RoomDispatcher;
use dice_bot::application::services::{RollService, SessionManager};
use dice_bot::domain::traits::Transport;
use dice_bot::infrastructure::adapters::{ConsoleAdapter, MatrixAdapter};
use dice_bot::infrastructure::config::Config;
use dice_bot::infrastructure::storage::FileCredentialStore;

#[derive(Parser)]
#[command(name = "dice-bot")]
#[command(about = "A dice-rolling bot for Matrix rooms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// File holding the session token between runs
    #[arg(short, long, default_value = "token.txt")]
    session: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Join the configured rooms and answer rolls
    Run,
    /// Roll locally, reading messages from stdin
    Console,
    /// Show version
    Version,
    /// Print an example config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config, &cli.session),
        Commands::Console => run_console(&cli.config),
        Commands::Version => {
            println!("dice-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, BotError> {
    tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))
}

fn run_bot(config_path: &Path, session_path: &Path) -> Result<(), BotError> {
    let config = Config::load(config_path)?;
    tracing::info!("Starting dice-bot as {}", config.user_id());

    runtime()?.block_on(async {
        let homeserver = config.homeserver_url();
        let auth = Arc::new(MatrixAdapter::new(&homeserver, config.user_id())?);
        let store = Arc::new(FileCredentialStore::new(session_path));

        let mut session = SessionManager::new(auth, store);
        let credential = session.establish(&config.username, &config.password).await?;

        let transport = Arc::new(MatrixAdapter::new(&homeserver, config.user_id())?.with_credential(&credential));
        let result = serve(transport, config.room_aliases(), config.sync_timeout()).await;
        session.settle(result).await
    })
}

fn run_console(config_path: &Path) -> Result<(), BotError> {
    let rooms = if config_path.exists() {
        Config::load(config_path)?.rooms
    } else {
        vec!["console".to_string()]
    };
    tracing::info!("Starting console bot (dev mode), rooms: {}", rooms.join(", "));

    runtime()?.block_on(serve(Arc::new(ConsoleAdapter::new()), rooms, Duration::ZERO))
}

async fn serve(transport: Arc<dyn Transport>, rooms: Vec<String>, sync_timeout: Duration) -> Result<(), BotError> {
    let service = Arc::new(RollService::new(transport.clone()));
    let mut dispatcher = RoomDispatcher::new(transport, service).with_sync_timeout(sync_timeout);
    dispatcher.join_rooms(&rooms).await?;
    dispatcher.run().await
}

fn init_config() -> Result<(), BotError> {
    let yaml = serde_yaml::to_string(&Config::example())
        .map_err(|e| BotError::Internal(e.to_string()))?;
    println!("{}", yaml);
    println!("Save this to config.yaml and adjust as needed.");
    Ok(())
}
