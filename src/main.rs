use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use relay_bot::application::errors::{BotError, ConfigError};
use relay_bot::application::messaging::{EventDispatcher, Outbox};
use relay_bot::application::services::{
    bootstrap_identity, ContactResolver, GroupReconciler, RelayBridge,
};
use relay_bot::domain::traits::Session;
use relay_bot::infrastructure::adapters::{http, ConsoleSession, HttpDirectory, HttpState};
use relay_bot::infrastructure::config::Config;
use relay_bot::infrastructure::storage::{AddressBook, GroupDirectory};

#[derive(Parser)]
#[command(name = "relay-bot")]
#[command(about = "HTTP to messaging-session relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// HTTP listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to start runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match rt.block_on(run_relay(&cli.config, cli.listen)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("{}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Version => {
            println!("relay-bot v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => init_config(&cli.config),
    }
}

fn init_config(path: &str) -> ExitCode {
    if Path::new(path).exists() {
        tracing::error!("{} already exists, not overwriting", path);
        return ExitCode::FAILURE;
    }
    let yaml = match Config::default().to_yaml() {
        Ok(yaml) => yaml,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    match std::fs::write(path, yaml) {
        Ok(()) => {
            println!("Wrote default config to {}", path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to write {}: {}", path, e);
            ExitCode::FAILURE
        }
    }
}

async fn run_relay(config_path: &str, listen_override: Option<String>) -> Result<(), BotError> {
    let mut config = Config::resolve(config_path)?;
    if let Some(listen) = listen_override {
        config.http.listen = listen;
        config.validate()?;
    }
    if !config.storage.home.as_os_str().is_empty() {
        tokio::fs::create_dir_all(&config.storage.home)
            .await
            .map_err(|e| {
                ConfigError::InvalidValue(format!("storage.home {}: {}", config.storage.home.display(), e))
            })?;
    }

    let session = ConsoleSession::new(config.relay.channel_capacity);

    let identity = bootstrap_identity(&session, &config.identity_path(), &config.identity.passphrase)
        .await?
        .with_nickname(config.bot.nickname.clone());
    tracing::info!("Using ID: {} ({})", identity, identity.nickname);

    let contacts = Arc::new(AddressBook::open(config.address_book_path()).await?);
    let groups = Arc::new(GroupDirectory::open(config.group_directory_path()).await?);

    tracing::info!("Starting session");
    let (outbound, inbound) = session.start(&identity).await?;
    let outbox = Outbox::new(identity.id.clone(), outbound);

    let directory = Arc::new(HttpDirectory::new(
        config.directory.base_url.clone(),
        config.directory_timeout(),
    )?);
    let resolver = Arc::new(ContactResolver::new(contacts.clone(), directory));
    let bridge = RelayBridge::new(resolver, groups.clone(), outbox.clone())
        .with_group_settle_delay(config.group_settle_delay());

    let listener = tokio::net::TcpListener::bind(config.listen_addr()?)
        .await
        .map_err(|e| BotError::Network(format!("binding {}: {}", config.http.listen, e)))?;
    let state = HttpState {
        own_id: identity.id.clone(),
        bridge: Arc::new(bridge),
        contacts,
        groups: groups.clone(),
    };
    tokio::spawn(async move {
        if let Err(e) = http::serve(listener, state).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    });

    let dispatcher = EventDispatcher::new(
        outbox,
        GroupReconciler::new(identity.id.clone(), groups),
        config.dispatcher_options(),
    );
    dispatcher.run(inbound).await
}
