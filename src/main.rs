use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use command_api::{
    build_router,
    config::{AppConfig, StoreKind},
    infrastructure::{
        CommandStore, in_memory_command_store::InMemoryCommandStore,
        postgres_command_store::PostgresCommandStore,
    },
    state::AppState,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "CRUD REST API for shell commands", long_about = None)]
struct Cli {
    /// Address to listen on (overrides COMMAND_API_BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Backing store (overrides COMMAND_API_STORE)
    #[arg(long, value_enum)]
    store: Option<StoreKind>,

    /// Include failure details in 5xx responses
    #[arg(long)]
    development: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(store) = cli.store {
        config.store = store;
    }
    config.development |= cli.development;

    let store = open_store(&config).await?;
    let state = AppState::new(store).with_development(config.development);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        bind_addr = %config.bind_addr,
        store = %config.store,
        development = config.development,
        "command API started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn CommandStore>> {
    match config.store {
        StoreKind::Memory => Ok(Arc::new(InMemoryCommandStore::new())),
        StoreKind::Postgres => {
            let options = config.database.connect_options()?;
            info!(
                host = options.get_host(),
                port = options.get_port(),
                database = options.get_database().unwrap_or_default(),
                username = options.get_username(),
                "connecting to PostgreSQL"
            );

            let store = PostgresCommandStore::connect(options, config.database.max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            store
                .migrate()
                .await
                .context("failed to run migrations")?;

            Ok(Arc::new(store))
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("command_api=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
