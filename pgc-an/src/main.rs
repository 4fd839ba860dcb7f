//! pgc-an - Profile gender checker analyzer
//!
//! Serves the page-context and protocol API, or runs one-shot commands
//! against a page file or a running analyzer.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pgc_common::config::{load_config, resolve_config_path, PgcConfig};
use pgc_common::events::{EventBus, RunTrigger};
use serde_json::json;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgc_an::client::ProtocolClient;
use pgc_an::config::{resolve_api_token_without_db, SettingsTokenProvider};
use pgc_an::page::status::page_status;
use pgc_an::page::PageDocument;
use pgc_an::sequencer::{ReconciliationSequencer, RunReport};
use pgc_an::signals::{ImageClassifierClient, NameServiceClient, StaticToken, TokenProvider};
use pgc_an::sink::OverlaySink;
use pgc_an::AppState;

/// Command-line arguments for pgc-an
#[derive(Parser, Debug)]
#[command(name = "pgc-an")]
#[command(about = "Profile gender checker analyzer")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, global = true, env = "PGC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long, env = "PGC_PORT")]
        port: Option<u16>,

        /// SQLite database path (overrides config)
        #[arg(short, long, env = "PGC_DATABASE")]
        database: Option<PathBuf>,
    },

    /// Analyze a saved page once and print the verdict as JSON
    ///
    /// A stored token is read only when the database file already exists.
    Check {
        /// Page URL
        #[arg(long)]
        url: String,

        /// File holding the page HTML
        #[arg(long)]
        html: PathBuf,

        /// Skip the profile-page check, like a manual re-check
        #[arg(long)]
        force: bool,
    },

    /// Tell whether a URL looks like a profile page
    Status {
        #[arg(long)]
        url: String,
    },

    /// Ask a running analyzer to re-check its current page
    ForceCheck {
        #[arg(long, default_value = "http://127.0.0.1:5780")]
        server: String,
    },

    /// Store the API token in a running analyzer; omit TOKEN to clear it
    SetToken {
        #[arg(long, default_value = "http://127.0.0.1:5780")]
        server: String,

        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = load_config(config_path.as_deref());

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pgc_an={level},tower_http={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Serve { port, database } => serve(config, port, database).await,
        Command::Check { url, html, force } => check(config, url, html, force).await,
        Command::Status { url } => {
            let status = page_status(&url);
            println!("{}", status.message());
            Ok(())
        }
        Command::ForceCheck { server } => {
            match ProtocolClient::new(server).force_check().await {
                Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                None => println!("No analyzer responded; nothing to re-check"),
            }
            Ok(())
        }
        Command::SetToken { server, token } => {
            match ProtocolClient::new(server).set_api_token(token).await {
                Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                None => println!("No analyzer responded; token not changed"),
            }
            Ok(())
        }
    }
}

async fn serve(
    mut config: PgcConfig,
    port: Option<u16>,
    database: Option<PathBuf>,
) -> Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(database) = database {
        config.database_path = database;
    }

    info!("Starting pgc-an (Profile Gender Checker analyzer)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());

    let db_pool = pgc_an::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let event_bus = EventBus::new(100);
    let port = config.port;

    let state = AppState::new(db_pool, event_bus, config);
    let app = pgc_an::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn check(config: PgcConfig, url: String, html: PathBuf, force: bool) -> Result<()> {
    let html = std::fs::read_to_string(&html)
        .with_context(|| format!("Failed to read {}", html.display()))?;

    // Only read a stored token from an existing database; a one-shot check
    // never creates one
    let tokens: Arc<dyn TokenProvider> = if config.database_path.exists() {
        let db_pool = pgc_an::db::init_database(&config.database_path)
            .await
            .context("Failed to open database")?;
        Arc::new(SettingsTokenProvider::new(db_pool, config.clone()))
    } else {
        let token = resolve_api_token_without_db(&config).map(|(token, source)| {
            info!("Using API token from {}", source);
            token
        });
        Arc::new(StaticToken(token))
    };
    let names = Arc::new(NameServiceClient::new(
        config.endpoints.name_service_url.clone(),
        config.thresholds.name_probability,
    ));
    let pictures = Arc::new(ImageClassifierClient::new(
        config.endpoints.image_classifier_url.clone(),
        config.endpoints.authenticated_classifier_url.clone(),
        tokens,
        config.thresholds.picture_score,
    ));
    let sink = Arc::new(OverlaySink::new(
        EventBus::new(16),
        config.timing.status_dismiss(),
    ));

    let mut timing = pgc_common::config::TimingConfig::immediate();
    timing.picture_timeout_ms = config.timing.picture_timeout_ms;

    let sequencer = ReconciliationSequencer::new(names, pictures, sink, timing);
    let trigger = if force {
        RunTrigger::Manual
    } else {
        RunTrigger::PageLoad
    };

    let report = sequencer
        .run(trigger, Some(PageDocument::new(url, html)))
        .await;

    let output = match report {
        RunReport::Skipped { reason, .. } => json!({ "skipped": reason }),
        RunReport::Completed { verdict, .. } => json!({
            "verdict": verdict,
            "summary": verdict.summary(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
