/// Voice Server - multi-tenant voice-stream playback host
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice_server::{
    announcer::spawn_announcer, api, catalog::CatalogTrackSource, config::ServerConfig,
    state::AppState,
};

#[derive(Parser)]
#[command(name = "voice-server")]
#[command(about = "Multi-tenant voice-stream playback controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Load and validate configuration and catalog, then exit
    CheckConfig {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "voice_server=info,voice_playback=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(config).await?;
        }
        Commands::CheckConfig { config } => {
            check_config(config).await?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<(ServerConfig, CatalogTrackSource)> {
    let config = ServerConfig::load(path.as_deref())?;
    config.validate()?;

    let catalog = CatalogTrackSource::load(&config.catalog.path)
        .await
        .with_context(|| format!("Failed to load catalog {:?}", config.catalog.path))?;

    Ok((config, catalog))
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, catalog) = load_config(config_path).await?;

    tracing::info!("Starting Voice Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!(
        "Queue capacity {}, engine speed {}x",
        config.playback.queue_capacity,
        config.engine.speed
    );

    let app_state = AppState::new(Arc::new(catalog), &config.engine, config.playback.clone());
    spawn_announcer(app_state.controller.subscribe());
    let controller = app_state.controller.clone();

    let app = api::router(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Workers stop their streams on the way out; each engine call is timeout-bounded
    let grace = config.playback.engine_timeout() * 2;
    if tokio::time::timeout(grace, controller.shutdown()).await.is_err() {
        tracing::warn!("Playback workers still busy after {:?}, exiting anyway", grace);
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn check_config(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, catalog) = load_config(config_path).await?;

    println!("Configuration OK");
    println!("  listen:   {}:{}", config.server.host, config.server.port);
    println!("  catalog:  {} tracks", catalog.len());
    println!("  capacity: {} per tenant", config.playback.queue_capacity);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
