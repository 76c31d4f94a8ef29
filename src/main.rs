//! Agrirelay HTTP server
//!
//! Starts an Axum web server that relays farmer chat to a local generation
//! endpoint and serves crop predictions.

use agrirelay::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    telemetry,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // Load configuration (falls back to defaults + environment when the file is absent)
    let config_found = std::path::Path::new(&cli.config).exists();
    let config = Config::load(&cli.config)?;

    // Initialize telemetry
    telemetry::init(&config.observability.log_level);

    if !config_found {
        tracing::warn!(
            path = %cli.config,
            "Config file not found, running with defaults and environment overrides"
        );
    }

    tracing::info!(
        "Starting Agrirelay server on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        generation_url = %config.generation.base_url(),
        generation_model = %config.generation.model(),
        crop_model_configured = config.crop.model_url().is_some(),
        weather_configured = config.weather.api_key().is_some(),
        "Upstream configuration"
    );

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::router(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, draining connections");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, draining connections");
        },
    }
}
