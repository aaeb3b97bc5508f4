use ocm_service::config::{self, Config};
use ocm_service::types::AppState;
use ocm_service::{db, routes};

use std::collections::HashMap;
use std::env;
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    let vars: HashMap<String, String> = env::vars().collect();
    let log_level = config::startup_log_level(&vars);

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(Targets::new().with_targets([
            ("hyper", LevelFilter::OFF),
            ("ocm_service", log_level),
            ("tower_http", log_level),
        ]));
    tracing::subscriber::set_global_default(subscriber)?;

    match dotenv {
        Ok(path) => debug!(path=%path.display(), "loaded environment file"),
        Err(e) if e.not_found() => debug!("no .env file found"),
        Err(e) => error!(error=%e, "failed to read .env file"),
    }

    let config = Config::from_vars(&vars).map_err(|e| {
        error!(error=%e, "failed to load configuration");
        e
    })?;

    let pool = db::connect(&config).await.map_err(|e| {
        error!(error=%e, "unable to connect to database");
        e
    })?;

    if let Err(e) = db::init_schema(&pool).await {
        error!(error=%e, "failed to run initialization script");
    }

    let app = routes::build_routes(AppState::new(pool.clone()), &config.static_dir);

    info!(address=%config.bind_address, "server is running");
    axum::Server::try_bind(&config.bind_address)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received SIGINT, shutting down"),
            Err(e) => error!(error=%e, "failed to listen for SIGINT"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error=%e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
