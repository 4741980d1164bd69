use std::sync::Arc;
use tokio::signal;
use tracing::info;

use sketch_core::WordBank;
use sketch_persistence::{connection::connect_and_migrate, repositories::ScoreRepository};
use sketch_server::{
    config::Config, coordinator::SessionCoordinator, create_routes, websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Sketch Arena server...");

    let config = Config::new();
    let connection_manager = Arc::new(ConnectionManager::new());

    info!("Loading words from: {}", config.words_file);
    let words = match WordBank::from_file(&config.words_file) {
        Ok(words) if !words.is_empty() => {
            info!("Loaded {} words", words.len());
            words
        }
        Ok(_) => {
            tracing::error!("Word file '{}' contains no usable words.", config.words_file);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Failed to load word file '{}': {}", config.words_file, e);
            tracing::error!("The server requires a word list to run rounds.");
            tracing::error!("Set WORDS_FILE to a text file with one word per line.");
            std::process::exit(1);
        }
    };

    // Score persistence is best-effort: a missing database means scores
    // start at zero and are not saved, not a dead server.
    let scores = match connect_and_migrate().await {
        Ok(db) => Some(Arc::new(ScoreRepository::new(db))),
        Err(e) => {
            tracing::warn!("Database unavailable, running without score persistence: {}", e);
            None
        }
    };

    let session = SessionCoordinator::spawn(
        config.session_rules(),
        words,
        connection_manager.clone(),
        scores,
    );

    let routes = create_routes(connection_manager, session);

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config
            .host
            .parse::<std::net::IpAddr>()
            .expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
                .expect("Failed to install SIGINT handler");
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
