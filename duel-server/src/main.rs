use std::sync::Arc;
use tokio::signal;
use tracing::info;

use duel_core::WordList;
use duel_persistence::connection::connect_and_migrate;
use duel_persistence::repositories::{MatchRepository, QueueRepository};
use duel_server::{config::Config, create_routes, events::MatchEventHub};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting word duel server...");

    let config = Config::new();

    // Word list: WORDS_FILE on disk, or the list baked into the binary
    let word_list = match std::env::var("WORDS_FILE") {
        Ok(path) => match WordList::load(&path) {
            Ok(list) => {
                info!("Loaded {} words from {}", list.len(), path);
                list
            }
            Err(e) => {
                tracing::error!("Failed to load word list from '{}': {}", path, e);
                tracing::error!("Set WORDS_FILE to a newline-separated word file, or unset it to use the embedded list.");
                std::process::exit(1);
            }
        },
        Err(_) => {
            let list = WordList::embedded();
            info!("Using embedded word list ({} words)", list.len());
            list
        }
    };
    let word_list = Arc::new(word_list);

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let queue_repository = Arc::new(QueueRepository::new(db.clone()));
    let match_repository = Arc::new(MatchRepository::new(db));
    let event_hub = Arc::new(MatchEventHub::new());

    let routes = create_routes(
        queue_repository,
        match_repository,
        word_list,
        event_hub,
        config.clone(),
    );

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

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
