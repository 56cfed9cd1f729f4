//! crudstore Server Binary
//!
//! Serves one CRUD endpoint per entity collection over HTTP.

use std::sync::Arc;

use clap::Parser;
use crudstore::network::{build_app, Server};
use crudstore::{Config, DurabilityMode, EntityStore};
use tracing_subscriber::{fmt, EnvFilter};

/// crudstore Server
#[derive(Parser, Debug)]
#[command(name = "crudstore-server")]
#[command(about = "File-backed JSON entity store over HTTP")]
#[command(version)]
struct Args {
    /// Directory holding the collection files
    #[arg(short, long, default_value = "./storage")]
    storage_path: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Collection to serve at /<ENTITY> (repeatable)
    #[arg(short, long = "entity", default_value = "cars")]
    entities: Vec<String>,

    /// Log write failures instead of returning them to clients
    #[arg(long)]
    best_effort: bool,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,crudstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("crudstore Server v{}", crudstore::VERSION);
    tracing::info!("Storage path: {}", args.storage_path);

    let durability = if args.best_effort {
        DurabilityMode::BestEffort
    } else {
        DurabilityMode::Awaited
    };

    let config = Config::builder()
        .storage_path(&args.storage_path)
        .listen_addr(&args.listen)
        .durability(durability)
        .pretty(!args.compact)
        .build();

    // Open one store per collection
    let mut stores = Vec::with_capacity(args.entities.len());
    for name in &args.entities {
        match EntityStore::open(config.clone(), name).await {
            Ok(store) => stores.push(Arc::new(store)),
            Err(e) => {
                tracing::error!("Failed to open collection '{}': {}", name, e);
                std::process::exit(1);
            }
        }
    }

    let app = match build_app(stores) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to build router: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(&config, app).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, initiating shutdown...");
}
