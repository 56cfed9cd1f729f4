//! crudstore CLI
//!
//! Inspects and edits a collection file directly through the
//! [`EntityStore`] contract. Do not run it against a collection a live
//! server is managing.

use clap::{Parser, Subcommand};
use crudstore::{Config, Entity, EntityStore, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// crudstore CLI
#[derive(Parser, Debug)]
#[command(name = "crudstore-cli")]
#[command(about = "Offline CLI for crudstore collection files")]
struct Args {
    /// Directory holding the collection files
    #[arg(short, long, default_value = "./storage")]
    storage_path: String,

    /// Collection name
    #[arg(short, long, default_value = "cars")]
    entity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every entity
    List,

    /// Print one entity by id
    Get {
        /// The id to look up
        id: u64,
    },

    /// Create an entity from a JSON object
    Create {
        /// e.g. '{"make":"Mercedes"}'
        json: String,
    },

    /// Replace an entity with a JSON object
    Update {
        /// The id to replace
        id: u64,

        /// The new JSON object
        json: String,
    },

    /// Delete an entity by id
    Delete {
        /// The id to delete
        id: u64,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::builder().storage_path(&args.storage_path).build();
    let store = EntityStore::open(config, &args.entity).await?;

    match args.command {
        Commands::List => {
            println!("{}", serde_json::to_string_pretty(&store.get_all()?)?);
        }
        Commands::Get { id } => match store.get(id)? {
            Some(entity) => println!("{}", serde_json::to_string_pretty(&entity)?),
            None => return Err(crudstore::StoreError::NotFound { id }),
        },
        Commands::Create { json } => {
            let created = store.create(parse_entity(&json)?).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Commands::Update { id, json } => {
            let updated = store.update(parse_entity(&json)?.with_id(id)).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Commands::Delete { id } => {
            store.delete(&Entity::new().with_id(id)).await?;
        }
    }

    Ok(())
}

fn parse_entity(json: &str) -> Result<Entity> {
    Entity::from_value(serde_json::from_str(json)?)
}
