//! entitystore CLI
//!
//! Inspects a store file without needing the entity kinds that wrote it.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use entitystore::config::{Config, SyncStrategy};
use entitystore::{FieldData, FlatStore, PrimaryKey};
use tracing_subscriber::{fmt, EnvFilter};

/// entitystore CLI
#[derive(Parser, Debug)]
#[command(name = "entitystore-cli")]
#[command(about = "Inspect and edit an entitystore file")]
#[command(version)]
struct Args {
    /// Store file
    #[arg(short, long, default_value = "./data_store_file.data")]
    store: PathBuf,

    /// Skip fsync when saving
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored entity types
    Types,

    /// List primary keys of a type
    Keys {
        /// The entity type
        entity_type: String,
    },

    /// Show one record
    Show {
        /// The entity type
        entity_type: String,

        /// The primary key (text, or an integer)
        key: String,
    },

    /// Print every record
    Dump,

    /// Remove a record and save the store
    Remove {
        /// The entity type
        entity_type: String,

        /// The primary key (text, or an integer)
        key: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,entitystore=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .store_path(&args.store)
        .create_if_missing(false)
        .sync_strategy(if args.no_sync {
            SyncStrategy::Never
        } else {
            SyncStrategy::Always
        })
        .build();

    let mut store = match FlatStore::open_with(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            process::exit(1);
        }
    };

    match args.command {
        Commands::Types => {
            for entity_type in store.entity_types() {
                println!("{}", entity_type);
            }
        }
        Commands::Keys { entity_type } => {
            for key in store.primary_keys(&entity_type) {
                println!("{}", key);
            }
        }
        Commands::Show { entity_type, key } => match resolve_key(&store, &entity_type, &key) {
            Some(key) => {
                if let Some(data) = store.get(&entity_type, &key) {
                    print_record(&entity_type, &key, data);
                }
            }
            None => {
                tracing::error!("No {} record with key {}", entity_type, key);
                process::exit(1);
            }
        },
        Commands::Dump => {
            for (entity_type, records) in store.table() {
                for (key, data) in records {
                    print_record(entity_type, key, data);
                }
            }
            tracing::info!("{} records", store.record_count());
        }
        Commands::Remove { entity_type, key } => {
            let Some(key) = resolve_key(&store, &entity_type, &key) else {
                tracing::error!("No {} record with key {}", entity_type, key);
                process::exit(1);
            };
            store.delete(&entity_type, &key);
            if let Err(e) = store.save() {
                tracing::error!("Failed to save store: {}", e);
                process::exit(1);
            }
            tracing::info!("Removed {} {}", entity_type, key);
        }
    }
}

/// Match a command-line key against the stored keys: text first, then integer
fn resolve_key(store: &FlatStore, entity_type: &str, raw: &str) -> Option<PrimaryKey> {
    let text = PrimaryKey::from(raw);
    if store.get(entity_type, &text).is_some() {
        return Some(text);
    }
    let int = PrimaryKey::Int(raw.parse().ok()?);
    store.get(entity_type, &int).map(|_| int)
}

fn print_record(entity_type: &str, key: &PrimaryKey, data: &FieldData) {
    println!("{} {}", entity_type, key);
    for (name, value) in data {
        println!("  {} = {}", name, value);
    }
}
