//! Inventory authority server binary.
//!
//! Composition root that assembles:
//! 1. Configuration from the environment (and `.env`)
//! 2. Behavior tables and default inventories from content files
//! 3. The runtime over a file-backed repository
//!
//! and then drives a short authority/replica session against it.
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=runtime=debug cargo run -p inventory-server
//! INVENTORY_POLICY_FILE=crates/inventory/content/data/policies.toml cargo run -p inventory-server
//! ```

mod demo;

use std::sync::Arc;

use anyhow::{Context, Result};
use inventory_content::{PolicyLoader, STANDARD_SEEDS, SeedLoader};
use inventory_core::{BehaviorTables, DefaultInventories};
use inventory_runtime::{FileContainerRepository, Runtime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // 1. Load configuration from environment
    let config = RuntimeConfig::from_env();
    tracing::info!("Starting inventory server");
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Persistence: {}", config.enable_persistence);

    // 2. Load content
    let tables = Arc::new(load_tables(&config)?);
    let defaults = load_defaults(&config, &tables)?;
    tracing::info!("Default container kind: {}", defaults.default_kind());

    // 3. Build runtime
    let repository = FileContainerRepository::new(&config.data_dir, defaults)
        .with_context(|| format!("Failed to open {}", config.data_dir.display()))?;
    let runtime = Runtime::builder()
        .config(config)
        .tables(tables)
        .repository(Arc::new(repository))
        .start()
        .await?;
    tracing::info!("Runtime started");

    // 4. Drive the session
    let outcome = demo::run(&runtime).await;

    runtime.shutdown().await?;
    outcome
}

fn load_tables(config: &RuntimeConfig) -> Result<BehaviorTables> {
    match &config.policy_file {
        Some(path) => {
            tracing::info!("Loading policies from {}", path.display());
            PolicyLoader::load(path)
        }
        None => {
            tracing::info!("Using built-in policies");
            Ok(BehaviorTables::standard())
        }
    }
}

fn load_defaults(
    config: &RuntimeConfig,
    tables: &Arc<BehaviorTables>,
) -> Result<DefaultInventories> {
    match &config.seed_file {
        Some(path) => {
            tracing::info!("Loading default inventories from {}", path.display());
            SeedLoader::load_validated(path, tables)
        }
        None => {
            let defaults = SeedLoader::parse(STANDARD_SEEDS)?;
            defaults
                .validate(tables)
                .context("Bundled default inventories do not fit the policy tables")?;
            Ok(defaults)
        }
    }
}
