//! Data-driven inventory content.
//!
//! Loads the policy tables (TOML) and default seed inventories (RON) that the
//! runtime starts with. Content is read once at startup; the resulting
//! [`inventory_core::BehaviorTables`] are shared read-only from then on.

pub mod loaders;

pub use loaders::{ContainerEntry, ItemEntry, PolicyFile, PolicyLoader, SeedLoader};

/// Bundled policy tables, matching [`inventory_core::BehaviorTables::standard`].
pub const STANDARD_POLICIES: &str = include_str!("../data/policies.toml");

/// Bundled default inventories.
pub const STANDARD_SEEDS: &str = include_str!("../data/seeds.ron");
