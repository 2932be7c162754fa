//! Configuration for entitystore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{EntityError, Result};

/// Main configuration for an entity manager
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Path of the flat store file holding every entity record
    pub store_path: PathBuf,

    /// Create the store file when it does not exist yet
    pub create_if_missing: bool,

    // -------------------------------------------------------------------------
    // Save Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: whether a save fsyncs before replacing the file
    pub sync_strategy: SyncStrategy,
}

/// Save sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync the staged file before it replaces the store (safest)
    Always,

    /// Leave flushing to the OS page cache (fastest)
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./data_store_file.data"),
            create_if_missing: true,
            sync_strategy: SyncStrategy::Always,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config before a manager opens it
    pub fn validate(&self) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            return Err(EntityError::Config("store path must not be empty".to_string()));
        }
        if self.store_path.is_dir() {
            return Err(EntityError::Config(format!(
                "store path {} is a directory",
                self.store_path.display()
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store file path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Allow or forbid creating a missing store file
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the save sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
