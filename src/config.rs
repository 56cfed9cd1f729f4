//! Configuration for crudstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a crudstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for collection files
    /// Internal structure:
    ///   {storage_path}/
    ///     ├── {entity_name}.json      (one file per collection)
    ///     └── {entity_name}.json.tmp  (transient, during writes)
    pub storage_path: PathBuf,

    /// How mutating calls treat the durability write
    pub durability: DurabilityMode,

    /// Pretty-print collection files (2-space indent) instead of compact JSON
    pub pretty: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,
}

/// Durability contract for mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Await every write and return its failure to the caller
    #[default]
    Awaited,

    /// Issue every write in order, but only log failures
    BestEffort,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./storage"),
            durability: DurabilityMode::Awaited,
            pretty: true,
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root directory
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_path = path.into();
        self
    }

    /// Set the durability mode
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.config.durability = mode;
        self
    }

    /// Toggle pretty-printed collection files
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.config.pretty = pretty;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
