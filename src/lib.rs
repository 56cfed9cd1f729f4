//! # crudstore
//!
//! A file-backed JSON entity store with:
//! - One JSON file per named collection
//! - Numeric max + 1 primary-key assignment
//! - Load-on-init recovery (fail-open on unreadable files)
//! - Write serialization so the file follows operation order
//! - An HTTP layer mapping REST verbs onto the store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP Server (axum)                       │
//! │              /{entity}  and  /{entity}/{id}                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Arc<EntityStore> per collection
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     EntityStore                              │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌────────────────┐
//!   │ Vec<Entity> │  encode  │ CollectionFile │
//!   │  (RwLock)   │ ───────► │ {name}.json    │
//!   └─────────────┘          └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entity;
pub mod store;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, DurabilityMode};
pub use entity::Entity;
pub use store::EntityStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of crudstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
