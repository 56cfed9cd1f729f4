//! Store Module
//!
//! File-backed persistence for entity collections.
//!
//! ## Responsibilities
//! - Derive one file per collection from the storage root
//! - Create missing files, load existing ones (fail-open on bad content)
//! - Assign primary keys
//! - Rewrite the whole collection after every mutation
//!
//! ## File Format
//! ```text
//! {storage_path}/{entity_name}.json
//! ┌────────────────────────────────────────┐
//! │ [                                      │
//! │   { "id": 0, "make": "Mercedes" },     │
//! │   { "id": 1, ... },                    │
//! │   ...                                  │
//! │ ]                                      │
//! └────────────────────────────────────────┘
//! ```

mod entity_store;
mod file;
pub mod ids;

pub use entity_store::EntityStore;
pub use file::CollectionFile;
