//! Entity Store
//!
//! Owns one named collection: the authoritative in-memory list and the
//! file it is mirrored to.
//!
//! ## Responsibilities
//! - Create the backing file on first use and load it on init
//! - Assign ids on create
//! - Apply CRUD mutations in memory, then rewrite the whole file
//! - Serialize mutations so file writes land in issuance order

use std::path::Path;
use std::sync::OnceLock;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::{Config, DurabilityMode};
use crate::entity::Entity;
use crate::error::{Result, StoreError};

use super::file::CollectionFile;
use super::ids;

/// A single-collection, single-file, primary-key-addressed entity store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (create/update/delete): Serialized by `write_lock`
///   - Held across mutate → encode → file write, so each write reflects
///     exactly the mutations issued before it
///   - Must acquire: write_lock → entities (write) → release → file I/O
///
/// - **Reads** (get/get_all): Never suspend
///   - Only take the `entities` read lock
///   - Observe a mutation as soon as it is applied in memory, possibly
///     before its file write completes
///
/// Returned entities are clones; mutating them does not touch the store.
pub struct EntityStore {
    /// Store configuration
    config: Config,

    /// Set exactly once by a successful `init`
    backing: OnceLock<Backing>,

    /// In-memory collection, insertion order
    entities: RwLock<Vec<Entity>>,

    /// Serializes init and mutating operations
    write_lock: Mutex<()>,
}

/// Identity and file of an initialized collection
#[derive(Debug)]
struct Backing {
    entity_name: String,
    file: CollectionFile,
}

impl EntityStore {
    /// Create an uninitialized store
    ///
    /// Every CRUD call fails with [`StoreError::Uninitialized`] until
    /// [`EntityStore::init`] completes.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            backing: OnceLock::new(),
            entities: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Create and initialize a store for `entity_name` under `config.storage_path`
    pub async fn open(config: Config, entity_name: &str) -> Result<Self> {
        let storage_path = config.storage_path.clone();
        let store = Self::new(config);
        store.init(entity_name, &storage_path).await?;
        Ok(store)
    }

    /// Bind the store to `{storage_path}/{entity_name}.json` and load it
    ///
    /// On startup:
    /// 1. Derive the file path
    /// 2. Create it holding `[]` (and its directory) if absent
    /// 3. Load and parse it as the initial collection
    ///
    /// A load or parse failure is logged and leaves the collection empty.
    /// Calling again with the same entity name is a no-op.
    pub async fn init(&self, entity_name: &str, storage_path: impl AsRef<Path>) -> Result<()> {
        let _write_guard = self.write_lock.lock().await;

        if let Some(backing) = self.backing.get() {
            if backing.entity_name == entity_name {
                return Ok(());
            }
            return Err(StoreError::Config(format!(
                "Store already initialized for '{}', cannot re-init as '{}'",
                backing.entity_name, entity_name
            )));
        }

        let file = CollectionFile::new(storage_path.as_ref(), entity_name, self.config.pretty)?;

        if file.ensure().await? {
            tracing::info!(
                "Storage not set up for entity '{}', created {}",
                entity_name,
                file.path().display()
            );
        }

        let loaded = match file.load().await {
            Ok(entities) => entities,
            Err(e) => {
                tracing::warn!(
                    "Error reading or parsing entities from {}: {}; starting empty",
                    file.path().display(),
                    e
                );
                Vec::new()
            }
        };

        let duplicates = ids::duplicate_ids(&loaded);
        if !duplicates.is_empty() {
            tracing::warn!(
                "Duplicate ids {:?} in {}; update/delete reach only the first of each",
                duplicates,
                file.path().display()
            );
        }

        tracing::info!(
            "Loaded {} entities from storage for entity '{}'",
            loaded.len(),
            entity_name
        );

        *self.entities.write() = loaded;

        self.backing
            .set(Backing {
                entity_name: entity_name.to_string(),
                file,
            })
            .map_err(|_| StoreError::Config("Store initialized concurrently".to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the entity with the given id
    pub fn get(&self, id: u64) -> Result<Option<Entity>> {
        self.backing()?;
        let entities = self.entities.read();
        Ok(ids::position_of(&entities, id).map(|index| entities[index].clone()))
    }

    /// Get the whole collection in insertion order
    pub fn get_all(&self) -> Result<Vec<Entity>> {
        self.backing()?;
        Ok(self.entities.read().clone())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Append an entity, assigning it the next id
    ///
    /// Any `id` the entity carries is overwritten.
    pub async fn create(&self, mut entity: Entity) -> Result<Entity> {
        let _write_guard = self.write_lock.lock().await;
        let backing = self.backing()?;

        let encoded = {
            let mut entities = self.entities.write();
            entity.set_id(ids::next_id(&entities)?);
            entities.push(entity.clone());
            backing.file.encode(&entities)
        };

        tracing::debug!("Created '{}' id={:?}", backing.entity_name, entity.id());
        self.persist(backing, encoded).await?;

        Ok(entity)
    }

    /// Replace the entity with the same id (no field merging)
    ///
    /// Fails with `MissingId` if the entity has no id and with `NotFound`
    /// if no stored entity has it; the collection is untouched in both cases.
    pub async fn update(&self, entity: Entity) -> Result<Entity> {
        let backing = self.backing()?;
        let id = entity.id().ok_or(StoreError::MissingId)?;

        let _write_guard = self.write_lock.lock().await;

        let encoded = {
            let mut entities = self.entities.write();
            let index = ids::position_of(&entities, id).ok_or(StoreError::NotFound { id })?;
            entities[index] = entity.clone();
            backing.file.encode(&entities)
        };

        tracing::debug!("Updated '{}' id={}", backing.entity_name, id);
        self.persist(backing, encoded).await?;

        Ok(entity)
    }

    /// Remove the entity matching `entity`'s id
    ///
    /// Only the id is consulted; other fields are ignored.
    pub async fn delete(&self, entity: &Entity) -> Result<()> {
        let backing = self.backing()?;
        let id = entity.id().ok_or(StoreError::MissingId)?;

        let _write_guard = self.write_lock.lock().await;

        let encoded = {
            let mut entities = self.entities.write();
            let index = ids::position_of(&entities, id).ok_or(StoreError::NotFound { id })?;
            entities.remove(index);
            backing.file.encode(&entities)
        };

        tracing::debug!("Deleted '{}' id={}", backing.entity_name, id);
        self.persist(backing, encoded).await
    }

    /// Write an encoded snapshot (called with write lock held)
    ///
    /// The in-memory mutation is never rolled back. In `Awaited` mode the
    /// failure is returned; in `BestEffort` mode it is only logged.
    async fn persist(&self, backing: &Backing, encoded: Result<Vec<u8>>) -> Result<()> {
        let result = match encoded {
            Ok(bytes) => backing.file.write(&bytes).await,
            Err(e) => Err(e),
        };

        match (result, self.config.durability) {
            (Ok(()), _) => Ok(()),
            (Err(e), DurabilityMode::Awaited) => {
                tracing::error!(
                    "Error storing entities '{}' to {}: {}",
                    backing.entity_name,
                    backing.file.path().display(),
                    e
                );
                Err(e)
            }
            (Err(e), DurabilityMode::BestEffort) => {
                tracing::warn!(
                    "Error storing entities '{}' to {} (best effort, ignored): {}",
                    backing.entity_name,
                    backing.file.path().display(),
                    e
                );
                Ok(())
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    fn backing(&self) -> Result<&Backing> {
        self.backing.get().ok_or(StoreError::Uninitialized)
    }

    /// Whether `init` has completed
    pub fn is_initialized(&self) -> bool {
        self.backing.get().is_some()
    }

    /// Collection name, once initialized
    pub fn entity_name(&self) -> Option<&str> {
        self.backing.get().map(|b| b.entity_name.as_str())
    }

    /// Backing file path, once initialized
    pub fn file_path(&self) -> Option<&Path> {
        self.backing.get().map(|b| b.file.path())
    }

    /// Number of entities in memory
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}
