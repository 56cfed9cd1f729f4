//! Collection File
//!
//! The durable side of a collection: one UTF-8 JSON array per entity
//! name, at `{storage_path}/{entity_name}.json`.
//!
//! Writes go to a sibling `.tmp` file which is synced and then renamed
//! over the collection file, so a crash mid-write leaves either the old
//! or the new array on disk, never a torn one.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::entity::Entity;
use crate::error::{Result, StoreError};

/// Handle to the backing file of one collection
#[derive(Debug, Clone)]
pub struct CollectionFile {
    /// `{storage_path}/{entity_name}.json`
    path: PathBuf,

    /// Staging file for atomic replacement
    tmp_path: PathBuf,

    /// Pretty-print (2-space indent) or compact JSON
    pretty: bool,
}

impl CollectionFile {
    const EXTENSION: &'static str = "json";
    const EMPTY_COLLECTION: &'static [u8] = b"[]";

    /// Derive the file location for a collection
    ///
    /// The entity name becomes a file name, so it must be non-empty and
    /// free of path separators.
    pub fn new(storage_path: &Path, entity_name: &str, pretty: bool) -> Result<Self> {
        if entity_name.is_empty()
            || entity_name == "."
            || entity_name == ".."
            || entity_name.contains(['/', '\\'])
        {
            return Err(StoreError::Config(format!(
                "Invalid entity name: {:?}",
                entity_name
            )));
        }

        let path = storage_path.join(format!("{}.{}", entity_name, Self::EXTENSION));
        let tmp_path = storage_path.join(format!("{}.{}.tmp", entity_name, Self::EXTENSION));

        Ok(Self {
            path,
            tmp_path,
            pretty,
        })
    }

    /// Path of the collection file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file (and its directory) holding an empty array if absent
    ///
    /// Returns `true` if the file was created by this call.
    pub async fn ensure(&self) -> Result<bool> {
        if fs::try_exists(&self.path).await? {
            if fs::metadata(&self.path).await?.is_dir() {
                return Err(StoreError::Config(format!(
                    "Storage path {} is a directory, expected a file",
                    self.path.display()
                )));
            }
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        self.write(Self::EMPTY_COLLECTION).await?;

        Ok(true)
    }

    /// Read and parse the whole collection
    ///
    /// Fails on I/O errors, invalid JSON, a top-level value that is not an
    /// array, or array elements that are not objects.
    pub async fn load(&self) -> Result<Vec<Entity>> {
        let bytes = fs::read(&self.path).await?;
        let entities = serde_json::from_slice(&bytes)?;
        Ok(entities)
    }

    /// Serialize a collection snapshot to the on-disk representation
    pub fn encode(&self, entities: &[Entity]) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(entities)?
        } else {
            serde_json::to_vec(entities)?
        };
        Ok(bytes)
    }

    /// Replace the file contents with `bytes` (write tmp, sync, rename)
    ///
    /// Once the staging file exists, any failure removes it again.
    pub async fn write(&self, bytes: &[u8]) -> Result<()> {
        let file = fs::File::create(&self.tmp_path).await?;

        let staged: std::io::Result<()> = async {
            let mut file = file;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&self.tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = staged {
            if let Err(cleanup) = fs::remove_file(&self.tmp_path).await {
                tracing::debug!(
                    "Could not remove staging file {}: {}",
                    self.tmp_path.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Path of the staging file used by [`CollectionFile::write`]
    pub fn staging_path(&self) -> &Path {
        &self.tmp_path
    }
}
