//! Flat Store
//!
//! Holds the whole store table in memory and replaces the backing file on
//! every save. Nothing is written until [`FlatStore::save`].

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, SyncStrategy};
use crate::entity::{FieldData, PrimaryKey};
use crate::error::{EntityError, Result};

use super::{codec, Table, STAGING_SUFFIX};

/// Single-file store of `type → primary key → field data`
///
/// The file is only open while loading and while saving.
#[derive(Debug)]
pub struct FlatStore {
    /// Location of the store file
    path: PathBuf,

    /// Staging file written by `save` and renamed over `path`
    staging_path: PathBuf,

    /// fsync policy for saves
    sync_strategy: SyncStrategy,

    /// Every record, grouped by entity type
    table: Table,
}

impl FlatStore {
    /// Open (creating if missing) the store at `path` with default settings
    pub fn open(path: &Path) -> Result<Self> {
        let config = Config::builder().store_path(path).build();
        Self::open_with(&config)
    }

    /// Open the store described by `config`
    ///
    /// On open:
    /// 1. Create the file if missing (when allowed)
    /// 2. Check it can be opened read/write
    /// 3. Read and decode it once; an empty file is an empty store
    pub fn open_with(config: &Config) -> Result<Self> {
        let path = config.store_path.clone();

        let raw = Self::read_image(&path, config.create_if_missing).map_err(|source| {
            EntityError::StoreAccess {
                path: path.clone(),
                source,
            }
        })?;

        let table = codec::decode_table(&raw)?;

        tracing::debug!(
            "Opened store {} ({} bytes, {} types)",
            path.display(),
            raw.len(),
            table.len()
        );

        Ok(Self {
            staging_path: Self::staging_path_for(&path),
            path,
            sync_strategy: config.sync_strategy,
            table,
        })
    }

    /// Get the field data stored for a record
    pub fn get(&self, entity_type: &str, primary_key: &PrimaryKey) -> Option<&FieldData> {
        self.table.get(entity_type)?.get(primary_key)
    }

    /// Insert or replace a record (in memory only)
    pub fn set(&mut self, entity_type: &str, primary_key: PrimaryKey, data: FieldData) {
        self.table
            .entry(entity_type.to_string())
            .or_default()
            .insert(primary_key, data);
    }

    /// Remove a record if present (in memory only)
    ///
    /// A type left without records is dropped from the table.
    pub fn delete(&mut self, entity_type: &str, primary_key: &PrimaryKey) -> Option<FieldData> {
        let records = self.table.get_mut(entity_type)?;
        let removed = records.remove(primary_key);
        if records.is_empty() {
            self.table.remove(entity_type);
        }
        removed
    }

    /// Write the entire table to disk, replacing the store file
    pub fn save(&self) -> Result<()> {
        let image = codec::encode_table(&self.table).map_err(|e| self.persist_failure(e))?;

        if let Err(e) = self.write_staged(&image) {
            let _ = fs::remove_file(&self.staging_path);
            return Err(self.persist_failure(e));
        }

        if let Err(e) = fs::rename(&self.staging_path, &self.path) {
            let _ = fs::remove_file(&self.staging_path);
            return Err(self.persist_failure(e));
        }

        tracing::debug!(
            "Saved store {} ({} bytes, {} records)",
            self.path.display(),
            image.len(),
            self.record_count()
        );

        Ok(())
    }

    /// Entity types currently holding records, sorted
    pub fn entity_types(&self) -> Vec<String> {
        self.table.keys().cloned().collect()
    }

    /// Primary keys stored under `entity_type`, sorted; empty if unknown
    pub fn primary_keys(&self, entity_type: &str) -> Vec<PrimaryKey> {
        self.table
            .get(entity_type)
            .map(|records| records.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of records across all types
    pub fn record_count(&self) -> usize {
        self.table.values().map(|records| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Read-only view of the whole table
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read_image(path: &Path, create_if_missing: bool) -> io::Result<Vec<u8>> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create_if_missing)
            .open(path)?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        Ok(raw)
    }

    fn write_staged(&self, image: &[u8]) -> io::Result<()> {
        let mut file = File::create(&self.staging_path)?;
        file.write_all(image)?;
        if self.sync_strategy == SyncStrategy::Always {
            file.sync_all()?;
        }
        Ok(())
    }

    fn persist_failure(&self, reason: impl ToString) -> EntityError {
        let failure = EntityError::PersistFailure {
            path: self.path.clone(),
            reason: reason.to_string(),
        };
        tracing::warn!("{}", failure);
        failure
    }

    /// "store.data" → "store.data.tmp"
    fn staging_path_for(path: &Path) -> PathBuf {
        let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(STAGING_SUFFIX);
        path.with_file_name(name)
    }
}
