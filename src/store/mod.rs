//! Store Module
//!
//! The flat-file store: one file holding every entity record.
//!
//! ## Responsibilities
//! - Load the whole store once at startup
//! - Keep the nested `type → primary key → field data` table in memory
//! - Replace the file with the full table on every save
//!
//! ## File Format (V1)
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header (18 bytes)                                           │
//! │   Magic: "ATEM" (4) | Version: u16 (2) | PayloadLen: u64 (8)│
//! │   PayloadCRC: u32 (4)                                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Payload (PayloadLen bytes)                                  │
//! │   bincode(BTreeMap<type, BTreeMap<PrimaryKey, FieldData>>)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A zero-length file is an empty store.

pub mod codec;
mod flat_store;

use std::collections::BTreeMap;

use crate::entity::{FieldData, PrimaryKey};

pub use flat_store::FlatStore;

/// In-memory image of the store: entity type → primary key → field data
pub type Table = BTreeMap<String, BTreeMap<PrimaryKey, FieldData>>;

// =============================================================================
// Shared Constants (used by codec and store)
// =============================================================================

/// Magic bytes identifying an entitystore file
pub(crate) const MAGIC: &[u8; 4] = b"ATEM";

/// Current store format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + PayloadLen (8) + CRC (4) = 18 bytes
pub(crate) const HEADER_SIZE: usize = 18;

/// Suffix of the staging file a save writes before renaming it into place
pub(crate) const STAGING_SUFFIX: &str = ".tmp";
