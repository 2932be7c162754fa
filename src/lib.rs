//! # entitystore
//!
//! A minimal object-persistence layer:
//! - Identity map of typed entities with generic field access
//! - Dirty tracking and a per-type primary-key index
//! - A single flat store file, replaced in one write per flush
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application / Driver                       │
//! │          (Entity handles, EntityFactory)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get / set / update / delete
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   EntityManager                             │
//! │     identity map · primary-key index · dirty set            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ flush (whole table)
//!                       ▼
//!               ┌───────────────┐
//!               │   FlatStore   │
//!               │ (single file) │
//!               └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use entitystore::{fields, EntityManager, EntityRegistry, Schema};
//!
//! # fn main() -> entitystore::Result<()> {
//! let registry = EntityRegistry::new().with(Schema::new("Widget", &["sku", "qty"], "sku"))?;
//! let mut manager = EntityManager::open_path("widgets.data".as_ref(), registry)?;
//!
//! let widget = manager.create("Widget", fields! { "sku" => "w1", "qty" => 0 })?;
//! widget.set(&mut manager, "qty", 5)?;
//! manager.flush()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entity;
pub mod store;
pub mod manager;
pub mod factory;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use entity::{Entity, EntityId, EntityKind, EntityRegistry, FieldAccess, FieldData, PrimaryKey, Schema, Value};
pub use error::{EntityError, Result};
pub use factory::EntityFactory;
pub use manager::EntityManager;
pub use store::FlatStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of entitystore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
