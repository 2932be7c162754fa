//! Entity handles
//!
//! An [`Entity`] is a cheap handle: the manager owns the record, the handle
//! only names it. Every read goes through the manager's authoritative copy.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::manager::EntityManager;

use super::{FieldData, Value};

/// Manager-assigned entity id, unique within one manager and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-unique tag of a manager instance
///
/// Handles carry it instead of a pointer to their manager, so a handle can
/// be checked against the manager it is used with without owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(u64);

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

impl ManagerId {
    pub(crate) fn next() -> Self {
        ManagerId(NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to one entity owned by an [`EntityManager`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    id: EntityId,
    entity_type: Arc<str>,
    manager: ManagerId,
}

impl Entity {
    pub(crate) fn new(id: EntityId, entity_type: Arc<str>, manager: ManagerId) -> Self {
        Self {
            id,
            entity_type,
            manager,
        }
    }

    /// Create a new entity through `manager`
    pub fn create(manager: &mut EntityManager, entity_type: &str, data: FieldData) -> Result<Self> {
        manager.create(entity_type, data)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub(crate) fn manager_id(&self) -> ManagerId {
        self.manager
    }

    /// Read a member or attribute
    pub fn get(&self, manager: &EntityManager, name: &str) -> Result<Value> {
        manager.get_field(self, name)
    }

    /// Write a member (through the manager's update path) or a transient
    /// attribute
    pub fn set(&self, manager: &mut EntityManager, name: &str, value: impl Into<Value>) -> Result<()> {
        manager.set_field(self, name, value.into())
    }

    /// Snapshot of the full field data
    pub fn read(&self, manager: &EntityManager) -> Result<FieldData> {
        manager.read(self)
    }

    /// Replace the full field data
    pub fn update(&self, manager: &mut EntityManager, data: FieldData) -> Result<()> {
        manager.update(self, data).map(|_| ())
    }

    /// Detach the entity; the handle is consumed
    pub fn delete(self, manager: &mut EntityManager) -> Result<()> {
        manager.delete(self)
    }

    /// Pair the handle with its manager for [`FieldAccess`]
    pub fn bind<'m>(&self, manager: &'m mut EntityManager) -> BoundEntity<'m> {
        BoundEntity {
            manager,
            entity: self.clone(),
        }
    }
}

/// Field access capability
///
/// Business logic written against this trait does not care how fields are
/// stored or tracked.
pub trait FieldAccess {
    fn get_field(&self, name: &str) -> Result<Value>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;
}

/// An entity handle bound to its manager
pub struct BoundEntity<'m> {
    manager: &'m mut EntityManager,
    entity: Entity,
}

impl BoundEntity<'_> {
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn read(&self) -> Result<FieldData> {
        self.manager.read(&self.entity)
    }

    pub fn update(&mut self, data: FieldData) -> Result<()> {
        self.manager.update(&self.entity, data).map(|_| ())
    }
}

impl FieldAccess for BoundEntity<'_> {
    fn get_field(&self, name: &str) -> Result<Value> {
        self.manager.get_field(&self.entity, name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.manager.set_field(&self.entity, name, value)
    }
}
