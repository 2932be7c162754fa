//! Entity factory
//!
//! Convenience wrapper for the outermost composition layer: it holds a
//! "default" manager so driver code can create entities by type name
//! without threading the manager through every call. Library code takes
//! `&mut EntityManager` instead.

use crate::entity::{Entity, FieldData};
use crate::error::{EntityError, Result};
use crate::manager::EntityManager;

/// Holder of the default entity manager
#[derive(Default)]
pub struct EntityFactory {
    default_manager: Option<EntityManager>,
}

impl EntityFactory {
    /// Create a factory with no default manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default manager, returning the previous one
    pub fn set_default_manager(&mut self, manager: EntityManager) -> Option<EntityManager> {
        self.default_manager.replace(manager)
    }

    pub fn has_default_manager(&self) -> bool {
        self.default_manager.is_some()
    }

    /// Get the default manager
    pub fn default_manager(&self) -> Result<&EntityManager> {
        self.default_manager
            .as_ref()
            .ok_or(EntityError::NoDefaultManager)
    }

    /// Get the default manager mutably
    pub fn default_manager_mut(&mut self) -> Result<&mut EntityManager> {
        self.default_manager
            .as_mut()
            .ok_or(EntityError::NoDefaultManager)
    }

    /// Create an entity through the default manager
    pub fn create_entity(&mut self, entity_type: &str, data: FieldData) -> Result<Entity> {
        self.default_manager_mut()?.create(entity_type, data)
    }

    /// Take the default manager back out of the factory
    pub fn take_default_manager(&mut self) -> Option<EntityManager> {
        self.default_manager.take()
    }
}
