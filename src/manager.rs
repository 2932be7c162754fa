//! Manager Module
//!
//! The entity manager: identity map, primary-key index and dirty tracking
//! over a [`FlatStore`].
//!
//! ## Responsibilities
//! - Rehydrate one entity per stored record on open
//! - Create, update and delete entities, keeping the indices consistent
//! - Track which entities need persisting
//! - Write every dirty record and save the store in one flush

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::entity::{
    normalize, primary_key_of, resolve_attribute, resolve_member, Entity, EntityId, EntityKind,
    EntityRegistry, FieldData, ManagerId, PrimaryKey, Value, FRAMEWORK_ATTRIBUTES,
};
use crate::error::{EntityError, Result};
use crate::store::FlatStore;

/// A live entity record, owned by the manager
struct Record {
    kind: Arc<dyn EntityKind>,
    entity_type: Arc<str>,
    /// Persisted payload; always exactly the member schema
    data: FieldData,
    /// Declared transient attributes; never persisted
    attributes: BTreeMap<String, Value>,
}

/// Identity map plus dirty tracking over a flat store
///
/// ## Ownership
///
/// The manager owns every entity record and the store. Callers hold
/// [`Entity`] handles, which name a record but never own it; a handle whose
/// record was deleted fails every operation with `DetachedEntity`.
///
/// ## Indices
///
/// - `entities`: id → record
/// - `id_to_primary`: id → primary key (the type lives on the record)
/// - `primary_to_id`: type → primary key → id
///
/// Primary keys are unique per entity type; two types may share a key.
pub struct EntityManager {
    /// Manager configuration
    config: Config,

    /// Tag stamped on every handle this manager issues
    manager_id: ManagerId,

    /// Entity kinds by type name
    registry: EntityRegistry,

    /// Live records by id
    entities: HashMap<EntityId, Record>,

    /// id → primary key
    id_to_primary: HashMap<EntityId, PrimaryKey>,

    /// type → primary key → id
    primary_to_id: HashMap<String, HashMap<PrimaryKey, EntityId>>,

    /// Ids with changes not yet flushed
    dirty: BTreeSet<EntityId>,

    /// Records dropped from the store table since the last save
    removals_pending: bool,

    /// Next id to hand out; never reused
    next_id: u64,

    /// Backing store (owned)
    store: FlatStore,
}

impl EntityManager {
    /// Open the store described by `config` and rehydrate its records
    ///
    /// On startup:
    /// 1. Open/create the store file and load it
    /// 2. For each stored type, resolve its kind in the registry
    /// 3. For each key under that type, create a clean (not dirty) entity
    pub fn open(config: Config, registry: EntityRegistry) -> Result<Self> {
        config.validate()?;
        let store = FlatStore::open_with(&config)?;

        let mut manager = Self {
            config,
            manager_id: ManagerId::next(),
            registry,
            entities: HashMap::new(),
            id_to_primary: HashMap::new(),
            primary_to_id: HashMap::new(),
            dirty: BTreeSet::new(),
            removals_pending: false,
            next_id: 1,
            store,
        };

        manager.rehydrate()?;

        tracing::debug!(
            "Entity manager ready over {} ({} entities rehydrated)",
            manager.store.path().display(),
            manager.entities.len()
        );

        Ok(manager)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified store path
    pub fn open_path(path: &Path, registry: EntityRegistry) -> Result<Self> {
        let config = Config::builder().store_path(path).build();
        Self::open(config, registry)
    }

    /// Create a new entity of `entity_type`
    ///
    /// The kind's `init` hook runs first; the data must then hold exactly
    /// the member schema. The new entity is dirty until the next flush.
    pub fn create(&mut self, entity_type: &str, data: FieldData) -> Result<Entity> {
        let kind = self.registry.get(entity_type)?;

        let mut data = data;
        kind.init(&mut data);
        let data = normalize(kind.as_ref(), data)?;
        let primary = primary_key_of(kind.as_ref(), &data)?;
        self.ensure_key_free(kind.type_name(), &primary)?;

        let entity = self.insert_record(kind, data, primary);
        self.dirty.insert(entity.id());

        tracing::trace!("Created {} {}", entity.entity_type(), entity.id());
        Ok(entity)
    }

    /// Replace an entity's data
    ///
    /// Identical data is a no-op. A primary-key change drops the old record
    /// from the store table and moves both index entries in one step; moving
    /// onto a key another entity of the same type holds fails with
    /// `DuplicatePrimaryKey` and changes nothing.
    pub fn update(&mut self, entity: &Entity, data: FieldData) -> Result<Entity> {
        let kind = Arc::clone(&self.record(entity)?.kind);
        let data = normalize(kind.as_ref(), data)?;

        if self.record(entity)?.data == data {
            return Ok(entity.clone());
        }

        let id = entity.id();
        let new_primary = primary_key_of(kind.as_ref(), &data)?;
        let old_primary = self
            .id_to_primary
            .get(&id)
            .cloned()
            .ok_or(EntityError::DetachedEntity { id })?;

        if new_primary != old_primary {
            self.ensure_key_free(kind.type_name(), &new_primary)?;
            self.store.delete(kind.type_name(), &old_primary);
            self.removals_pending = true;
            self.reindex(kind.type_name(), id, &old_primary, new_primary);
        }

        self.dirty.insert(id);
        if let Some(record) = self.entities.get_mut(&id) {
            record.data = data;
        }

        tracing::trace!("Updated {} {}", entity.entity_type(), id);
        Ok(entity.clone())
    }

    /// Delete an entity
    ///
    /// The record leaves the identity map, the index and the store table at
    /// once; the file only changes on the next flush.
    pub fn delete(&mut self, entity: Entity) -> Result<()> {
        self.check_owner(&entity)?;
        let id = entity.id();
        let record = self
            .entities
            .remove(&id)
            .ok_or(EntityError::DetachedEntity { id })?;

        if let Some(primary) = self.id_to_primary.remove(&id) {
            self.store.delete(&record.entity_type, &primary);
            self.removals_pending = true;
            if let Some(keys) = self.primary_to_id.get_mut(&*record.entity_type) {
                keys.remove(&primary);
                if keys.is_empty() {
                    self.primary_to_id.remove(&*record.entity_type);
                }
            }
        }
        self.dirty.remove(&id);

        tracing::trace!("Deleted {} {}", record.entity_type, id);
        Ok(())
    }

    /// Look up an entity by type and primary key
    pub fn find_by_primary(
        &self,
        entity_type: &str,
        primary_key: impl Into<PrimaryKey>,
    ) -> Option<Entity> {
        let key: PrimaryKey = primary_key.into();
        let id = *self.primary_to_id.get(entity_type)?.get(&key)?;
        let record = self.entities.get(&id)?;
        Some(Entity::new(id, Arc::clone(&record.entity_type), self.manager_id))
    }

    /// Persist every dirty entity
    ///
    /// Steps:
    /// 1. Write each dirty record into the store table
    /// 2. Save the whole table in one write
    /// 3. Clear the dirty set (only if the save succeeded)
    ///
    /// Returns the number of records written.
    pub fn flush(&mut self) -> Result<usize> {
        for id in &self.dirty {
            let (Some(record), Some(primary)) = (self.entities.get(id), self.id_to_primary.get(id))
            else {
                continue;
            };
            self.store
                .set(&record.entity_type, primary.clone(), record.data.clone());
        }

        self.store.save()?;

        let written = self.dirty.len();
        self.dirty.clear();
        self.removals_pending = false;

        tracing::info!(
            "Flushed {} dirty entities to {}",
            written,
            self.store.path().display()
        );
        Ok(written)
    }

    /// Close the manager, flushing pending changes
    pub fn close(mut self) -> Result<()> {
        if self.has_unsaved_changes() {
            self.flush()?;
        }
        Ok(())
    }

    // =========================================================================
    // Field Access (used by Entity handles)
    // =========================================================================

    /// Read a member, a framework attribute or a declared attribute
    pub fn get_field(&self, entity: &Entity, name: &str) -> Result<Value> {
        let record = self.record(entity)?;
        let kind = record.kind.as_ref();

        if let Some(member) = resolve_member(kind, name) {
            return Ok(record.data.get(member).cloned().unwrap_or(Value::Null));
        }
        if name.eq_ignore_ascii_case("id") {
            return Ok(Value::Int(entity.id().as_u64() as i64));
        }
        if name.eq_ignore_ascii_case("type") {
            return Ok(Value::Text(record.entity_type.to_string()));
        }
        if let Some(attribute) = resolve_attribute(kind, name) {
            return Ok(record
                .attributes
                .get(attribute)
                .cloned()
                .unwrap_or(Value::Null));
        }

        Err(EntityError::UnknownMember {
            entity_type: record.entity_type.to_string(),
            member: name.to_string(),
        })
    }

    /// Write a member through [`update`](Self::update), or a declared
    /// attribute directly
    pub fn set_field(&mut self, entity: &Entity, name: &str, value: Value) -> Result<()> {
        let record = self.record(entity)?;
        let kind = Arc::clone(&record.kind);

        if let Some(member) = resolve_member(kind.as_ref(), name) {
            let mut data = record.data.clone();
            data.insert(member.to_string(), value);
            self.update(entity, data)?;
            return Ok(());
        }

        if FRAMEWORK_ATTRIBUTES
            .iter()
            .any(|attribute| attribute.eq_ignore_ascii_case(name))
        {
            return Err(EntityError::ReadOnlyAttribute {
                entity_type: kind.type_name().to_string(),
                attribute: name.to_string(),
            });
        }

        if let Some(attribute) = resolve_attribute(kind.as_ref(), name) {
            let attribute = attribute.to_string();
            self.record_mut(entity)?.attributes.insert(attribute, value);
            return Ok(());
        }

        Err(EntityError::UnknownMember {
            entity_type: kind.type_name().to_string(),
            member: name.to_string(),
        })
    }

    /// Snapshot of an entity's field data
    pub fn read(&self, entity: &Entity) -> Result<FieldData> {
        Ok(self.record(entity)?.data.clone())
    }

    /// Current primary key of an entity
    pub fn primary_key(&self, entity: &Entity) -> Result<PrimaryKey> {
        self.check_owner(entity)?;
        self.id_to_primary
            .get(&entity.id())
            .cloned()
            .ok_or(EntityError::DetachedEntity { id: entity.id() })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Whether the entity has unflushed changes
    pub fn is_dirty(&self, entity: &Entity) -> bool {
        entity.manager_id() == self.manager_id && self.dirty.contains(&entity.id())
    }

    /// Number of entities waiting for a flush
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Whether a flush would change the store file
    ///
    /// True while entities are dirty or records were deleted or re-keyed
    /// since the last successful save.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.dirty.is_empty() || self.removals_pending
    }

    /// Whether the handle names a live entity of this manager
    pub fn contains(&self, entity: &Entity) -> bool {
        entity.manager_id() == self.manager_id && self.entities.contains_key(&entity.id())
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Handles to every live entity of a type, in id order
    pub fn entities_of_type(&self, entity_type: &str) -> Vec<Entity> {
        let mut ids: Vec<EntityId> = self
            .primary_to_id
            .get(entity_type)
            .map(|keys| keys.values().copied().collect())
            .unwrap_or_default();
        ids.sort();

        ids.into_iter()
            .filter_map(|id| {
                let record = self.entities.get(&id)?;
                Some(Entity::new(id, Arc::clone(&record.entity_type), self.manager_id))
            })
            .collect()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the entity registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Get the backing store
    pub fn store(&self) -> &FlatStore {
        &self.store
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Create one clean entity per stored record
    fn rehydrate(&mut self) -> Result<()> {
        for entity_type in self.store.entity_types() {
            let kind = self.registry.get(&entity_type)?;

            for key in self.store.primary_keys(&entity_type) {
                let Some(stored) = self.store.get(&entity_type, &key).cloned() else {
                    continue;
                };
                let data = normalize(kind.as_ref(), stored)?;
                let primary = primary_key_of(kind.as_ref(), &data)?;
                if primary != key {
                    return Err(EntityError::Corrupted(format!(
                        "{} record stored under key {} holds primary key {}",
                        entity_type, key, primary
                    )));
                }

                self.insert_record(Arc::clone(&kind), data, primary);
            }
        }
        Ok(())
    }

    /// Assign an id and register a record in every index
    fn insert_record(
        &mut self,
        kind: Arc<dyn EntityKind>,
        data: FieldData,
        primary: PrimaryKey,
    ) -> Entity {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let entity_type: Arc<str> = Arc::from(kind.type_name());
        self.id_to_primary.insert(id, primary.clone());
        self.primary_to_id
            .entry(entity_type.to_string())
            .or_default()
            .insert(primary, id);
        self.entities.insert(
            id,
            Record {
                kind,
                entity_type: Arc::clone(&entity_type),
                data,
                attributes: BTreeMap::new(),
            },
        );

        Entity::new(id, entity_type, self.manager_id)
    }

    /// Move an id from one primary key to another
    fn reindex(&mut self, entity_type: &str, id: EntityId, old: &PrimaryKey, new: PrimaryKey) {
        let keys = self.primary_to_id.entry(entity_type.to_string()).or_default();
        keys.remove(old);
        keys.insert(new.clone(), id);
        self.id_to_primary.insert(id, new);
    }

    fn ensure_key_free(&self, entity_type: &str, primary: &PrimaryKey) -> Result<()> {
        let taken = self
            .primary_to_id
            .get(entity_type)
            .map_or(false, |keys| keys.contains_key(primary));
        if taken {
            return Err(EntityError::DuplicatePrimaryKey {
                entity_type: entity_type.to_string(),
                key: primary.to_string(),
            });
        }
        Ok(())
    }

    fn check_owner(&self, entity: &Entity) -> Result<()> {
        if entity.manager_id() != self.manager_id {
            return Err(EntityError::ForeignEntity { id: entity.id() });
        }
        Ok(())
    }

    fn record(&self, entity: &Entity) -> Result<&Record> {
        self.check_owner(entity)?;
        self.entities
            .get(&entity.id())
            .ok_or(EntityError::DetachedEntity { id: entity.id() })
    }

    fn record_mut(&mut self, entity: &Entity) -> Result<&mut Record> {
        self.check_owner(entity)?;
        self.entities
            .get_mut(&entity.id())
            .ok_or(EntityError::DetachedEntity { id: entity.id() })
    }
}
