//! Entity kinds and the type registry
//!
//! An [`EntityKind`] describes one concrete entity type: its member schema,
//! its primary-key field and any transient attributes. The
//! [`EntityRegistry`] maps type names to kinds and is the only way the
//! manager turns a stored type name back into a live entity.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{EntityError, Result};

use super::{FieldData, PrimaryKey, FRAMEWORK_ATTRIBUTES};

/// Contract every concrete entity type supplies
pub trait EntityKind: Send + Sync + 'static {
    /// Name the type is registered and stored under
    fn type_name(&self) -> &str;

    /// Valid field names of the persisted data
    fn member_schema(&self) -> &[&str];

    /// Which member holds the primary key
    fn primary_key_field(&self) -> &str;

    /// Declared non-schema attributes (transient, never persisted)
    fn attributes(&self) -> &[&str] {
        &[]
    }

    /// Hook run on freshly created data before it is validated and indexed.
    /// Not run for records rehydrated from the store.
    fn init(&self, _data: &mut FieldData) {}
}

/// Generic schema descriptor for types that need no custom behavior
#[derive(Debug, Clone)]
pub struct Schema {
    type_name: String,
    members: Vec<&'static str>,
    primary_key: &'static str,
    attributes: Vec<&'static str>,
}

impl Schema {
    pub fn new(
        type_name: impl Into<String>,
        members: &[&'static str],
        primary_key: &'static str,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            members: members.to_vec(),
            primary_key,
            attributes: Vec::new(),
        }
    }

    /// Declare a transient attribute
    pub fn with_attribute(mut self, name: &'static str) -> Self {
        self.attributes.push(name);
        self
    }
}

impl EntityKind for Schema {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn member_schema(&self) -> &[&str] {
        &self.members
    }

    fn primary_key_field(&self) -> &str {
        self.primary_key
    }

    fn attributes(&self) -> &[&str] {
        &self.attributes
    }
}

/// Registry of entity kinds, keyed by type name
#[derive(Clone, Default)]
pub struct EntityRegistry {
    kinds: BTreeMap<String, Arc<dyn EntityKind>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind, replacing any kind previously registered under the
    /// same type name
    pub fn register<K: EntityKind>(&mut self, kind: K) -> Result<()> {
        validate_kind(&kind)?;
        let name = kind.type_name().to_string();
        if self.kinds.insert(name.clone(), Arc::new(kind)).is_some() {
            tracing::debug!("Replaced entity kind {}", name);
        }
        Ok(())
    }

    /// Chaining form of [`register`](Self::register)
    pub fn with<K: EntityKind>(mut self, kind: K) -> Result<Self> {
        self.register(kind)?;
        Ok(self)
    }

    /// Look up a kind; unknown names fail closed
    pub fn get(&self, type_name: &str) -> Result<Arc<dyn EntityKind>> {
        self.kinds
            .get(type_name)
            .cloned()
            .ok_or_else(|| EntityError::UnknownEntityType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.kinds.contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("types", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn validate_kind(kind: &dyn EntityKind) -> Result<()> {
    let type_name = kind.type_name();
    if type_name.is_empty() {
        return Err(EntityError::InvalidSchema(
            "entity type name must not be empty".to_string(),
        ));
    }

    let members = kind.member_schema();
    if members.is_empty() {
        return Err(EntityError::InvalidSchema(format!(
            "{} declares no members",
            type_name
        )));
    }

    let mut seen = HashSet::new();
    for name in members.iter().chain(kind.attributes()) {
        if name.is_empty() {
            return Err(EntityError::InvalidSchema(format!(
                "{} declares an empty member name",
                type_name
            )));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(EntityError::InvalidSchema(format!(
                "{} declares {} more than once (names are case-insensitive)",
                type_name, name
            )));
        }
    }

    for attribute in kind.attributes() {
        if FRAMEWORK_ATTRIBUTES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(attribute))
        {
            return Err(EntityError::InvalidSchema(format!(
                "{} attribute {} shadows a framework attribute",
                type_name, attribute
            )));
        }
    }

    if !members.contains(&kind.primary_key_field()) {
        return Err(EntityError::InvalidSchema(format!(
            "{} primary key {} is not a member",
            type_name,
            kind.primary_key_field()
        )));
    }

    Ok(())
}

// =============================================================================
// Member Resolution
// =============================================================================

/// Canonical spelling of a schema member, matched case-insensitively
pub(crate) fn resolve_member<'k>(kind: &'k dyn EntityKind, name: &str) -> Option<&'k str> {
    kind.member_schema()
        .iter()
        .copied()
        .find(|member| member.eq_ignore_ascii_case(name))
}

/// Canonical spelling of a declared transient attribute
pub(crate) fn resolve_attribute<'k>(kind: &'k dyn EntityKind, name: &str) -> Option<&'k str> {
    kind.attributes()
        .iter()
        .copied()
        .find(|attribute| attribute.eq_ignore_ascii_case(name))
}

/// Rewrite field names to their canonical spelling and check the data holds
/// exactly the member schema
pub(crate) fn normalize(kind: &dyn EntityKind, data: FieldData) -> Result<FieldData> {
    let mut normalized = FieldData::new();

    for (name, value) in data {
        let canonical = resolve_member(kind, &name).ok_or_else(|| EntityError::UnknownMember {
            entity_type: kind.type_name().to_string(),
            member: name.clone(),
        })?;
        // Two spellings of the same member
        if normalized.insert(canonical.to_string(), value).is_some() {
            return Err(EntityError::UnknownMember {
                entity_type: kind.type_name().to_string(),
                member: name,
            });
        }
    }

    if let Some(missing) = kind
        .member_schema()
        .iter()
        .find(|member| !normalized.contains_key(**member))
    {
        return Err(EntityError::MissingMember {
            entity_type: kind.type_name().to_string(),
            member: missing.to_string(),
        });
    }

    Ok(normalized)
}

/// Primary key held by normalized data
pub(crate) fn primary_key_of(kind: &dyn EntityKind, data: &FieldData) -> Result<PrimaryKey> {
    let field = kind.primary_key_field();
    data.get(field)
        .and_then(PrimaryKey::from_value)
        .ok_or_else(|| EntityError::InvalidPrimaryKey {
            entity_type: kind.type_name().to_string(),
            field: field.to_string(),
        })
}
