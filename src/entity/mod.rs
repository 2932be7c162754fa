//! Entity Module
//!
//! Typed business objects with generic, schema-checked field access.
//!
//! ## Responsibilities
//! - Describe concrete entity types ([`EntityKind`], [`Schema`])
//! - Map type names to kinds ([`EntityRegistry`])
//! - Hand out lightweight [`Entity`] handles whose data lives in the manager
//! - Dispatch field access: schema members, then declared attributes
//!
//! ## Field Dispatch
//! ```text
//! get/set(name)
//!   ├── schema member (case-insensitive)  → manager data, dirty on change
//!   ├── framework attribute (id, type)    → read-only
//!   ├── declared transient attribute      → direct, never persisted
//!   └── anything else                     → UnknownMember
//! ```

mod handle;
mod schema;
mod value;

use std::collections::BTreeMap;

pub use handle::{BoundEntity, Entity, EntityId, FieldAccess, ManagerId};
pub use schema::{EntityKind, EntityRegistry, Schema};
pub use value::{PrimaryKey, Value};

pub(crate) use schema::{normalize, primary_key_of, resolve_attribute, resolve_member};

/// Field name → value mapping; the persisted payload of one entity
pub type FieldData = BTreeMap<String, Value>;

/// Attributes every entity exposes outside its member schema
pub const FRAMEWORK_ATTRIBUTES: [&str; 2] = ["id", "type"];

/// Build [`FieldData`] from `name => value` pairs
///
/// ```
/// use entitystore::fields;
///
/// let data = fields! { "sku" => "w1", "qty" => 0 };
/// assert_eq!(data.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::entity::FieldData::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut data = $crate::entity::FieldData::new();
        $(
            data.insert(::std::string::String::from($name), $crate::entity::Value::from($value));
        )+
        data
    }};
}
