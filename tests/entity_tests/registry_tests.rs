//! Tests for EntityRegistry
//!
//! These tests verify:
//! - Registering schemas and custom kinds
//! - Fail-closed lookup of unknown types
//! - Schema validation on registration

use entitystore::{EntityError, EntityKind, EntityRegistry, FieldData, Schema, Value};

/// A kind with an init hook
struct Ticket;

impl EntityKind for Ticket {
    fn type_name(&self) -> &str {
        "Ticket"
    }

    fn member_schema(&self) -> &[&str] {
        &["number", "status"]
    }

    fn primary_key_field(&self) -> &str {
        "number"
    }

    fn init(&self, data: &mut FieldData) {
        data.entry("status".to_string())
            .or_insert_with(|| Value::from("open"));
    }
}

#[test]
fn test_register_and_get() {
    let registry = EntityRegistry::new()
        .with(Schema::new("Widget", &["sku", "qty"], "sku"))
        .unwrap()
        .with(Ticket)
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.contains("Widget"));
    assert!(registry.contains("Ticket"));

    let kind = registry.get("Ticket").unwrap();
    assert_eq!(kind.primary_key_field(), "number");
    assert_eq!(registry.type_names().collect::<Vec<_>>(), vec!["Ticket", "Widget"]);
}

#[test]
fn test_unknown_type_fails_closed() {
    let registry = EntityRegistry::new();

    assert!(registry.is_empty());
    assert!(matches!(
        registry.get("Widget"),
        Err(EntityError::UnknownEntityType(name)) if name == "Widget"
    ));
}

#[test]
fn test_type_names_are_case_sensitive() {
    let registry = EntityRegistry::new()
        .with(Schema::new("Widget", &["sku"], "sku"))
        .unwrap();

    assert!(registry.get("widget").is_err());
}

#[test]
fn test_reregister_replaces_kind() {
    let mut registry = EntityRegistry::new();
    registry
        .register(Schema::new("Widget", &["sku"], "sku"))
        .unwrap();
    registry
        .register(Schema::new("Widget", &["sku", "qty"], "sku"))
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("Widget").unwrap().member_schema().len(), 2);
}

#[test]
fn test_primary_key_must_be_member() {
    let mut registry = EntityRegistry::new();
    let result = registry.register(Schema::new("Widget", &["qty"], "sku"));

    assert!(matches!(result, Err(EntityError::InvalidSchema(_))));
    assert!(!registry.contains("Widget"));
}

#[test]
fn test_empty_schema_rejected() {
    let mut registry = EntityRegistry::new();
    assert!(matches!(
        registry.register(Schema::new("Widget", &[], "sku")),
        Err(EntityError::InvalidSchema(_))
    ));
    assert!(matches!(
        registry.register(Schema::new("", &["sku"], "sku")),
        Err(EntityError::InvalidSchema(_))
    ));
}

#[test]
fn test_case_insensitive_duplicate_members_rejected() {
    let mut registry = EntityRegistry::new();
    let result = registry.register(Schema::new("Widget", &["sku", "Qty", "qty"], "sku"));

    assert!(matches!(result, Err(EntityError::InvalidSchema(_))));
}

#[test]
fn test_attribute_cannot_shadow_framework_attribute() {
    let mut registry = EntityRegistry::new();
    let result = registry.register(Schema::new("Widget", &["sku"], "sku").with_attribute("type"));

    assert!(matches!(result, Err(EntityError::InvalidSchema(_))));
}
