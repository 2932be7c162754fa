//! Entity tests
//!
//! Covers the registry, entity handles and field dispatch.

mod registry_tests;
