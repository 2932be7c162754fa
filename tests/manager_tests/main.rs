//! Manager tests
//!
//! Covers the entity manager and the default-manager factory.
