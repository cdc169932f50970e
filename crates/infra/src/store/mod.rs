//! Relational store boundary.
//!
//! This module defines the storage-facing abstraction the resolver and upsert
//! engine work against, without making any storage assumptions. Each upsert
//! call runs in its own [`StoreSession`]; nothing is shared between calls.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;
pub use r#trait::{EntityKind, ProductStore, StoreError, StoreSession, SubEntityRow};
