//! Infrastructure layer: relational store access for the sync pipeline.
//!
//! - [`store`]: the store boundary plus Postgres and in-memory backends
//! - [`resolver`]: external code -> internal identifier
//! - [`upsert`]: per-entity upserts and batch success accounting

pub mod resolver;
pub mod store;
pub mod upsert;

pub use resolver::IdentifierResolver;
pub use store::{
    EntityKind, InMemoryProductStore, PostgresProductStore, ProductStore, StoreError,
    StoreSession, SubEntityRow,
};
pub use upsert::{DetailsReport, EntityOutcome, UpsertEngine, UpsertStatus};
