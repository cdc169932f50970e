//! `partsync-core` — shared building blocks for the product sync pipeline.
//!
//! Configuration, identifiers and the three-way lookup result live here so the
//! component crates agree on them without depending on each other.

pub mod config;
pub mod error;
pub mod id;
pub mod lookup;

pub use config::{ApiConfig, DatabaseConfig, PathsConfig, SyncConfig, TableNames};
pub use error::{ConfigError, ConfigResult};
pub use id::ProductId;
pub use lookup::Lookup;
