//! Catalog API access: request signing and product fetches.

pub mod client;
pub mod signing;

pub use client::{CatalogClient, FetchError, ProductCatalog};
pub use signing::{RequestSigner, SignedHeaders};
