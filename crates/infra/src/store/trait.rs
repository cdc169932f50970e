use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use partsync_core::ProductId;
use partsync_products::{
    ProductApplication, ProductFile, ProductImage, ProductPackage, ProductParameter,
};

/// Sub-entity collections of a product, in the order they are synchronised.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Applications,
    CrossNumbers,
    Packages,
    Parameters,
    Images,
    Files,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Applications,
        EntityKind::CrossNumbers,
        EntityKind::Packages,
        EntityKind::Parameters,
        EntityKind::Images,
        EntityKind::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Applications => "applications",
            EntityKind::CrossNumbers => "cross_numbers",
            EntityKind::Packages => "packages",
            EntityKind::Parameters => "parameters",
            EntityKind::Images => "images",
            EntityKind::Files => "files",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row to insert-or-update for the session's product.
///
/// Cross numbers arrive already split: one row per individual reference
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubEntityRow<'a> {
    Application(&'a ProductApplication),
    CrossNumber { value: &'a str, manufacturer: &'a str },
    Package(&'a ProductPackage),
    Parameter(&'a ProductParameter),
    Image(&'a ProductImage),
    File(&'a ProductFile),
}

impl SubEntityRow<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            SubEntityRow::Application(_) => EntityKind::Applications,
            SubEntityRow::CrossNumber { .. } => EntityKind::CrossNumbers,
            SubEntityRow::Package(_) => EntityKind::Packages,
            SubEntityRow::Parameter(_) => EntityKind::Parameters,
            SubEntityRow::Image(_) => EntityKind::Images,
            SubEntityRow::File(_) => EntityKind::Files,
        }
    }
}

/// Store operation error.
///
/// These are **infrastructure errors**; the resolver and upsert engine log them
/// and convert them into their default results instead of propagating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or the connection broke.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// A statement was rejected or its result could not be read.
    #[error("store query failed: {0}")]
    Query(String),
}

/// One connection's worth of upserts for a single product.
#[async_trait]
pub trait StoreSession: Send {
    /// Insert the row, or update it in place when the store's uniqueness key
    /// already matches. Returns the affected row count.
    async fn upsert(&mut self, row: SubEntityRow<'_>) -> Result<u64, StoreError>;

    /// Release the underlying connection.
    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}

/// Relational store holding products and their sub-entities.
///
/// ## Implementation Requirements
///
/// - `find_product_id` returns the first identifier whose external code
///   matches, or `None`
/// - every `open_session` acquires its own connection; no pooling and no
///   transaction spans two sessions
/// - upserts are idempotent: writing the same row twice leaves one row
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product_id(&self, code: &str) -> Result<Option<ProductId>, StoreError>;

    async fn open_session(
        &self,
        product_id: ProductId,
    ) -> Result<Box<dyn StoreSession>, StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn find_product_id(&self, code: &str) -> Result<Option<ProductId>, StoreError> {
        (**self).find_product_id(code).await
    }

    async fn open_session(
        &self,
        product_id: ProductId,
    ) -> Result<Box<dyn StoreSession>, StoreError> {
        (**self).open_session(product_id).await
    }
}
