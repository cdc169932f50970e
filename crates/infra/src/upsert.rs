//! Per-entity upserts and batch success accounting.
//!
//! All six upsert routines follow the same policy:
//!
//! 1. absent or empty input -> [`UpsertStatus::Skipped`]
//! 2. items with a blank discriminator are dropped; nothing left -> `Skipped`
//! 3. every remaining row is inserted, or updated in place on a key match
//! 4. the status carries the **last** write's affected-row count
//! 5. a store error stops the call, is logged, and leaves the status at
//!    whatever the last successful write reported (`NoOp` if none)
//!
//! Each routine opens its own store session, so one failing entity never
//! blocks the others and the six are not atomic as a group.

use tracing::{debug, error, instrument, warn};

use partsync_core::ProductId;
use partsync_products::{
    Discriminated, Product, ProductApplication, ProductCrossNumber, ProductFile, ProductImage,
    ProductPackage, ProductParameter, retain_valid, split_cross_numbers,
};

use crate::store::{EntityKind, ProductStore, SubEntityRow};

/// Result of one upsert routine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpsertStatus {
    /// Nothing to write. Counts as success.
    Skipped,
    /// Items were present but no write completed.
    NoOp,
    /// Affected-row count of the last completed write.
    Written(u64),
}

impl UpsertStatus {
    /// Numeric status code: `Skipped` is 1, `NoOp` is 0, `Written(n)` is `n`.
    pub fn code(self) -> u64 {
        match self {
            UpsertStatus::Skipped => 1,
            UpsertStatus::NoOp => 0,
            UpsertStatus::Written(n) => n,
        }
    }

    /// One unit of credit for `Skipped` or a positive write count.
    pub fn credit(self) -> usize {
        match self {
            UpsertStatus::Skipped => 1,
            UpsertStatus::Written(n) if n > 0 => 1,
            UpsertStatus::Written(_) | UpsertStatus::NoOp => 0,
        }
    }
}

/// Everything one upsert routine did for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOutcome {
    pub kind: EntityKind,
    pub status: UpsertStatus,
    /// Sum of affected rows over all completed writes (informational).
    pub rows_written: u64,
    /// Store error that stopped the routine, if any.
    pub error: Option<String>,
}

impl EntityOutcome {
    fn skipped(kind: EntityKind) -> Self {
        Self {
            kind,
            status: UpsertStatus::Skipped,
            rows_written: 0,
            error: None,
        }
    }

    fn pending(kind: EntityKind) -> Self {
        Self {
            kind,
            status: UpsertStatus::NoOp,
            rows_written: 0,
            error: None,
        }
    }
}

/// Outcomes of the six upsert routines for one product, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsReport {
    pub product_id: ProductId,
    pub outcomes: Vec<EntityOutcome>,
}

impl DetailsReport {
    pub fn credits(&self) -> usize {
        self.outcomes.iter().map(|o| o.status.credit()).sum()
    }

    /// `true` iff every entity kind earned its credit.
    pub fn is_complete(&self) -> bool {
        self.credits() >= EntityKind::ALL.len()
    }

    pub fn outcome(&self, kind: EntityKind) -> Option<&EntityOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }

    /// Outcomes that hit a store error, including ones whose status still
    /// earned credit from writes completed before the error.
    pub fn failures(&self) -> impl Iterator<Item = &EntityOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// Writes product sub-entities to the store.
#[derive(Debug, Clone)]
pub struct UpsertEngine<S> {
    store: S,
}

impl<S: ProductStore> UpsertEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run all six upserts (no short-circuiting) and report whether each one
    /// either skipped or wrote at least one row.
    pub async fn insert_or_update_product_details(
        &self,
        product_id: ProductId,
        product: &Product,
    ) -> bool {
        self.sync_details(product_id, product).await.is_complete()
    }

    /// Run all six upserts in fixed order and collect their outcomes.
    #[instrument(skip(self, product), fields(product_id = %product_id))]
    pub async fn sync_details(&self, product_id: ProductId, product: &Product) -> DetailsReport {
        let outcomes = vec![
            self.applications(product_id, product.applications.as_deref()).await,
            self.cross_numbers(product_id, product.cross_numbers.as_deref()).await,
            self.packages(product_id, product.packages.as_deref()).await,
            self.parameters(product_id, product.parameters.as_deref()).await,
            self.images(product_id, product.images.as_deref()).await,
            self.files(product_id, product.files.as_deref()).await,
        ];

        let report = DetailsReport {
            product_id,
            outcomes,
        };
        for failed in report.failures() {
            warn!(
                entity = %failed.kind,
                status = ?failed.status,
                error = failed.error.as_deref().unwrap_or_default(),
                "sub-entity upsert stopped early"
            );
        }
        report
    }

    pub async fn upsert_applications(
        &self,
        product_id: ProductId,
        items: Option<&[ProductApplication]>,
    ) -> UpsertStatus {
        self.applications(product_id, items).await.status
    }

    pub async fn upsert_cross_numbers(
        &self,
        product_id: ProductId,
        items: Option<&[ProductCrossNumber]>,
    ) -> UpsertStatus {
        self.cross_numbers(product_id, items).await.status
    }

    pub async fn upsert_packages(
        &self,
        product_id: ProductId,
        items: Option<&[ProductPackage]>,
    ) -> UpsertStatus {
        self.packages(product_id, items).await.status
    }

    pub async fn upsert_parameters(
        &self,
        product_id: ProductId,
        items: Option<&[ProductParameter]>,
    ) -> UpsertStatus {
        self.parameters(product_id, items).await.status
    }

    pub async fn upsert_images(
        &self,
        product_id: ProductId,
        items: Option<&[ProductImage]>,
    ) -> UpsertStatus {
        self.images(product_id, items).await.status
    }

    pub async fn upsert_files(
        &self,
        product_id: ProductId,
        items: Option<&[ProductFile]>,
    ) -> UpsertStatus {
        self.files(product_id, items).await.status
    }

    async fn applications(
        &self,
        product_id: ProductId,
        items: Option<&[ProductApplication]>,
    ) -> EntityOutcome {
        let kind = EntityKind::Applications;
        match valid_items(items) {
            Some(valid) => {
                let rows = valid.into_iter().map(SubEntityRow::Application).collect();
                self.write(product_id, kind, rows).await
            }
            None => EntityOutcome::skipped(kind),
        }
    }

    async fn cross_numbers(
        &self,
        product_id: ProductId,
        items: Option<&[ProductCrossNumber]>,
    ) -> EntityOutcome {
        let kind = EntityKind::CrossNumbers;
        let rows: Vec<SubEntityRow<'_>> = split_cross_numbers(items.unwrap_or_default())
            .into_iter()
            .map(|(value, manufacturer)| SubEntityRow::CrossNumber {
                value,
                manufacturer,
            })
            .collect();
        if rows.is_empty() {
            return EntityOutcome::skipped(kind);
        }
        self.write(product_id, kind, rows).await
    }

    async fn packages(
        &self,
        product_id: ProductId,
        items: Option<&[ProductPackage]>,
    ) -> EntityOutcome {
        let kind = EntityKind::Packages;
        match valid_items(items) {
            Some(valid) => {
                let rows = valid.into_iter().map(SubEntityRow::Package).collect();
                self.write(product_id, kind, rows).await
            }
            None => EntityOutcome::skipped(kind),
        }
    }

    async fn parameters(
        &self,
        product_id: ProductId,
        items: Option<&[ProductParameter]>,
    ) -> EntityOutcome {
        let kind = EntityKind::Parameters;
        match valid_items(items) {
            Some(valid) => {
                let rows = valid.into_iter().map(SubEntityRow::Parameter).collect();
                self.write(product_id, kind, rows).await
            }
            None => EntityOutcome::skipped(kind),
        }
    }

    async fn images(&self, product_id: ProductId, items: Option<&[ProductImage]>) -> EntityOutcome {
        let kind = EntityKind::Images;
        match valid_items(items) {
            Some(valid) => {
                let rows = valid.into_iter().map(SubEntityRow::Image).collect();
                self.write(product_id, kind, rows).await
            }
            None => EntityOutcome::skipped(kind),
        }
    }

    async fn files(&self, product_id: ProductId, items: Option<&[ProductFile]>) -> EntityOutcome {
        let kind = EntityKind::Files;
        match valid_items(items) {
            Some(valid) => {
                let rows = valid.into_iter().map(SubEntityRow::File).collect();
                self.write(product_id, kind, rows).await
            }
            None => EntityOutcome::skipped(kind),
        }
    }

    async fn write(
        &self,
        product_id: ProductId,
        kind: EntityKind,
        rows: Vec<SubEntityRow<'_>>,
    ) -> EntityOutcome {
        let mut outcome = EntityOutcome::pending(kind);

        let mut session = match self.store.open_session(product_id).await {
            Ok(session) => session,
            Err(err) => {
                error!(
                    product_id = %product_id,
                    entity = %kind,
                    error = %err,
                    "error updating {kind}"
                );
                outcome.error = Some(err.to_string());
                return outcome;
            }
        };

        for row in rows {
            match session.upsert(row).await {
                Ok(affected) => {
                    outcome.status = UpsertStatus::Written(affected);
                    outcome.rows_written += affected;
                }
                Err(err) => {
                    error!(
                        product_id = %product_id,
                        entity = %kind,
                        error = %err,
                        "error updating {kind}"
                    );
                    outcome.error = Some(err.to_string());
                    break;
                }
            }
        }

        if let Err(err) = session.close().await {
            warn!(
                product_id = %product_id,
                entity = %kind,
                error = %err,
                "failed to close store session"
            );
        }

        debug!(
            product_id = %product_id,
            entity = %kind,
            status = ?outcome.status,
            rows_written = outcome.rows_written,
            "upsert finished"
        );
        outcome
    }
}

/// `None` when there is nothing to write: input absent, empty, or all blank.
fn valid_items<T: Discriminated>(items: Option<&[T]>) -> Option<Vec<&T>> {
    let valid = retain_valid(items?);
    (!valid.is_empty()).then_some(valid)
}
