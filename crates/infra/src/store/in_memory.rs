use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;

use partsync_core::ProductId;

use super::r#trait::{EntityKind, ProductStore, StoreError, StoreSession, SubEntityRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRow {
    pub id: i64,
    pub parent_id: ProductId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossNumberRow {
    pub product_id: ProductId,
    pub value: String,
    pub manufacturer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub product_id: ProductId,
    pub pack_unit: String,
    pub pack_qty: Decimal,
    pub pack_nett_weight: Decimal,
    pub pack_gross_weight: Decimal,
    pub pack_ean: String,
    pub pack_required: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub product_id: ProductId,
    pub attribute_id: i64,
    pub attribute_name: String,
    pub attribute_value: String,
}

/// Image or file row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub product_id: ProductId,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Default)]
struct Tables {
    codes: Vec<(String, ProductId)>,
    applications: Vec<ApplicationRow>,
    cross_numbers: Vec<CrossNumberRow>,
    packages: Vec<PackageRow>,
    parameters: Vec<ParameterRow>,
    images: Vec<LinkRow>,
    files: Vec<LinkRow>,
    /// Entity kind -> number of writes a session may do before failing.
    failures: HashMap<EntityKind, usize>,
    unavailable: bool,
}

/// In-memory product store.
///
/// Intended for tests/dev. Uniqueness keys match the Postgres backend, rows
/// keep insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an external code for an existing product.
    pub fn with_product(self, code: impl Into<String>, id: ProductId) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.codes.push((code.into(), id));
        }
        self
    }

    /// Make every session fail on its first write of `kind`.
    pub fn fail_entity(&self, kind: EntityKind) {
        self.fail_entity_after(kind, 0);
    }

    /// Let a session write `writes` rows of `kind`, then fail.
    pub fn fail_entity_after(&self, kind: EntityKind, writes: usize) {
        if let Ok(mut tables) = self.tables.write() {
            tables.failures.insert(kind, writes);
        }
    }

    /// Simulate a store that refuses connections.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut tables) = self.tables.write() {
            tables.unavailable = unavailable;
        }
    }

    pub fn applications(&self, product_id: ProductId) -> Vec<ApplicationRow> {
        self.read(|t| filter(&t.applications, |r| r.parent_id == product_id))
    }

    pub fn cross_numbers(&self, product_id: ProductId) -> Vec<CrossNumberRow> {
        self.read(|t| filter(&t.cross_numbers, |r| r.product_id == product_id))
    }

    pub fn packages(&self, product_id: ProductId) -> Vec<PackageRow> {
        self.read(|t| filter(&t.packages, |r| r.product_id == product_id))
    }

    pub fn parameters(&self, product_id: ProductId) -> Vec<ParameterRow> {
        self.read(|t| filter(&t.parameters, |r| r.product_id == product_id))
    }

    pub fn images(&self, product_id: ProductId) -> Vec<LinkRow> {
        self.read(|t| filter(&t.images, |r| r.product_id == product_id))
    }

    pub fn files(&self, product_id: ProductId) -> Vec<LinkRow> {
        self.read(|t| filter(&t.files, |r| r.product_id == product_id))
    }

    fn read<T: Default>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        self.tables.read().map(|t| f(&t)).unwrap_or_default()
    }
}

fn filter<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().filter(|r| keep(r)).cloned().collect()
}

/// Update the first row matching `key`, or append `row`. Always one affected row.
fn upsert_by<T>(
    rows: &mut Vec<T>,
    row: T,
    key: impl Fn(&T, &T) -> bool,
    update: impl FnOnce(&mut T, T),
) -> u64 {
    match rows.iter_mut().find(|existing| key(existing, &row)) {
        Some(existing) => update(existing, row),
        None => rows.push(row),
    }
    1
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_product_id(&self, code: &str) -> Result<Option<ProductId>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Query("lock poisoned".to_string()))?;
        if tables.unavailable {
            return Err(StoreError::Connection("store unavailable".to_string()));
        }
        Ok(tables
            .codes
            .iter()
            .find(|(known, _)| known == code)
            .map(|(_, id)| *id))
    }

    async fn open_session(
        &self,
        product_id: ProductId,
    ) -> Result<Box<dyn StoreSession>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Query("lock poisoned".to_string()))?;
        if tables.unavailable {
            return Err(StoreError::Connection("store unavailable".to_string()));
        }
        Ok(Box::new(InMemorySession {
            tables: self.tables.clone(),
            product_id,
            writes: 0,
        }))
    }
}

struct InMemorySession {
    tables: Arc<RwLock<Tables>>,
    product_id: ProductId,
    writes: usize,
}

#[async_trait]
impl StoreSession for InMemorySession {
    async fn upsert(&mut self, row: SubEntityRow<'_>) -> Result<u64, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Query("lock poisoned".to_string()))?;

        if let Some(allowed) = tables.failures.get(&row.kind()) {
            if self.writes >= *allowed {
                return Err(StoreError::Query(format!(
                    "injected failure writing {}",
                    row.kind()
                )));
            }
        }
        self.writes += 1;

        let product_id = self.product_id;
        let affected = match row {
            SubEntityRow::Application(app) => upsert_by(
                &mut tables.applications,
                ApplicationRow {
                    id: app.id,
                    parent_id: product_id,
                    name: app.name.clone(),
                },
                |a, b| a.id == b.id && a.parent_id == b.parent_id,
                |existing, new| existing.name = new.name,
            ),
            SubEntityRow::CrossNumber { value, manufacturer } => upsert_by(
                &mut tables.cross_numbers,
                CrossNumberRow {
                    product_id,
                    value: value.to_string(),
                    manufacturer: manufacturer.to_string(),
                },
                |a, b| a.product_id == b.product_id && a.value == b.value,
                |existing, new| existing.manufacturer = new.manufacturer,
            ),
            SubEntityRow::Package(pkg) => upsert_by(
                &mut tables.packages,
                PackageRow {
                    product_id,
                    pack_unit: pkg.pack_unit.clone(),
                    pack_qty: pkg.pack_qty,
                    pack_nett_weight: pkg.pack_nett_weight,
                    pack_gross_weight: pkg.pack_gross_weight,
                    pack_ean: pkg.pack_ean.clone(),
                    pack_required: pkg.pack_required,
                },
                |a, b| a.product_id == b.product_id,
                // EAN is written on insert only.
                |existing, new| {
                    existing.pack_unit = new.pack_unit;
                    existing.pack_qty = new.pack_qty;
                    existing.pack_nett_weight = new.pack_nett_weight;
                    existing.pack_gross_weight = new.pack_gross_weight;
                    existing.pack_required = new.pack_required;
                },
            ),
            SubEntityRow::Parameter(param) => upsert_by(
                &mut tables.parameters,
                ParameterRow {
                    product_id,
                    attribute_id: param.attribute_id,
                    attribute_name: param.attribute_name.clone(),
                    attribute_value: param.attribute_value.clone(),
                },
                |a, b| a.product_id == b.product_id && a.attribute_id == b.attribute_id,
                |existing, new| {
                    existing.attribute_name = new.attribute_name;
                    existing.attribute_value = new.attribute_value;
                },
            ),
            SubEntityRow::Image(image) => upsert_by(
                &mut tables.images,
                LinkRow {
                    product_id,
                    title: image.title.clone(),
                    url: image.url.clone(),
                },
                |a, b| a.product_id == b.product_id && a.title == b.title,
                |existing, new| existing.url = new.url,
            ),
            SubEntityRow::File(file) => upsert_by(
                &mut tables.files,
                LinkRow {
                    product_id,
                    title: file.title.clone(),
                    url: file.url.clone(),
                },
                |a, b| a.product_id == b.product_id && a.title == b.title,
                |existing, new| existing.url = new.url,
            ),
        };

        Ok(affected)
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
