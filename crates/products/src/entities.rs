//! Product sub-entities and their discriminator rules.
//!
//! Every sub-entity has one or two text fields whose blankness decides whether
//! the item is kept. A blank discriminator is not an error: the item is simply
//! left out of persistence and export.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::wire::null_as_default;

/// `true` for empty and whitespace-only text.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// A sub-entity that can be excluded on a blank discriminator.
pub trait Discriminated {
    /// Whether the item carries enough data to be persisted and exported.
    fn is_persistable(&self) -> bool;
}

/// Keep only persistable items, preserving order.
pub fn retain_valid<T: Discriminated>(items: &[T]) -> Vec<&T> {
    items.iter().filter(|item| item.is_persistable()).collect()
}

/// Machine/vehicle the product fits. `id` comes from the catalog, not the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductApplication {
    #[serde(default, alias = "Id", deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, alias = "Name", deserialize_with = "null_as_default")]
    pub name: String,
}

impl Discriminated for ProductApplication {
    fn is_persistable(&self) -> bool {
        !is_blank(&self.name)
    }
}

/// Reference numbers of other manufacturers.
///
/// `cross_number` may hold several numbers separated by commas; see
/// [`crate::split_cross_numbers`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCrossNumber {
    #[serde(default, alias = "CrossNumber", deserialize_with = "null_as_default")]
    pub cross_number: String,
    #[serde(default, alias = "CrossManufacturer", deserialize_with = "null_as_default")]
    pub cross_manufacturer: String,
}

impl Discriminated for ProductCrossNumber {
    fn is_persistable(&self) -> bool {
        !is_blank(&self.cross_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPackage {
    #[serde(default, alias = "PackUnit", deserialize_with = "null_as_default")]
    pub pack_unit: String,
    #[serde(default, alias = "PackQty", deserialize_with = "null_as_default")]
    pub pack_qty: Decimal,
    #[serde(default, alias = "PackNettWeight", deserialize_with = "null_as_default")]
    pub pack_nett_weight: Decimal,
    #[serde(default, alias = "PackGrossWeight", deserialize_with = "null_as_default")]
    pub pack_gross_weight: Decimal,
    #[serde(default, alias = "PackEan", deserialize_with = "null_as_default")]
    pub pack_ean: String,
    #[serde(default, alias = "PackRequired", deserialize_with = "null_as_default")]
    pub pack_required: i32,
}

impl Discriminated for ProductPackage {
    fn is_persistable(&self) -> bool {
        !is_blank(&self.pack_unit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductParameter {
    #[serde(default, alias = "AttributeId", deserialize_with = "null_as_default")]
    pub attribute_id: i64,
    #[serde(default, alias = "AttributeName", deserialize_with = "null_as_default")]
    pub attribute_name: String,
    #[serde(default, alias = "AttributeValue", deserialize_with = "null_as_default")]
    pub attribute_value: String,
}

impl Discriminated for ProductParameter {
    fn is_persistable(&self) -> bool {
        !is_blank(&self.attribute_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    #[serde(default, alias = "Title", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, alias = "Url", deserialize_with = "null_as_default")]
    pub url: String,
}

impl Discriminated for ProductImage {
    fn is_persistable(&self) -> bool {
        !is_blank(&self.title) && !is_blank(&self.url)
    }
}

/// Downloadable document (manual, certificate, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFile {
    #[serde(default, alias = "Title", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, alias = "Url", deserialize_with = "null_as_default")]
    pub url: String,
}

impl Discriminated for ProductFile {
    fn is_persistable(&self) -> bool {
        !is_blank(&self.title) && !is_blank(&self.url)
    }
}
