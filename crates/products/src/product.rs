use serde::{Deserialize, Serialize};

use partsync_core::ProductId;

use crate::entities::{
    ProductApplication, ProductCrossNumber, ProductFile, ProductImage, ProductPackage,
    ProductParameter,
};
use crate::wire::null_as_default;

/// Catalog record for one product.
///
/// Collections are `None` when the catalog did not send them at all, which is
/// kept distinct from an empty list. `supplier` is never part of the catalog
/// payload; it is stamped from configuration right after a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, alias = "Id", deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(
        rename = "codeGaska",
        alias = "CodeGaska",
        default,
        deserialize_with = "null_as_default"
    )]
    pub external_code: String,
    #[serde(
        rename = "codeCustomer",
        alias = "CodeCustomer",
        default,
        deserialize_with = "null_as_default"
    )]
    pub customer_code: String,
    #[serde(default, alias = "Name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_deserializing)]
    pub supplier: String,

    #[serde(default, alias = "Packages")]
    pub packages: Option<Vec<ProductPackage>>,
    #[serde(default, alias = "CrossNumbers")]
    pub cross_numbers: Option<Vec<ProductCrossNumber>>,
    #[serde(default, alias = "Applications")]
    pub applications: Option<Vec<ProductApplication>>,
    #[serde(default, alias = "Parameters")]
    pub parameters: Option<Vec<ProductParameter>>,
    #[serde(default, alias = "Images")]
    pub images: Option<Vec<ProductImage>>,
    #[serde(default, alias = "Files")]
    pub files: Option<Vec<ProductFile>>,
}

impl Product {
    /// Overwrite the supplier with the configured value.
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = supplier.into();
        self
    }

    pub fn product_id(&self) -> Option<ProductId> {
        ProductId::from_store(self.id)
    }

    pub fn applications(&self) -> &[ProductApplication] {
        self.applications.as_deref().unwrap_or_default()
    }

    pub fn cross_numbers(&self) -> &[ProductCrossNumber] {
        self.cross_numbers.as_deref().unwrap_or_default()
    }

    pub fn packages(&self) -> &[ProductPackage] {
        self.packages.as_deref().unwrap_or_default()
    }

    pub fn parameters(&self) -> &[ProductParameter] {
        self.parameters.as_deref().unwrap_or_default()
    }

    pub fn images(&self) -> &[ProductImage] {
        self.images.as_deref().unwrap_or_default()
    }

    pub fn files(&self) -> &[ProductFile] {
        self.files.as_deref().unwrap_or_default()
    }
}

/// Outer object returned by the catalog's `product` resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEnvelope {
    #[serde(rename = "Product", alias = "product", default)]
    pub product: Option<Product>,
}
