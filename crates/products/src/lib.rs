//! Product master-data model.
//!
//! This crate contains the catalog record shape and the rules that decide which
//! parts of it are worth persisting or exporting, implemented as pure logic
//! (no IO, no HTTP, no storage).

pub mod cross_number;
pub mod entities;
pub mod product;
pub mod wire;

pub use cross_number::{split_cross_numbers, split_cross_tokens};
pub use entities::{
    Discriminated, ProductApplication, ProductCrossNumber, ProductFile, ProductImage,
    ProductPackage, ProductParameter, is_blank, retain_valid,
};
pub use product::{Product, ProductEnvelope};
pub use wire::{decode_envelope, strip_lone_surrogate_escapes};
