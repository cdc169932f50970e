//! XML export of fetched products.
//!
//! One document per input file: a `<Products>` root with one `<Product>` per
//! fetched product, every value sanitised and wrapped in CDATA.

pub mod description;
pub mod error;
pub mod exporter;
pub mod sanitize;

pub use description::{cross_number_list, html_description, image_url_list};
pub use error::ExportError;
pub use exporter::{FILE_TIMESTAMP_FORMAT, XmlExporter, output_file_name, render};
pub use sanitize::{is_xml_char, sanitize_xml_text};
