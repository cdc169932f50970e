use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};
use tracing::{error, info, instrument};

use partsync_products::Product;

use crate::description::{cross_number_list, html_description, image_url_list};
use crate::error::ExportError;
use crate::sanitize::sanitize_xml_text;

/// Timestamp layout shared by export and archive file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `{input_stem}_{yyyyMMdd_HHmmss}.xml`
pub fn output_file_name(input_path: &Path, at: NaiveDateTime) -> Result<String, ExportError> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ExportError::InputName(input_path.to_path_buf()))?;
    Ok(format!("{}_{}.xml", stem, at.format(FILE_TIMESTAMP_FORMAT)))
}

/// Writes one XML document per input file into the result directory.
#[derive(Debug, Clone)]
pub struct XmlExporter {
    result_dir: PathBuf,
}

impl XmlExporter {
    pub fn new(result_dir: impl Into<PathBuf>) -> Self {
        Self {
            result_dir: result_dir.into(),
        }
    }

    /// Export `products` for `input_path`.
    ///
    /// Returns the written file, or `None` (after logging an error) when there
    /// is nothing to export.
    #[instrument(
        skip(self, products),
        fields(input = %input_path.display(), products = products.len())
    )]
    pub fn export(
        &self,
        input_path: &Path,
        products: &[Product],
        at: NaiveDateTime,
    ) -> Result<Option<PathBuf>, ExportError> {
        if products.is_empty() {
            error!("no products to export");
            return Ok(None);
        }

        let path = self.result_dir.join(output_file_name(input_path, at)?);
        let document = render(products)?;

        fs::create_dir_all(&self.result_dir).map_err(|source| ExportError::CreateDir {
            path: self.result_dir.clone(),
            source,
        })?;
        fs::write(&path, document).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "wrote export file");
        Ok(Some(path))
    }
}

/// Render the full document, UTF-8, two-space indented.
pub fn render(products: &[Product]) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(ExportError::xml)?;
    start(&mut writer, "Products")?;
    for product in products {
        write_product(&mut writer, product)?;
    }
    end(&mut writer, "Products")?;

    Ok(writer.into_inner())
}

fn write_product(writer: &mut Writer<Vec<u8>>, product: &Product) -> Result<(), ExportError> {
    start(writer, "Product")?;

    cdata_element(writer, "Id", &product.id.to_string())?;
    cdata_element(writer, "CodeGaska", &product.external_code)?;
    cdata_element(writer, "Name", &product.name)?;
    cdata_element(writer, "Supplier", &product.supplier)?;
    cdata_element(writer, "ImageUrls", &image_url_list(product))?;
    if let Some(cross_numbers) = cross_number_list(product) {
        cdata_element(writer, "CrossNumbers", &cross_numbers)?;
    }
    cdata_element(writer, "ProductHTMLDescription", &html_description(product))?;

    end(writer, "Product")
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ExportError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(ExportError::xml)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ExportError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(ExportError::xml)
}

/// `<name><![CDATA[value]]></name>` with `value` sanitised first.
fn cdata_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &str,
) -> Result<(), ExportError> {
    let value = sanitize_xml_text(value);
    start(writer, name)?;
    for section in cdata_sections(&value) {
        writer
            .write_event(Event::CData(BytesCData::new(section)))
            .map_err(ExportError::xml)?;
    }
    end(writer, name)
}

/// Split text so no section contains `]]>`; the terminator is broken between
/// `]]` and `>`.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use partsync_products::{ProductApplication, ProductCrossNumber};

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 5))
            .expect("valid timestamp")
    }

    fn pump() -> Product {
        Product {
            id: 42,
            external_code: "X1".to_string(),
            name: "Pompa".to_string(),
            supplier: "Gaska".to_string(),
            applications: Some(vec![ProductApplication {
                id: 1,
                name: "Pumps".to_string(),
            }]),
            cross_numbers: Some(vec![ProductCrossNumber {
                cross_number: "AA-1, BB-2".to_string(),
                cross_manufacturer: "ACME".to_string(),
            }]),
            ..Default::default()
        }
    }

    fn rendered(products: &[Product]) -> String {
        String::from_utf8(render(products).expect("render")).expect("utf-8")
    }

    #[test]
    fn file_name_uses_input_stem_and_timestamp() {
        assert_eq!(
            output_file_name(Path::new("input/codes.txt"), at()).unwrap(),
            "codes_20240501_083005.xml"
        );
    }

    #[test]
    fn renders_product_elements_in_cdata() {
        let xml = rendered(&[pump()]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<Id><![CDATA[42]]></Id>"));
        assert!(xml.contains("<CodeGaska><![CDATA[X1]]></CodeGaska>"));
        assert!(xml.contains("<Supplier><![CDATA[Gaska]]></Supplier>"));
        assert!(xml.contains("<ImageUrls><![CDATA[]]></ImageUrls>"));
        assert!(xml.contains("<CrossNumbers><![CDATA[AA-1, BB-2]]></CrossNumbers>"));
        assert!(xml.contains(
            "<ProductHTMLDescription><![CDATA[<p><b>Numery referencyjne: </b>AA-1, BB-2</p>\
             <p><b>Zastosowanie: </b>Pumps</p>]]></ProductHTMLDescription>"
        ));
        assert!(xml.contains("\n  <Product>\n    <Id>"));
    }

    #[test]
    fn cross_numbers_element_is_omitted_without_cross_numbers() {
        let xml = rendered(&[Product {
            id: 1,
            ..Default::default()
        }]);
        assert!(!xml.contains("<CrossNumbers>"));
        assert!(xml.contains("<ProductHTMLDescription><![CDATA[]]></ProductHTMLDescription>"));
    }

    #[test]
    fn invalid_characters_are_stripped_from_affected_fields_only() {
        let mut product = pump();
        product.name = "Pom\u{0}pa\u{FFFF}".to_string();
        let xml = rendered(&[product]);

        assert!(xml.contains("<Name><![CDATA[Pompa]]></Name>"));
        assert!(xml.contains("<CodeGaska><![CDATA[X1]]></CodeGaska>"));
        assert!(!xml.contains('\u{0}'));
    }

    #[test]
    fn cdata_terminator_is_split() {
        assert_eq!(cdata_sections("plain"), vec!["plain"]);
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("]]>]]>"), vec!["]]", ">]]", ">"]);

        let mut product = pump();
        product.name = "x]]>y".to_string();
        let xml = rendered(&[product]);
        assert!(xml.contains("<Name><![CDATA[x]]]]><![CDATA[>y]]></Name>"));
    }

    #[test]
    fn products_keep_input_order() {
        let first = Product {
            id: 2,
            ..Default::default()
        };
        let second = Product {
            id: 1,
            ..Default::default()
        };
        let xml = rendered(&[first, second]);
        let a = xml.find("<![CDATA[2]]>").unwrap();
        let b = xml.find("<![CDATA[1]]>").unwrap();
        assert!(a < b);
    }

    #[test]
    fn export_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = XmlExporter::new(dir.path().join("result"));

        let path = exporter
            .export(Path::new("input/batch.txt"), &[pump()], at())
            .unwrap()
            .expect("file written");

        assert_eq!(path, dir.path().join("result").join("batch_20240501_083005.xml"));
        let xml = fs::read_to_string(&path).unwrap();
        assert!(xml.contains("<Name><![CDATA[Pompa]]></Name>"));
    }

    #[test]
    fn empty_product_list_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = XmlExporter::new(dir.path().join("result"));

        let written = exporter.export(Path::new("batch.txt"), &[], at()).unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join("result").exists());
    }
}
