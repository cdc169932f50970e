//! Derived text fields of an exported product.
//!
//! Items with a blank discriminator never show up here, matching what the
//! upsert engine persists.

use partsync_products::{Product, retain_valid, split_cross_numbers};

const PARAMETERS_LABEL: &str = "Parametry: ";
const CROSS_NUMBERS_LABEL: &str = "Numery referencyjne: ";
const APPLICATIONS_LABEL: &str = "Zastosowanie: ";

/// Image URLs joined with `,`.
pub fn image_url_list(product: &Product) -> String {
    retain_valid(product.images())
        .into_iter()
        .map(|image| image.url.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split, trimmed cross numbers joined with `", "`; `None` when there are none.
pub fn cross_number_list(product: &Product) -> Option<String> {
    let tokens: Vec<&str> = split_cross_numbers(product.cross_numbers())
        .into_iter()
        .map(|(value, _)| value)
        .collect();
    (!tokens.is_empty()).then(|| tokens.join(", "))
}

/// HTML description: parameters, cross numbers, applications, each block
/// present only when it has content. Empty string when all three are empty.
pub fn html_description(product: &Product) -> String {
    let mut html = String::new();

    let parameters: Vec<String> = retain_valid(product.parameters())
        .into_iter()
        .map(|p| format!("{} : {}", p.attribute_name, p.attribute_value))
        .collect();
    push_block(&mut html, PARAMETERS_LABEL, &parameters.join(", "));

    if let Some(cross_numbers) = cross_number_list(product) {
        push_block(&mut html, CROSS_NUMBERS_LABEL, &cross_numbers);
    }

    let applications: Vec<&str> = retain_valid(product.applications())
        .into_iter()
        .map(|a| a.name.as_str())
        .collect();
    push_block(&mut html, APPLICATIONS_LABEL, &applications.join(", "));

    html
}

fn push_block(html: &mut String, label: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    html.push_str("<p><b>");
    html.push_str(label);
    html.push_str("</b>");
    html.push_str(body);
    html.push_str("</p>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use partsync_products::{
        ProductApplication, ProductCrossNumber, ProductImage, ProductParameter,
    };
    use proptest::prelude::*;

    fn cross(raw: &str) -> ProductCrossNumber {
        ProductCrossNumber {
            cross_number: raw.to_string(),
            cross_manufacturer: "ACME".to_string(),
        }
    }

    #[test]
    fn cross_numbers_and_applications_without_parameters() {
        let product = Product {
            applications: Some(vec![ProductApplication {
                id: 1,
                name: "Pumps".to_string(),
            }]),
            cross_numbers: Some(vec![cross("AA-1, BB-2")]),
            ..Default::default()
        };

        assert_eq!(
            html_description(&product),
            "<p><b>Numery referencyjne: </b>AA-1, BB-2</p><p><b>Zastosowanie: </b>Pumps</p>"
        );
    }

    #[test]
    fn parameters_block_comes_first() {
        let product = Product {
            parameters: Some(vec![
                ProductParameter {
                    attribute_id: 1,
                    attribute_name: "Średnica".to_string(),
                    attribute_value: "12 mm".to_string(),
                },
                ProductParameter {
                    attribute_id: 2,
                    attribute_name: "Kolor".to_string(),
                    attribute_value: "czarny".to_string(),
                },
            ]),
            applications: Some(vec![ProductApplication {
                id: 3,
                name: "Saws".to_string(),
            }]),
            ..Default::default()
        };

        assert_eq!(
            html_description(&product),
            "<p><b>Parametry: </b>Średnica : 12 mm, Kolor : czarny</p>\
             <p><b>Zastosowanie: </b>Saws</p>"
        );
    }

    #[test]
    fn cross_number_list_splits_and_trims() {
        let product = Product {
            cross_numbers: Some(vec![cross("A,B , C"), cross(" , D")]),
            ..Default::default()
        };
        assert_eq!(cross_number_list(&product).as_deref(), Some("A, B, C, D"));
        assert_eq!(cross_number_list(&Product::default()), None);
    }

    #[test]
    fn image_urls_skip_incomplete_images() {
        let product = Product {
            images: Some(vec![
                ProductImage {
                    title: "front".to_string(),
                    url: "https://img/1.jpg".to_string(),
                },
                ProductImage {
                    title: "".to_string(),
                    url: "https://img/2.jpg".to_string(),
                },
                ProductImage {
                    title: "back".to_string(),
                    url: "https://img/3.jpg".to_string(),
                },
            ]),
            ..Default::default()
        };
        assert_eq!(image_url_list(&product), "https://img/1.jpg,https://img/3.jpg");
    }

    proptest! {
        #[test]
        fn no_sub_entities_means_empty_description(
            id in any::<i64>(),
            name in ".*",
            blank_names in proptest::collection::vec("[ \t]*", 0..4),
        ) {
            let product = Product {
                id,
                name,
                applications: Some(
                    blank_names
                        .iter()
                        .map(|n| ProductApplication { id: 1, name: n.clone() })
                        .collect(),
                ),
                cross_numbers: Some(Vec::new()),
                ..Default::default()
            };
            prop_assert_eq!(html_description(&product), "");
            prop_assert_eq!(cross_number_list(&product), None);
        }
    }
}
