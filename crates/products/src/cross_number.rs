//! Splitting of composite cross-reference numbers.

use crate::entities::{Discriminated, ProductCrossNumber};

/// Split one raw `crossNumber` value into individual reference numbers.
///
/// Tokens are separated by `,`, trimmed, and dropped when nothing is left after
/// trimming. Order is preserved.
pub fn split_cross_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Every individual reference number of a product, in catalog order, paired
/// with the manufacturer of the entry it came from.
pub fn split_cross_numbers(items: &[ProductCrossNumber]) -> Vec<(&str, &str)> {
    items
        .iter()
        .filter(|item| item.is_persistable())
        .flat_map(|item| {
            split_cross_tokens(&item.cross_number)
                .map(move |token| (token, item.cross_manufacturer.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cn(raw: &str, manufacturer: &str) -> ProductCrossNumber {
        ProductCrossNumber {
            cross_number: raw.to_string(),
            cross_manufacturer: manufacturer.to_string(),
        }
    }

    #[test]
    fn splits_and_trims_in_order() {
        let tokens: Vec<&str> = split_cross_tokens("A,B , C").collect();
        assert_eq!(tokens, vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let tokens: Vec<&str> = split_cross_tokens(" ,AA-1,, ,BB-2,").collect();
        assert_eq!(tokens, vec!["AA-1", "BB-2"]);
    }

    #[test]
    fn manufacturer_is_shared_by_all_tokens_of_an_entry() {
        let items = vec![cn("AA-1, BB-2", "ACME"), cn("   ", "Ghost"), cn("X9", "Other")];
        assert_eq!(
            split_cross_numbers(&items),
            vec![("AA-1", "ACME"), ("BB-2", "ACME"), ("X9", "Other")]
        );
    }

    proptest! {
        #[test]
        fn tokens_never_contain_commas_or_edge_whitespace(raw in "[ A-Z0-9,\\-]{0,40}") {
            for token in split_cross_tokens(&raw) {
                prop_assert!(!token.contains(','));
                prop_assert!(!token.is_empty());
                prop_assert_eq!(token, token.trim());
            }
        }

        #[test]
        fn joined_tokens_round_trip(tokens in proptest::collection::vec("[A-Z0-9\\-]{1,8}", 0..6)) {
            let raw = tokens.join(" , ");
            let split: Vec<&str> = split_cross_tokens(&raw).collect();
            prop_assert_eq!(split, tokens.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
