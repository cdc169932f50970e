//! Catalog wire format helpers.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer};

use crate::product::{Product, ProductEnvelope};

/// Decode a `null` JSON value as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a catalog response body into its product, if it carries one.
///
/// Lone UTF-16 surrogate escapes are removed first: they cannot be represented
/// in a Rust string and would otherwise reject the whole record.
pub fn decode_envelope(body: &str) -> Result<Option<Product>, serde_json::Error> {
    let body = strip_lone_surrogate_escapes(body);
    let envelope: ProductEnvelope = serde_json::from_str(&body)?;
    Ok(envelope.product)
}

/// Remove `\uD800`–`\uDFFF` escapes that are not part of a valid surrogate pair.
pub fn strip_lone_surrogate_escapes(body: &str) -> Cow<'_, str> {
    if !body.contains("\\u") {
        return Cow::Borrowed(body);
    }

    let bytes = body.as_bytes();
    let mut out = String::new();
    let mut copied_up_to = 0;
    let mut changed = false;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }

        match unicode_escape(bytes, i) {
            Some(0xD800..=0xDBFF) => {
                if let Some(0xDC00..=0xDFFF) = unicode_escape(bytes, i + 6) {
                    i += 12;
                    continue;
                }
            }
            Some(0xDC00..=0xDFFF) => {}
            Some(_) => {
                i += 6;
                continue;
            }
            None => {
                // `\"`, `\\`, `\n`, ...: skip the escaped character too.
                i += 2;
                continue;
            }
        }

        out.push_str(&body[copied_up_to..i]);
        i += 6;
        copied_up_to = i;
        changed = true;
    }

    if !changed {
        return Cow::Borrowed(body);
    }
    out.push_str(&body[copied_up_to..]);
    Cow::Owned(out)
}

/// The code unit of a `\uXXXX` escape starting at `at`.
fn unicode_escape(bytes: &[u8], at: usize) -> Option<u16> {
    if bytes.get(at) != Some(&b'\\') || bytes.get(at + 1) != Some(&b'u') {
        return None;
    }
    let hex = bytes.get(at + 2..at + 6)?;
    let hex = std::str::from_utf8(hex).ok()?;
    u16::from_str_radix(hex, 16).ok()
}
