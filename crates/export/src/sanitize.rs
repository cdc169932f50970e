//! XML 1.0 character filtering.

use std::borrow::Cow;

/// `true` for characters XML 1.0 allows in a document.
///
/// Surrogates cannot occur in a `char`; lone ones are removed earlier, when
/// the response body is decoded.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drop every character XML cannot carry. Borrows when nothing is dropped.
pub fn sanitize_xml_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}
