//! Percent-encoding used for store paths and query values.
//!
//! The store server expects the classic `quote` behaviour: everything except
//! ASCII alphanumerics, `_`, `.`, `-` and `/` is escaped, with multi-byte
//! characters escaped per UTF-8 byte.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const QUOTE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/');

/// Percent-encode `text`, leaving `/` intact.
pub fn quote(text: &str) -> String {
    utf8_percent_encode(text, QUOTE).to_string()
}

/// Escape a path for the `self://` scheme: only `%` and `?` are touched.
pub(crate) fn escape_self(path: &str) -> String {
    path.replace('%', "%25").replace('?', "%3F")
}
