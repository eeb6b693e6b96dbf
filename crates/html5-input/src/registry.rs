//! Encoding label resolution.
//!
//! Labels are resolved with the WHATWG Encoding Standard table shipped by
//! `encoding_rs`, so `"latin1"`, `"ISO-8859-1"` and `"ascii"` all name
//! windows-1252 and `" UTF8 "` names UTF-8.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252, X_USER_DEFINED};

/// Label of the legacy single-byte encoding every cascade ends with.
pub(crate) const DEFAULT_ENCODING_LABEL: &str = "windows-1252";

/// Resolve an encoding label.
///
/// Matching ignores ASCII case and surrounding ASCII whitespace. Unknown
/// labels yield `None`.
#[must_use]
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    lookup_bytes(label.as_bytes())
}

/// Resolve an encoding label given as raw bytes, as found by the `<meta>`
/// prescan. Non-ASCII labels never resolve.
#[must_use]
pub fn lookup_bytes(label: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_label(label)
}

/// Whether `encoding` is UTF-16LE or UTF-16BE.
#[must_use]
pub fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16LE || encoding == UTF_16BE
}

/// Apply the redirection rules for encodings declared inside a document.
///
/// A document readable enough to contain an ASCII `<meta>` declaration cannot
/// be UTF-16, so UTF-16 declarations mean UTF-8. `x-user-defined` means
/// windows-1252.
#[must_use]
pub fn coerce_declared(encoding: &'static Encoding) -> &'static Encoding {
    if is_utf16(encoding) {
        UTF_8
    } else if encoding == X_USER_DEFINED {
        WINDOWS_1252
    } else {
        encoding
    }
}

/// Resolve an optional caller-supplied label, logging labels that do not
/// resolve.
pub(crate) fn lookup_hint(step: &str, label: Option<&str>) -> Option<&'static Encoding> {
    let label = label?;
    let encoding = lookup(label);
    if encoding.is_none() {
        log::debug!("{step}: ignoring unknown encoding label {label:?}");
    }
    encoding
}

#[cfg(test)]
mod tests {
    use encoding_rs::{SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_USER_DEFINED};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("utf-8", UTF_8)]
    #[case("UTF8", UTF_8)]
    #[case("  utf-8\t", UTF_8)]
    #[case("latin1", WINDOWS_1252)]
    #[case("ISO-8859-1", WINDOWS_1252)]
    #[case("us-ascii", WINDOWS_1252)]
    #[case("sjis", SHIFT_JIS)]
    #[case("utf-16", UTF_16LE)]
    fn resolves_aliases(#[case] label: &str, #[case] expected: &'static Encoding) {
        assert_eq!(lookup(label), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("utf-9")]
    #[case("latin-1-ish")]
    fn unknown_labels_are_none(#[case] label: &str) {
        assert_eq!(lookup(label), None);
    }

    #[test]
    fn non_ascii_bytes_never_resolve() {
        assert_eq!(lookup_bytes(b"utf\xFF8"), None);
    }

    #[test]
    fn declared_encodings_are_redirected() {
        assert_eq!(coerce_declared(UTF_16LE), UTF_8);
        assert_eq!(coerce_declared(UTF_16BE), UTF_8);
        assert_eq!(coerce_declared(X_USER_DEFINED), WINDOWS_1252);
        assert_eq!(coerce_declared(SHIFT_JIS), SHIFT_JIS);
    }

    #[test]
    fn fallback_matches_default_label() {
        assert_eq!(lookup(DEFAULT_ENCODING_LABEL), Some(WINDOWS_1252));
    }
}
