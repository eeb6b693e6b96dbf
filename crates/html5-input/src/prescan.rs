//! `<meta>` prescan over the head of a document.
//!
//! Follows the WHATWG "prescan a byte stream to determine its encoding"
//! algorithm: comments and non-meta markup are skipped, `<meta>` attributes
//! are parsed with the tokenizer's quoting rules, and the first declaration
//! that resolves to a known encoding wins.

use bstr::ByteSlice;
use encoding_rs::Encoding;

use crate::registry::{coerce_declared, lookup_bytes};

/// Bytes the prescan looks at, at most.
pub(crate) const PRESCAN_LIMIT: usize = 1024;

/// Find the encoding declared by a `<meta>` element in the first 1024 bytes
/// of `bytes`.
///
/// UTF-16 declarations are reported as UTF-8 and `x-user-defined` as
/// windows-1252. Returns `None` when no declaration resolves.
///
/// ```rust
/// let found = html5_input::prescan(b"<!doctype html><meta charset='koi8-r'>");
/// assert_eq!(found, Some(encoding_rs::KOI8_R));
/// ```
#[must_use]
pub fn prescan(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(PRESCAN_LIMIT)];
    Prescanner { bytes: head, pos: 0 }.run().map(coerce_declared)
}

fn is_space(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

#[derive(Debug, PartialEq, Eq)]
struct Attribute {
    name: Vec<u8>,
    value: Vec<u8>,
}

struct Prescanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Prescanner<'_> {
    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn rest(&self) -> &[u8] {
        self.bytes.get(self.pos..).unwrap_or_default()
    }

    fn starts_with_ignore_case(&self, prefix: &[u8]) -> bool {
        let rest = self.rest();
        rest.len() >= prefix.len() && rest[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.current().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// Move to the first `needle` at or after the current position. Leaves
    /// the scanner at the end of input when there is none.
    fn jump_to(&mut self, needle: &[u8]) {
        self.pos = match self.rest().find(needle) {
            Some(found) => self.pos + found,
            None => self.bytes.len(),
        };
    }

    fn run(mut self) -> Option<&'static Encoding> {
        while self.pos < self.bytes.len() {
            if self.starts_with_ignore_case(b"<!--") {
                // The closing `-->` may share its dashes with the opener.
                self.pos += 2;
                self.jump_to(b"-->");
                self.pos += 2;
            } else if self.starts_with_ignore_case(b"<meta")
                && self
                    .bytes
                    .get(self.pos + 5)
                    .is_some_and(|&b| is_space(b) || b == b'/')
            {
                self.pos += 5;
                if let Some(encoding) = self.meta_element() {
                    return Some(encoding);
                }
            } else if self.is_tag_open() {
                self.skip_tag();
            } else if self.starts_with_ignore_case(b"<!")
                || self.starts_with_ignore_case(b"</")
                || self.starts_with_ignore_case(b"<?")
            {
                self.jump_to(b">");
            }
            self.pos += 1;
        }
        None
    }

    fn is_tag_open(&self) -> bool {
        match self.rest() {
            [b'<', b'/', c, ..] | [b'<', c, ..] => c.is_ascii_alphabetic(),
            _ => false,
        }
    }

    fn skip_tag(&mut self) {
        self.skip_while(|b| !is_space(b) && b != b'>');
        while self.attribute().is_some() {}
    }

    fn meta_element(&mut self) -> Option<&'static Encoding> {
        let mut seen: Vec<Vec<u8>> = Vec::new();
        let mut got_pragma = false;
        let mut need_pragma: Option<bool> = None;
        let mut charset: Option<&'static Encoding> = None;

        while let Some(Attribute { name, value }) = self.attribute() {
            if seen.contains(&name) {
                continue;
            }
            match name.as_slice() {
                b"http-equiv" => {
                    if value.eq_ignore_ascii_case(b"content-type") {
                        got_pragma = true;
                    }
                }
                b"content" => {
                    if charset.is_none() {
                        if let Some(found) = charset_from_content(&value) {
                            charset = Some(found);
                            need_pragma = Some(true);
                        }
                    }
                }
                b"charset" => {
                    charset = lookup_bytes(&value);
                    need_pragma = Some(false);
                }
                _ => {}
            }
            seen.push(name);
        }

        match need_pragma {
            None => None,
            Some(true) if !got_pragma => None,
            Some(_) => charset,
        }
    }

    /// WHATWG "get an attribute". Returns `None` at `>` or end of input.
    fn attribute(&mut self) -> Option<Attribute> {
        self.skip_while(|b| is_space(b) || b == b'/');
        if self.current()? == b'>' {
            return None;
        }

        let mut name = Vec::new();
        let mut value = Vec::new();
        loop {
            match self.current()? {
                b'=' if !name.is_empty() => {
                    self.pos += 1;
                    return self.attribute_value(name, value);
                }
                b if is_space(b) => break,
                b'/' | b'>' => return Some(Attribute { name, value }),
                b => name.push(b.to_ascii_lowercase()),
            }
            self.pos += 1;
        }

        self.skip_while(is_space);
        if self.current()? != b'=' {
            return Some(Attribute { name, value });
        }
        self.pos += 1;
        self.attribute_value(name, value)
    }

    fn attribute_value(&mut self, name: Vec<u8>, mut value: Vec<u8>) -> Option<Attribute> {
        self.skip_while(is_space);
        match self.current()? {
            quote @ (b'"' | b'\'') => loop {
                self.pos += 1;
                match self.current()? {
                    b if b == quote => {
                        self.pos += 1;
                        return Some(Attribute { name, value });
                    }
                    b => value.push(b.to_ascii_lowercase()),
                }
            },
            b'>' => return Some(Attribute { name, value }),
            _ => {}
        }
        loop {
            match self.current()? {
                b if is_space(b) || b == b'>' => return Some(Attribute { name, value }),
                b => value.push(b.to_ascii_lowercase()),
            }
            self.pos += 1;
        }
    }
}

/// WHATWG "extract a character encoding from a meta element", applied to
/// the value of a `content` attribute.
fn charset_from_content(content: &[u8]) -> Option<&'static Encoding> {
    let mut pos = 0;
    loop {
        pos += content[pos..].find(b"charset")? + b"charset".len();
        while content.get(pos).copied().is_some_and(is_space) {
            pos += 1;
        }
        if content.get(pos) == Some(&b'=') {
            pos += 1;
            break;
        }
    }
    while content.get(pos).copied().is_some_and(is_space) {
        pos += 1;
    }

    let rest = &content[pos..];
    match *rest.first()? {
        quote @ (b'"' | b'\'') => {
            let end = rest[1..].find_byte(quote)?;
            lookup_bytes(&rest[1..=end])
        }
        _ => {
            let end = rest
                .iter()
                .position(|&b| is_space(b) || b == b';')
                .unwrap_or(rest.len());
            lookup_bytes(&rest[..end])
        }
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::{ISO_8859_2, KOI8_R, SHIFT_JIS, UTF_8, WINDOWS_1251, WINDOWS_1252};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("<meta charset=utf-8>", Some(UTF_8))]
    #[case("<META CHARSET=\"KOI8-R\">", Some(KOI8_R))]
    #[case("<meta charset='shift_jis'/>", Some(SHIFT_JIS))]
    #[case("<meta charset=ISO-8859-1>abc", Some(WINDOWS_1252))]
    #[case("<meta/charset=utf-8>", Some(UTF_8))]
    #[case("<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1251\">", Some(WINDOWS_1251))]
    #[case("<meta content=\"text/html; charset=iso-8859-2\" http-equiv=content-type>", Some(ISO_8859_2))]
    #[case("<meta content='text/html;charset=\"koi8-r\"' http-equiv='Content-Type'>", Some(KOI8_R))]
    #[case("<meta charset=utf-16le>", Some(UTF_8))]
    #[case("<meta charset=x-user-defined>", Some(WINDOWS_1252))]
    fn finds_declarations(#[case] input: &str, #[case] expected: Option<&'static Encoding>) {
        assert_eq!(prescan(input.as_bytes()), expected);
    }

    #[rstest]
    #[case("")]
    #[case("<html><body>no declaration</body></html>")]
    #[case("<meta content=\"text/html; charset=utf-8\">")]
    #[case("<meta http-equiv=content-type>")]
    #[case("<!-- <meta charset=utf-8> -->")]
    #[case("<metacharset=utf-8>")]
    #[case("<meta charset=bogus>")]
    #[case("<meta charset=\"utf-8")]
    fn ignores_non_declarations(#[case] input: &str) {
        assert_eq!(prescan(input.as_bytes()), None);
    }

    #[test]
    fn skips_attributes_of_other_tags() {
        let input = b"<div title='<meta charset=koi8-r>'><meta charset=utf-8>";
        assert_eq!(prescan(input), Some(UTF_8));
    }

    #[test]
    fn short_comment_closes_on_shared_dashes() {
        assert_eq!(prescan(b"<!--><meta charset=utf-8>"), Some(UTF_8));
    }

    #[test]
    fn continues_past_unresolvable_meta() {
        let input = b"<meta charset=nonsense><meta charset=koi8-r>";
        assert_eq!(prescan(input), Some(KOI8_R));
    }

    #[test]
    fn first_duplicate_attribute_wins() {
        let input = b"<meta charset=koi8-r charset=utf-8>";
        assert_eq!(prescan(input), Some(KOI8_R));
    }

    #[test]
    fn only_first_kilobyte_is_examined() {
        let mut input = vec![b' '; PRESCAN_LIMIT];
        input.extend_from_slice(b"<meta charset=utf-8>");
        assert_eq!(prescan(&input), None);
    }

    #[test]
    fn content_charset_requires_equals_sign() {
        assert_eq!(charset_from_content(b"charset utf-8"), None);
        assert_eq!(charset_from_content(b"charsetx; charset = utf-8 ;"), Some(UTF_8));
        assert_eq!(charset_from_content(b"charset='utf-8"), None);
    }
}
