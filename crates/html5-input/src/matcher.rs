//! Process-wide cache of compiled `chars_until` matchers.
//!
//! Tokenizers call `chars_until` with a handful of fixed delimiter sets, so
//! each `(set, opposite)` pair is compiled once and shared. Keys are
//! normalized (sorted, deduplicated) so `['<', '&']` and `['&', '<', '&']`
//! hit the same entry.

use std::{
    collections::HashMap,
    fmt::Write as _,
    sync::{LazyLock, PoisonError, RwLock},
};

use regex::Regex;

type Key = (String, bool);

static MATCHERS: LazyLock<RwLock<HashMap<Key, Regex>>> = LazyLock::new(Default::default);

/// Matcher for the longest prefix of characters outside `chars`, or inside
/// `chars` when `opposite` is set.
///
/// An empty set with `opposite` unset matches everything. Callers handle the
/// empty set with `opposite` set, which matches nothing.
pub(crate) fn matcher_for(chars: &[char], opposite: bool) -> Result<Regex, regex::Error> {
    let mut set = chars.to_vec();
    set.sort_unstable();
    set.dedup();
    let key: Key = (set.iter().collect(), opposite);

    if let Some(found) = MATCHERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(found.clone());
    }

    let compiled = Regex::new(&pattern(&set, opposite))?;
    log::trace!("compiled matcher for {:?} (opposite: {opposite})", key.0);
    MATCHERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key)
        .or_insert_with(|| compiled.clone());
    Ok(compiled)
}

fn pattern(set: &[char], opposite: bool) -> String {
    if set.is_empty() {
        return String::from(r"^(?s:.)+");
    }
    let mut pattern = String::from(if opposite { "^[" } else { "^[^" });
    for &c in set {
        // Infallible for `String`.
        let _ = write!(pattern, r"\x{{{:X}}}", u32::from(c));
    }
    pattern.push_str("]+");
    pattern
}
