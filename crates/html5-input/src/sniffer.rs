//! The encoding sniffing cascade.
//!
//! Detection is an ordered table of detector functions. Each one either
//! produces an [`EncodingDecision`] or passes, and the first decision wins;
//! later detectors are never consulted, so two tentative guesses are never
//! reconciled. The last entry always decides, which makes
//! [`determine_encoding`] total.

use std::io;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::{
    options::StreamOptions,
    prescan::prescan,
    registry::{is_utf16, lookup_hint},
    source::ByteSource,
};

/// How settled an encoding decision is.
///
/// See <https://html.spec.whatwg.org/#concept-encoding-confidence>.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    /// A guess that an in-document declaration may still overturn.
    Tentative,
    /// Final for the lifetime of the document.
    Certain,
}

/// An encoding together with how confident the decision is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingDecision {
    /// The encoding used to decode the byte stream.
    pub encoding: &'static Encoding,
    /// Whether in-document declarations may still change `encoding`.
    pub confidence: Confidence,
}

impl EncodingDecision {
    /// A decision that can no longer change.
    #[must_use]
    pub fn certain(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            confidence: Confidence::Certain,
        }
    }

    /// A decision that an in-document declaration may overturn.
    #[must_use]
    pub fn tentative(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            confidence: Confidence::Tentative,
        }
    }

    /// Whether the decision is [`Confidence::Certain`].
    #[must_use]
    pub fn is_certain(&self) -> bool {
        self.confidence == Confidence::Certain
    }
}

type Detector<S> = fn(&mut S, &StreamOptions) -> io::Result<Option<EncodingDecision>>;

/// Pick the encoding of the document behind `source`.
///
/// On return the source is positioned at the first byte to decode: just past
/// a byte order mark if one was found, at offset 0 otherwise.
///
/// # Errors
///
/// Only failures of the underlying reader are reported; unresolvable labels
/// make the cascade move on.
pub fn determine_encoding<S: ByteSource + ?Sized>(
    source: &mut S,
    options: &StreamOptions,
) -> io::Result<EncodingDecision> {
    let cascade: [(&str, Detector<S>); 9] = [
        ("byte order mark", detect_bom),
        ("override", detect_override),
        ("transport", detect_transport),
        ("meta prescan", detect_meta),
        ("same-origin parent", detect_parent),
        ("likely", detect_likely),
        ("statistical detector", detect_statistically),
        ("default", detect_default),
        ("fallback", fallback),
    ];

    for (step, detector) in cascade {
        if let Some(decision) = detector(source, options)? {
            log::debug!(
                "{step} decided {} ({:?})",
                decision.encoding.name(),
                decision.confidence
            );
            return Ok(decision);
        }
    }
    Ok(EncodingDecision::tentative(WINDOWS_1252))
}

enum Bom {
    Known(&'static Encoding),
    Utf32,
}

/// Longest-first match over the first four bytes: UTF-8, then UTF-32 (whose
/// little-endian mark starts with the UTF-16LE one), then UTF-16.
fn sniff_bom(head: &[u8]) -> Option<(usize, Bom)> {
    if head.starts_with(b"\xEF\xBB\xBF") {
        Some((3, Bom::Known(UTF_8)))
    } else if head.starts_with(b"\xFF\xFE\x00\x00") || head.starts_with(b"\x00\x00\xFE\xFF") {
        Some((4, Bom::Utf32))
    } else if head.starts_with(b"\xFF\xFE") {
        Some((2, Bom::Known(UTF_16LE)))
    } else if head.starts_with(b"\xFE\xFF") {
        Some((2, Bom::Known(UTF_16BE)))
    } else {
        None
    }
}

fn detect_bom<S: ByteSource + ?Sized>(
    source: &mut S,
    _: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    let head = source.read_bytes(4)?;
    match sniff_bom(&head) {
        Some((len, Bom::Known(encoding))) => {
            source.seek_to(len)?;
            Ok(Some(EncodingDecision::certain(encoding)))
        }
        Some((_, Bom::Utf32)) => {
            log::debug!("byte order mark: UTF-32 is not a supported encoding");
            source.rewind()?;
            Ok(None)
        }
        None => {
            source.rewind()?;
            Ok(None)
        }
    }
}

fn detect_override<S: ByteSource + ?Sized>(
    _: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    Ok(lookup_hint("override", options.override_encoding.as_deref()).map(EncodingDecision::certain))
}

fn detect_transport<S: ByteSource + ?Sized>(
    _: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    Ok(lookup_hint("transport", options.transport_encoding.as_deref()).map(EncodingDecision::certain))
}

fn detect_meta<S: ByteSource + ?Sized>(
    source: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    let head = source.read_bytes(options.meta_prescan_bytes)?;
    source.rewind()?;
    Ok(prescan(&head).map(EncodingDecision::tentative))
}

fn detect_parent<S: ByteSource + ?Sized>(
    _: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    let parent = lookup_hint(
        "same-origin parent",
        options.same_origin_parent_encoding.as_deref(),
    );
    Ok(parent
        .filter(|&encoding| !is_utf16(encoding))
        .map(EncodingDecision::tentative))
}

fn detect_likely<S: ByteSource + ?Sized>(
    _: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    Ok(lookup_hint("likely", options.likely_encoding.as_deref()).map(EncodingDecision::tentative))
}

#[cfg(feature = "chardetng")]
fn detect_statistically<S: ByteSource + ?Sized>(
    source: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    if !options.use_statistical_detector {
        return Ok(None);
    }

    let sample_size = options.detector_sample_bytes.max(1);
    let mut detector = chardetng::EncodingDetector::new();
    let mut sampled = 0;
    let mut non_ascii = false;
    // Reaching the byte cap is not the end of the stream; only exhaustion is.
    while sampled < options.detector_max_bytes {
        let sample = source.read_bytes(sample_size.min(options.detector_max_bytes - sampled))?;
        let last = sample.is_empty();
        non_ascii = detector.feed(&sample, last);
        if last {
            break;
        }
        sampled += sample.len();
    }
    source.rewind()?;

    // All-ASCII input carries no evidence; let the configured default decide.
    if !non_ascii {
        return Ok(None);
    }
    Ok(Some(EncodingDecision::tentative(detector.guess(None, true))))
}

#[cfg(not(feature = "chardetng"))]
fn detect_statistically<S: ByteSource + ?Sized>(
    _: &mut S,
    _: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    Ok(None)
}

fn detect_default<S: ByteSource + ?Sized>(
    _: &mut S,
    options: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    Ok(lookup_hint("default", Some(options.default_encoding.as_str())).map(EncodingDecision::tentative))
}

fn fallback<S: ByteSource + ?Sized>(
    _: &mut S,
    _: &StreamOptions,
) -> io::Result<Option<EncodingDecision>> {
    Ok(Some(EncodingDecision::tentative(WINDOWS_1252)))
}
