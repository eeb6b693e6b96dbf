use thiserror::Error;

use crate::sniffer::EncodingDecision;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failures surfaced by the character stream and the sniffer.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller's byte reader failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The document declared an encoding that contradicts a tentative
    /// decision; decoding must restart from the first byte.
    #[error(transparent)]
    Reparse(#[from] Reparse),
    /// A `chars_until` matcher could not be compiled.
    #[error("matcher error: {0}")]
    Matcher(#[from] regex::Error),
}

/// Control-flow signal requesting a restart with a corrected encoding.
///
/// Raised by [`CharacterStream::change_encoding`](crate::CharacterStream::change_encoding)
/// only while the current decision is tentative. The owner of the byte source
/// rewinds it to offset 0 and builds a new stream from [`Reparse::to`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("encoding changed from {} to {}", .from.encoding.name(), .to.encoding.name())]
pub struct Reparse {
    /// The tentative decision that was contradicted.
    pub from: EncodingDecision,
    /// The corrected decision; always certain.
    pub to: EncodingDecision,
}

/// Kind of a decode error recorded in the stream's error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterError {
    /// A noncharacter code point (`U+FDD0..=U+FDEF` or a plane-ending
    /// `U+xFFFE`/`U+xFFFF`) occurred in the input.
    InvalidCodepoint,
    /// The decoder met a byte sequence it cannot map, such as a lone UTF-16
    /// surrogate; it was replaced with U+FFFD.
    MalformedInput,
}
