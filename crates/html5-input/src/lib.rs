//! Byte-to-character front end for HTML5 parsers.
//!
//! The crate turns a byte source of unknown encoding into a lazily decoded,
//! newline-normalized stream of `char`s:
//!
//! - [`determine_encoding`] runs the WHATWG-ordered sniffing cascade (BOM,
//!   override, transport, `<meta>` prescan, parent, likely, statistical
//!   detector, configured default, windows-1252) and yields an
//!   [`EncodingDecision`].
//! - [`CharacterStream`] pulls fixed-size chunks from a [`ByteSource`],
//!   decodes them, tracks line/column positions and collects
//!   [`CharacterError`]s. Text that is already decoded goes through
//!   [`CharacterStream::from_text`] and skips sniffing.
//! - When a tentative decision is contradicted by the document itself,
//!   [`CharacterStream::change_encoding`] returns a [`Reparse`] signal and
//!   [`decode_with_reparse`] restarts decoding from the first byte.
//!
//! ```rust
//! use html5_input::{CharacterStream, Confidence, SeekableSource, StreamOptions};
//!
//! let mut source = SeekableSource::from_bytes(b"\xEF\xBB\xBFhi\r\nthere".to_vec());
//! let options = StreamOptions::default();
//! let mut stream = CharacterStream::open(&mut source, &options)?;
//!
//! assert_eq!(stream.encoding_decision().confidence, Confidence::Certain);
//! assert_eq!(stream.chars_until(&['\n'], false)?, "hi");
//! assert_eq!(stream.char()?, Some('\n'));
//! assert_eq!(stream.position(), (2, 0));
//! # Ok::<(), html5_input::Error>(())
//! ```

mod error;
mod matcher;
mod options;
mod prescan;
mod registry;
mod reparse;
mod sniffer;
mod source;
mod stream;

#[cfg(test)]
mod tests;

pub use encoding_rs::Encoding;
pub use error::{CharacterError, Error, Reparse, Result};
pub use options::StreamOptions;
pub use prescan::prescan;
pub use registry::{coerce_declared, is_utf16, lookup, lookup_bytes};
pub use reparse::decode_with_reparse;
pub use sniffer::{Confidence, EncodingDecision, determine_encoding};
pub use source::{BufferedSource, ByteSource, ReaderSource, SeekableSource};
pub use stream::CharacterStream;
