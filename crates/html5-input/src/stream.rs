use std::io;

use encoding_rs::{Decoder, DecoderResult, UTF_8};

use crate::{
    error::{CharacterError, Reparse, Result},
    matcher::matcher_for,
    options::StreamOptions,
    registry::{coerce_declared, is_utf16, lookup},
    sniffer::{Confidence, EncodingDecision, determine_encoding},
    source::{ByteSource, SeekableSource},
};

/// A decoded, newline-normalized view of a byte source.
///
/// Bytes are pulled from the source in chunks of
/// [`StreamOptions::chunk_size`] and run through a stateful decoder, so
/// multi-byte sequences split across reads decode intact. Every chunk is
/// checked for noncharacters and `\r\n` / `\r` are folded to `\n` before the
/// consumer sees it.
///
/// The stream keeps the character before the read offset across refills, so
/// [`unget`](Self::unget) right after a chunk boundary stays exact.
pub struct CharacterStream<'s, S: ByteSource + ?Sized> {
    source: &'s mut S,
    decision: EncodingDecision,
    decoder: Decoder,
    /// Set once the decoder has been called with `last`.
    flushed: bool,
    chunk: String,
    offset: usize,
    prev_line: usize,
    prev_col: usize,
    /// A `\r` held back until the next read tells whether `\n` follows.
    pending: Option<char>,
    errors: Vec<CharacterError>,
    chunk_size: usize,
}

impl<'s> CharacterStream<'s, SeekableSource<io::Cursor<Vec<u8>>>> {
    /// Open a stream over text that was decoded before it reached the
    /// parser.
    ///
    /// No sniffing happens: the decision is certain UTF-8, so
    /// [`change_encoding`](Self::change_encoding) never asks for a re-parse.
    /// Newlines are still normalized and noncharacters still reported.
    ///
    /// ```rust
    /// use html5_input::{CharacterStream, Confidence, SeekableSource, StreamOptions};
    ///
    /// let mut source = SeekableSource::from_text("<meta charset=koi8-r>\r\nок");
    /// let mut stream = CharacterStream::from_text(&mut source, &StreamOptions::default());
    ///
    /// assert_eq!(stream.encoding_decision().confidence, Confidence::Certain);
    /// assert!(stream.change_encoding("koi8-r").is_ok());
    /// assert_eq!(stream.chars_until(&[], false)?, "<meta charset=koi8-r>\nок");
    /// # Ok::<(), html5_input::Error>(())
    /// ```
    #[must_use]
    pub fn from_text(
        source: &'s mut SeekableSource<io::Cursor<Vec<u8>>>,
        options: &StreamOptions,
    ) -> Self {
        Self::new(source, EncodingDecision::certain(UTF_8), options)
    }
}

impl<'s, S: ByteSource + ?Sized> CharacterStream<'s, S> {
    /// Sniff the encoding of `source` and open a stream over it.
    ///
    /// # Errors
    ///
    /// Fails when reading from `source` fails.
    pub fn open(source: &'s mut S, options: &StreamOptions) -> Result<Self> {
        let decision = determine_encoding(source, options)?;
        Ok(Self::new(source, decision, options))
    }

    /// Open a stream that decodes `source` from its current offset with an
    /// already-made decision.
    #[must_use]
    pub fn new(source: &'s mut S, decision: EncodingDecision, options: &StreamOptions) -> Self {
        Self {
            source,
            decision,
            decoder: decision.encoding.new_decoder_without_bom_handling(),
            flushed: false,
            chunk: String::new(),
            offset: 0,
            prev_line: 0,
            prev_col: 0,
            pending: None,
            errors: Vec::new(),
            chunk_size: options.chunk_size.max(1),
        }
    }

    /// The encoding in use and how confident the stream is in it.
    #[must_use]
    pub fn encoding_decision(&self) -> EncodingDecision {
        self.decision
    }

    /// Errors recorded so far, in input order.
    #[must_use]
    pub fn errors(&self) -> &[CharacterError] {
        &self.errors
    }

    /// `(line, column)` of the next character: 1-based line, 0-based column
    /// counted in code points.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        let (line, col) = self.position_at(self.offset);
        (line + 1, col)
    }

    fn position_at(&self, end: usize) -> (usize, usize) {
        let consumed = &self.chunk[..end];
        match consumed.rfind('\n') {
            Some(last) => {
                let newlines = consumed.bytes().filter(|&b| b == b'\n').count();
                (
                    self.prev_line + newlines,
                    consumed[last + 1..].chars().count(),
                )
            }
            None => (self.prev_line, self.prev_col + consumed.chars().count()),
        }
    }

    /// Pull and decode the next chunk of up to `size` bytes.
    ///
    /// Unconsumed text of the current chunk is kept. Returns `false` once
    /// the source is exhausted and nothing is left to decode.
    ///
    /// # Errors
    ///
    /// Fails when reading from the source fails.
    pub fn read_chunk(&mut self, size: usize) -> Result<bool> {
        let tail_start = self.chunk[..self.offset]
            .char_indices()
            .next_back()
            .map_or(self.offset, |(i, _)| i);
        (self.prev_line, self.prev_col) = self.position_at(tail_start);
        self.chunk.replace_range(..tail_start, "");
        self.offset -= tail_start;

        let mut text = String::new();
        let mut read = 0;
        loop {
            let raw = if self.flushed {
                Vec::new()
            } else {
                self.source.read_bytes(size.max(1))?
            };
            // A failed read leaves the held `\r` pending.
            if let Some(cr) = self.pending.take() {
                text.push(cr);
            }
            read += raw.len();
            let last = raw.is_empty();
            if !self.flushed {
                self.decode_into(&raw, last, &mut text);
                self.flushed = last;
            }
            if last {
                break;
            }
            if text.ends_with('\r') {
                text.pop();
                self.pending = Some('\r');
            }
            if !text.is_empty() {
                break;
            }
        }

        if text.is_empty() {
            return Ok(false);
        }

        let invalid = text.chars().filter(|&c| is_noncharacter(c)).count();
        self.errors
            .extend(std::iter::repeat_n(CharacterError::InvalidCodepoint, invalid));
        let text = normalize_newlines(text);
        log::trace!("read {read} bytes, decoded {} chars", text.chars().count());
        self.chunk.push_str(&text);
        Ok(true)
    }

    fn decode_into(&mut self, mut raw: &[u8], last: bool, text: &mut String) {
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(raw.len())
                .unwrap_or(raw.len().saturating_mul(3));
            text.reserve(needed.max(4));
            let (result, consumed) =
                self.decoder
                    .decode_to_string_without_replacement(raw, text, last);
            raw = &raw[consumed..];
            match result {
                DecoderResult::InputEmpty => return,
                DecoderResult::OutputFull => {}
                DecoderResult::Malformed(..) => {
                    text.push(char::REPLACEMENT_CHARACTER);
                    self.errors.push(CharacterError::MalformedInput);
                }
            }
        }
    }

    fn ensure_data(&mut self) -> Result<bool> {
        if self.offset < self.chunk.len() {
            return Ok(true);
        }
        self.read_chunk(self.chunk_size)
    }

    /// Next code point, or `None` at the end of input.
    ///
    /// # Errors
    ///
    /// Fails when reading from the source fails.
    pub fn char(&mut self) -> Result<Option<char>> {
        if !self.ensure_data()? {
            return Ok(None);
        }
        let c = self.chunk[self.offset..].chars().next();
        if let Some(c) = c {
            self.offset += c.len_utf8();
        }
        Ok(c)
    }

    /// Consume and return the longest run of characters not in `chars`, or,
    /// with `opposite`, the longest run of characters in `chars`.
    ///
    /// Runs continue across chunk boundaries. The stream is left on the
    /// first character that ended the run.
    ///
    /// ```rust
    /// use html5_input::{CharacterStream, EncodingDecision, SeekableSource, StreamOptions};
    ///
    /// let mut source = SeekableSource::from_bytes(b"  <p>text</p>".to_vec());
    /// let decision = EncodingDecision::certain(encoding_rs::UTF_8);
    /// let mut stream = CharacterStream::new(&mut source, decision, &StreamOptions::default());
    ///
    /// assert_eq!(stream.chars_until(&[' '], true)?, "  ");
    /// assert_eq!(stream.chars_until(&['>'], false)?, "<p");
    /// # Ok::<(), html5_input::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when reading from the source fails.
    pub fn chars_until(&mut self, chars: &[char], opposite: bool) -> Result<String> {
        if opposite && chars.is_empty() {
            return Ok(String::new());
        }
        let matcher = matcher_for(chars, opposite)?;
        let mut out = String::new();
        while self.ensure_data()? {
            let rest = &self.chunk[self.offset..];
            let end = matcher.find(rest).map_or(0, |m| m.end());
            out.push_str(&rest[..end]);
            self.offset += end;
            if self.offset < self.chunk.len() {
                break;
            }
        }
        Ok(out)
    }

    /// Push `c` back so the next [`char`](Self::char) returns it again.
    ///
    /// # Panics
    ///
    /// When the stream is inside a chunk and `c` is not the character that
    /// was just read.
    pub fn unget(&mut self, c: char) {
        if self.offset == 0 {
            // Counted again when re-read.
            self.chunk.insert(0, c);
            return;
        }
        let previous = self.chunk[..self.offset].chars().next_back();
        assert_eq!(
            previous,
            Some(c),
            "unget({c:?}) does not match the last character read"
        );
        self.offset -= c.len_utf8();
    }

    /// Handle an encoding declared by the document itself, typically a
    /// `<meta>` element seen by the tokenizer.
    ///
    /// Only a tentative decision can change. When `label` confirms the
    /// current encoding, or the current encoding is UTF-16, the decision
    /// becomes certain in place.
    ///
    /// # Errors
    ///
    /// Returns a [`Reparse`] signal when `label` names a different encoding.
    /// The stream must then be discarded and decoding restarted from the first
    /// byte with [`Reparse::to`]; see
    /// [`decode_with_reparse`](crate::decode_with_reparse).
    pub fn change_encoding(&mut self, label: &str) -> Result<(), Reparse> {
        if self.decision.is_certain() {
            log::debug!(
                "ignoring declared encoding {label:?}: {} is certain",
                self.decision.encoding.name()
            );
            return Ok(());
        }
        let Some(declared) = lookup(label) else {
            log::debug!("ignoring unknown declared encoding {label:?}");
            return Ok(());
        };
        if is_utf16(self.decision.encoding) {
            self.decision.confidence = Confidence::Certain;
            return Ok(());
        }

        let declared = coerce_declared(declared);
        if declared == self.decision.encoding {
            self.decision.confidence = Confidence::Certain;
            return Ok(());
        }

        let request = Reparse {
            from: self.decision,
            to: EncodingDecision::certain(declared),
        };
        log::info!("{request}; restarting from the first byte");
        Err(request)
    }
}

fn is_noncharacter(c: char) -> bool {
    let cp = u32::from(c);
    (0xFDD0..=0xFDEF).contains(&cp) || cp & 0xFFFE == 0xFFFE
}

fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}
