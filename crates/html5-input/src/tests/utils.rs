use std::{
    collections::VecDeque,
    io::{self, Read},
};

use crate::{
    ByteSource, CharacterError, CharacterStream, EncodingDecision, SeekableSource, StreamOptions,
};

/// A reader that hands out at most `max_per_read` bytes per call and cannot
/// seek, like a slow pipe.
pub struct Trickle {
    bytes: Vec<u8>,
    pos: usize,
    max_per_read: usize,
}

impl Trickle {
    pub fn new(bytes: &[u8], max_per_read: usize) -> Self {
        Self {
            bytes: bytes.to_vec(),
            pos: 0,
            max_per_read: max_per_read.max(1),
        }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf
            .len()
            .min(self.max_per_read)
            .min(self.bytes.len() - self.pos);
        buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// A source that replays a fixed script of reads, failures included, and
/// then reports the end of input.
pub struct Scripted {
    reads: VecDeque<io::Result<Vec<u8>>>,
    pos: usize,
}

impl Scripted {
    pub fn new(reads: impl IntoIterator<Item = io::Result<Vec<u8>>>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            pos: 0,
        }
    }
}

impl ByteSource for Scripted {
    fn read_bytes(&mut self, _: usize) -> io::Result<Vec<u8>> {
        let bytes = self.reads.pop_front().unwrap_or_else(|| Ok(Vec::new()))?;
        self.pos += bytes.len();
        Ok(bytes)
    }

    fn tell(&self) -> usize {
        self.pos
    }

    fn seek_to(&mut self, _: usize) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

/// Options with every hint unset and the statistical detector off, so tests
/// only see the steps they configure.
pub fn quiet_options() -> StreamOptions {
    StreamOptions {
        use_statistical_detector: false,
        ..Default::default()
    }
}

pub fn chunked(chunk_size: usize) -> StreamOptions {
    StreamOptions {
        chunk_size,
        ..quiet_options()
    }
}

/// Drain a stream over `bytes` with `decision`, one `char` at a time.
pub fn decode_all(
    bytes: &[u8],
    decision: EncodingDecision,
    chunk_size: usize,
) -> (String, Vec<CharacterError>) {
    let mut source = SeekableSource::from_bytes(bytes);
    let mut stream = CharacterStream::new(&mut source, decision, &chunked(chunk_size));
    let mut text = String::new();
    while let Some(c) = stream.char().unwrap() {
        text.push(c);
    }
    (text, stream.errors().to_vec())
}

pub fn normalized(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
