//! Byte sources the sniffer and the character stream read from.
//!
//! Everything downstream relies on being able to return to offset 0: the
//! sniffer rewinds after peeking at the document head, and the re-parse
//! protocol restarts decoding from the first byte. Readers that cannot seek
//! are wrapped in a [`BufferedSource`], which records what it has read and
//! replays it.

use std::io::{self, Read, Seek, SeekFrom};

/// A positioned reader over the raw bytes of one document.
///
/// Offsets are relative to where the source started, not to the underlying
/// file or socket.
pub trait ByteSource {
    /// Read up to `n` bytes. Fewer are returned only at the end of input; an
    /// empty vector means the source is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying reader.
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Current offset.
    fn tell(&self) -> usize;

    /// Move to `pos`. A following `read_bytes` returns the same bytes every
    /// time for the same `pos`.
    ///
    /// # Errors
    ///
    /// Fails when the underlying reader cannot reach `pos`.
    fn seek_to(&mut self, pos: usize) -> io::Result<()>;

    /// Return to offset 0.
    ///
    /// # Errors
    ///
    /// See [`ByteSource::seek_to`].
    fn rewind(&mut self) -> io::Result<()> {
        self.seek_to(0)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        (**self).read_bytes(n)
    }

    fn tell(&self) -> usize {
        (**self).tell()
    }

    fn seek_to(&mut self, pos: usize) -> io::Result<()> {
        (**self).seek_to(pos)
    }
}

fn read_up_to<R: Read + ?Sized>(reader: &mut R, n: usize, out: &mut Vec<u8>) -> io::Result<usize> {
    // `Take` + `read_to_end` keeps reading through short reads and retries
    // `Interrupted`.
    let limit = u64::try_from(n).unwrap_or(u64::MAX);
    reader.take(limit).read_to_end(out)
}

/// A source over a reader that supports seeking.
#[derive(Debug)]
pub struct SeekableSource<R> {
    inner: R,
    origin: u64,
    pos: usize,
}

impl SeekableSource<io::Cursor<Vec<u8>>> {
    /// In-memory source over `bytes`.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: io::Cursor::new(bytes.into()),
            origin: 0,
            pos: 0,
        }
    }
}

impl SeekableSource<io::Cursor<Vec<u8>>> {
    /// In-memory source over text that is already decoded, stored as UTF-8.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into().into_bytes())
    }
}

impl<R: Read + Seek> SeekableSource<R> {
    /// Wrap `inner`, treating its current position as offset 0.
    ///
    /// # Errors
    ///
    /// Fails when the reader cannot report or restore its position.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let origin = inner.stream_position()?;
        inner.seek(SeekFrom::Start(origin))?;
        Ok(Self {
            inner,
            origin,
            pos: 0,
        })
    }

    /// Give back the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for SeekableSource<R> {
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(64 * 1024));
        self.pos += read_up_to(&mut self.inner, n, &mut out)?;
        Ok(out)
    }

    fn tell(&self) -> usize {
        self.pos
    }

    fn seek_to(&mut self, pos: usize) -> io::Result<()> {
        let target = u64::try_from(pos)
            .ok()
            .and_then(|offset| self.origin.checked_add(offset))
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))?;
        self.inner.seek(SeekFrom::Start(target))?;
        self.pos = pos;
        Ok(())
    }
}

/// A record-and-replay source over a reader that cannot seek.
///
/// Every byte pulled from the reader is kept, so seeking to any offset that
/// has already been read (offset 0 in particular) replays the recorded bytes
/// before reading further from the reader.
#[derive(Debug)]
pub struct BufferedSource<R> {
    inner: R,
    recorded: Vec<u8>,
    pos: usize,
}

impl<R: Read> BufferedSource<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            recorded: Vec::new(),
            pos: 0,
        }
    }

    /// Number of bytes recorded so far.
    #[must_use]
    pub fn recorded_len(&self) -> usize {
        self.recorded.len()
    }

    fn record(&mut self, n: usize) -> io::Result<usize> {
        read_up_to(&mut self.inner, n, &mut self.recorded)
    }
}

impl<R: Read> ByteSource for BufferedSource<R> {
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let available = self.recorded.len() - self.pos;
        if available < n {
            self.record(n - available)?;
        }
        let end = self.recorded.len().min(self.pos.saturating_add(n));
        let out = self.recorded[self.pos..end].to_vec();
        self.pos = end;
        Ok(out)
    }

    fn tell(&self) -> usize {
        self.pos
    }

    fn seek_to(&mut self, pos: usize) -> io::Result<()> {
        if pos > self.recorded.len() {
            let missing = pos - self.recorded.len();
            if self.record(missing)? < missing {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "seek past the end of a non-seekable source",
                ));
            }
        }
        self.pos = pos;
        Ok(())
    }
}

/// A reader wrapped as seekable when possible and buffered otherwise.
#[derive(Debug)]
pub enum ReaderSource<R> {
    /// The reader seeks natively.
    Seekable(SeekableSource<R>),
    /// The reader refused to seek and is replayed from a record.
    Buffered(BufferedSource<R>),
}

impl<R: Read + Seek> ReaderSource<R> {
    /// Probe `reader` for working seeks. Types such as pipes opened as a
    /// `File` implement [`Seek`] but fail at runtime; those end up buffered.
    pub fn probe(mut reader: R) -> Self {
        match reader.stream_position() {
            Ok(origin) if reader.seek(SeekFrom::Start(origin)).is_ok() => {
                ReaderSource::Seekable(SeekableSource {
                    inner: reader,
                    origin,
                    pos: 0,
                })
            }
            _ => {
                log::debug!("reader cannot seek; recording bytes for replay");
                ReaderSource::Buffered(BufferedSource::new(reader))
            }
        }
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        match self {
            ReaderSource::Seekable(source) => source.read_bytes(n),
            ReaderSource::Buffered(source) => source.read_bytes(n),
        }
    }

    fn tell(&self) -> usize {
        match self {
            ReaderSource::Seekable(source) => source.tell(),
            ReaderSource::Buffered(source) => source.tell(),
        }
    }

    fn seek_to(&mut self, pos: usize) -> io::Result<()> {
        match self {
            ReaderSource::Seekable(source) => source.seek_to(pos),
            ReaderSource::Buffered(source) => source.seek_to(pos),
        }
    }
}
