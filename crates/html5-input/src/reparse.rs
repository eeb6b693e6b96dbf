use crate::{
    error::{Error, Result},
    options::StreamOptions,
    source::ByteSource,
    stream::CharacterStream,
};

/// Run `consume` over a character stream opened on `source`, restarting once
/// if the document asks for a different encoding.
///
/// `consume` reports an in-document declaration by forwarding the result of
/// [`CharacterStream::change_encoding`] with `?`. On the first
/// [`Error::Reparse`] the source is rewound to offset 0 and `consume` runs
/// again over a fresh stream using the corrected, certain decision. Since a
/// certain decision never changes, a second request can only come from
/// `consume` itself and is returned as is.
///
/// ```rust
/// use html5_input::{SeekableSource, StreamOptions, decode_with_reparse};
///
/// let mut source = SeekableSource::from_bytes(b"<meta charset=koi8-r>\xE1".to_vec());
/// let options = StreamOptions {
///     likely_encoding: Some("windows-1252".into()),
///     use_statistical_detector: false,
///     meta_prescan_bytes: 0,
///     ..Default::default()
/// };
///
/// let text = decode_with_reparse(&mut source, &options, |stream| {
///     let head = stream.chars_until(&['>'], false)?;
///     if head.contains("koi8-r") {
///         stream.change_encoding("koi8-r")?;
///     }
///     let mut text = head;
///     while let Some(c) = stream.char()? {
///         text.push(c);
///     }
///     Ok(text)
/// })?;
/// assert_eq!(text, "<meta charset=koi8-r>\u{0410}");
/// # Ok::<(), html5_input::Error>(())
/// ```
///
/// # Errors
///
/// Propagates reader failures and any error returned by `consume` other than
/// the first re-parse request.
pub fn decode_with_reparse<S, T, F>(
    source: &mut S,
    options: &StreamOptions,
    mut consume: F,
) -> Result<T>
where
    S: ByteSource + ?Sized,
    F: FnMut(&mut CharacterStream<'_, S>) -> Result<T>,
{
    let first = {
        let mut stream = CharacterStream::open(&mut *source, options)?;
        consume(&mut stream)
    };

    match first {
        Err(Error::Reparse(request)) => {
            log::info!("re-parsing as {}", request.to.encoding.name());
            source.rewind()?;
            let mut stream = CharacterStream::new(source, request.to, options);
            consume(&mut stream)
        }
        other => other,
    }
}
