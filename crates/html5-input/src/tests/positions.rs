use encoding_rs::UTF_8;
use rstest::rstest;

use super::utils::chunked;
use crate::{CharacterStream, EncodingDecision, SeekableSource};

#[rstest]
#[case("", (1, 0))]
#[case("abc", (1, 3))]
#[case("a\nb", (2, 1))]
#[case("a\n\n", (3, 0))]
#[case("a\r\nbc", (2, 2))]
#[case("x\ry\r", (3, 0))]
#[case("é€𝄞", (1, 3))]
fn position_after_reading_everything(
    #[case] input: &str,
    #[case] expected: (usize, usize),
    #[values(1, 2, 3, 1024)] chunk_size: usize,
) {
    let mut source = SeekableSource::from_bytes(input.as_bytes());
    let mut stream =
        CharacterStream::new(&mut source, EncodingDecision::certain(UTF_8), &chunked(chunk_size));
    while stream.char().unwrap().is_some() {}
    assert_eq!(stream.position(), expected);
}

#[rstest]
fn position_tracks_every_character(#[values(1, 4, 1024)] chunk_size: usize) {
    let mut source = SeekableSource::from_bytes(b"ab\ncd\n\nef".to_vec());
    let mut stream =
        CharacterStream::new(&mut source, EncodingDecision::certain(UTF_8), &chunked(chunk_size));
    let mut seen = vec![stream.position()];
    while stream.char().unwrap().is_some() {
        seen.push(stream.position());
    }
    assert_eq!(
        seen,
        [(1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2), (3, 0), (4, 0), (4, 1), (4, 2)]
    );
}

#[rstest]
fn unget_restores_the_character_and_position(#[values(1, 2, 1024)] chunk_size: usize) {
    let mut source = SeekableSource::from_bytes("a\nβc".as_bytes());
    let mut stream =
        CharacterStream::new(&mut source, EncodingDecision::certain(UTF_8), &chunked(chunk_size));

    assert_eq!(stream.char().unwrap(), Some('a'));
    assert_eq!(stream.char().unwrap(), Some('\n'));
    assert_eq!(stream.char().unwrap(), Some('β'));
    let before = stream.position();
    stream.unget('β');
    assert_eq!(stream.position(), (2, 0));
    assert_eq!(stream.char().unwrap(), Some('β'));
    assert_eq!(stream.position(), before);

    stream.unget('β');
    stream.unget('\n');
    assert_eq!(stream.position(), (1, 1));
    assert_eq!(stream.char().unwrap(), Some('\n'));
    assert_eq!(stream.char().unwrap(), Some('β'));
    assert_eq!(stream.char().unwrap(), Some('c'));
    assert_eq!(stream.char().unwrap(), None);
}

#[test]
fn unget_at_end_of_input() {
    let mut source = SeekableSource::from_bytes(b"xy".to_vec());
    let mut stream =
        CharacterStream::new(&mut source, EncodingDecision::certain(UTF_8), &chunked(1));
    while stream.char().unwrap().is_some() {}
    stream.unget('y');
    assert_eq!(stream.char().unwrap(), Some('y'));
    assert_eq!(stream.char().unwrap(), None);
}

#[test]
fn unget_before_anything_was_read_prepends() {
    let mut source = SeekableSource::from_bytes(b"bc".to_vec());
    let mut stream =
        CharacterStream::new(&mut source, EncodingDecision::certain(UTF_8), &chunked(8));
    stream.unget('a');
    assert_eq!(stream.chars_until(&[], false).unwrap(), "abc");
}

#[test]
#[should_panic(expected = "does not match the last character read")]
fn unget_of_a_different_character_panics() {
    let mut source = SeekableSource::from_bytes(b"ab".to_vec());
    let mut stream =
        CharacterStream::new(&mut source, EncodingDecision::certain(UTF_8), &chunked(8));
    stream.char().unwrap();
    stream.unget('z');
}
