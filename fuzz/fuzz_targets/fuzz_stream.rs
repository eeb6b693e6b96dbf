#![no_main]
use arbitrary::Arbitrary;
use html5_input::{
    CharacterStream, ReaderSource, Result, SeekableSource, StreamOptions, decode_with_reparse,
};
use libfuzzer_sys::fuzz_target;

static LABELS: &[&str] = &[
    "utf-8",
    "utf-16le",
    "utf-16be",
    "windows-1252",
    "koi8-r",
    "shift_jis",
    "euc-jp",
    "gb18030",
    "big5",
    "iso-2022-jp",
    "x-user-defined",
    "not-an-encoding",
];

#[derive(Debug, Arbitrary)]
enum Op {
    Char,
    Unget,
    CharsUntil { set: Vec<char>, opposite: bool },
    Declare(u8),
}

#[derive(Debug, Arbitrary)]
struct Input {
    chunk_size: u8,
    transport: Option<u8>,
    likely: Option<u8>,
    statistical: bool,
    ops: Vec<Op>,
    bytes: Vec<u8>,
}

fn label(index: u8) -> String {
    LABELS[usize::from(index) % LABELS.len()].to_owned()
}

fn drive<S: html5_input::ByteSource + ?Sized>(
    stream: &mut CharacterStream<'_, S>,
    ops: &[Op],
) -> Result<String> {
    let mut text = String::new();
    let mut last = None;
    for op in ops {
        match op {
            Op::Char => {
                last = stream.char()?;
                text.extend(last);
            }
            Op::Unget => {
                if let Some(c) = last.take() {
                    stream.unget(c);
                    text.pop();
                }
            }
            Op::CharsUntil { set, opposite } => {
                let span = stream.chars_until(set, *opposite)?;
                last = span.chars().next_back();
                text.push_str(&span);
            }
            Op::Declare(index) => {
                stream.change_encoding(&label(*index))?;
                last = None;
            }
        }
    }
    while let Some(c) = stream.char()? {
        text.push(c);
    }
    assert!(!text.contains('\r'), "carriage return leaked: {text:?}");

    let (line, _) = stream.position();
    assert_eq!(line, text.matches('\n').count() + 1);
    Ok(text)
}

fn run(input: &Input) {
    let options = StreamOptions {
        chunk_size: usize::from(input.chunk_size) + 1,
        transport_encoding: input.transport.map(label),
        likely_encoding: input.likely.map(label),
        use_statistical_detector: input.statistical,
        ..Default::default()
    };

    let mut seekable = SeekableSource::from_bytes(input.bytes.as_slice());
    let first = decode_with_reparse(&mut seekable, &options, |stream| drive(stream, &input.ops));

    let mut probed = ReaderSource::probe(std::io::Cursor::new(input.bytes.as_slice()));
    let second = decode_with_reparse(&mut probed, &options, |stream| drive(stream, &input.ops));

    assert_eq!(first.ok(), second.ok());
}

fuzz_target!(|input: Input| run(&input));
