//! Word sinks and output formatting.

use crate::assembly::Word;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by a word sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The consumer went away (e.g. broken pipe).
    #[error("output closed by consumer")]
    Closed,
    /// Any other write failure.
    #[error("failed to write word: {0}")]
    Io(#[from] io::Error),
}

/// Consumer of completed words.
pub trait WordSink {
    /// Accepts one completed word.
    fn emit(&mut self, word: Word) -> Result<(), SinkError>;
}

impl WordSink for Vec<Word> {
    fn emit(&mut self, word: Word) -> Result<(), SinkError> {
        self.push(word);
        Ok(())
    }
}

impl<S: WordSink + ?Sized> WordSink for &mut S {
    fn emit(&mut self, word: Word) -> Result<(), SinkError> {
        (**self).emit(word)
    }
}

/// How words are rendered on a byte stream.
///
/// Names parse case-insensitively, with `raw` accepted for `binary`, the
/// same way on the command line and in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputFormat {
    /// Raw bytes; 32-bit words little-endian.
    Binary,
    /// One decimal value per line.
    #[default]
    Text,
    /// One zero-padded hex value per line.
    Hex,
    /// Diagnostic view with hex or decimal value and binary digits.
    Debug,
}

/// Error for an unrecognised output format name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown output format '{0}' (expected binary, text, hex or debug)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "raw" => Ok(OutputFormat::Binary),
            "text" => Ok(OutputFormat::Text),
            "hex" => Ok(OutputFormat::Hex),
            "debug" => Ok(OutputFormat::Debug),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = UnknownFormat;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl OutputFormat {
    /// Renders a word into `out` according to this format.
    pub fn render(self, word: Word, out: &mut impl Write) -> io::Result<()> {
        match (self, word) {
            (OutputFormat::Binary, word) => out.write_all(&word.to_le_bytes()),
            (OutputFormat::Text, word) => writeln!(out, "{}", word.value()),
            (OutputFormat::Hex, Word::Byte(v)) => writeln!(out, "{v:02x}"),
            (OutputFormat::Hex, Word::Word32(v)) => writeln!(out, "{v:08x}"),
            (OutputFormat::Debug, Word::Byte(v)) => writeln!(out, "1 {v:02x}\t{v:08b}"),
            (OutputFormat::Debug, Word::Word32(v)) => writeln!(out, "1 {v}\t{v:032b}"),
        }
    }
}

/// Sink that writes formatted words to any `io::Write`.
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
    written: u64,
}

impl<W: Write> WriterSink<W> {
    /// Wraps `writer`, rendering every word in `format`.
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    /// Words written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> WordSink for WriterSink<W> {
    fn emit(&mut self, word: Word) -> Result<(), SinkError> {
        let result = self
            .format
            .render(word, &mut self.writer)
            .and_then(|()| self.writer.flush());

        match result {
            Ok(()) => {
                self.written += 1;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(SinkError::Closed),
            Err(e) => Err(SinkError::Io(e)),
        }
    }
}

impl<W: Write> std::fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSink")
            .field("format", &self.format)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: OutputFormat, words: &[Word]) -> Vec<u8> {
        let mut sink = WriterSink::new(Vec::new(), format);
        for &w in words {
            sink.emit(w).unwrap();
        }
        assert_eq!(sink.written(), words.len() as u64);
        sink.into_inner()
    }

    #[test]
    fn test_text_format() {
        let out = render(OutputFormat::Text, &[Word::Byte(85), Word::Word32(4_000_000_000)]);
        assert_eq!(String::from_utf8(out).unwrap(), "85\n4000000000\n");
    }

    #[test]
    fn test_hex_format() {
        let out = render(OutputFormat::Hex, &[Word::Byte(0x0a), Word::Word32(0xbeef)]);
        assert_eq!(String::from_utf8(out).unwrap(), "0a\n0000beef\n");
    }

    #[test]
    fn test_binary_format() {
        let out = render(OutputFormat::Binary, &[Word::Byte(0xff), Word::Word32(1)]);
        assert_eq!(out, vec![0xff, 1, 0, 0, 0]);
    }

    #[test]
    fn test_debug_format() {
        let out = render(OutputFormat::Debug, &[Word::Byte(0x55)]);
        assert_eq!(String::from_utf8(out).unwrap(), "1 55\t01010101\n");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("HEX".parse::<OutputFormat>(), Ok(OutputFormat::Hex));
        assert_eq!("raw".parse::<OutputFormat>(), Ok(OutputFormat::Binary));
        assert!("morse".parse::<OutputFormat>().is_err());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_broken_pipe_is_closed() {
        let mut sink = WriterSink::new(ClosedPipe, OutputFormat::Text);
        assert!(matches!(sink.emit(Word::Byte(1)), Err(SinkError::Closed)));
    }

    #[test]
    fn test_vec_sink() {
        let mut words: Vec<Word> = Vec::new();
        words.emit(Word::Byte(3)).unwrap();
        assert_eq!(words, vec![Word::Byte(3)]);
    }
}
