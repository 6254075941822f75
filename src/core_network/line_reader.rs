//! CRLF line framing for the control connection.
//!
//! Commands arrive as a raw byte stream. `LineReader` reads it in small chunks,
//! decodes the bytes with the session's current `TextEncoding` and hands back one
//! line per call, without the terminating CRLF. Bytes read past a terminator are
//! kept for the next call.

use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read chunk size used when none is configured.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64;

/// Longest command line accepted, terminator included.
pub const MAX_LINE_LENGTH: usize = 8192;

#[derive(Error, Debug)]
pub enum LineError {
    #[error("stream closed before end of line")]
    UnexpectedEof,

    #[error("line longer than {0} bytes")]
    TooLong(usize),

    #[error("failed to read from stream: {0}")]
    Io(#[from] io::Error),
}

/// Text encoding negotiated for a control connection (`OPTS UTF8 ON|OFF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
}

impl TextEncoding {
    /// Returns a fresh incremental decoder for this encoding.
    pub fn decoder(self) -> TextDecoder {
        TextDecoder::new(self)
    }

    /// Encodes text for the wire. Characters outside ASCII become `?` in ASCII mode.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

/// Stateful decoder that carries incomplete multi-byte sequences between calls.
#[derive(Debug)]
pub struct TextDecoder {
    encoding: TextEncoding,
    partial: Vec<u8>,
}

impl TextDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            partial: Vec::with_capacity(4),
        }
    }

    /// Decodes `bytes` into `out`.
    ///
    /// With `flush` unset, a code point cut at the end of `bytes` is held back
    /// until the next call. With `flush` set, leftovers are emitted as U+FFFD.
    pub fn decode(&mut self, bytes: &[u8], flush: bool, out: &mut String) {
        match self.encoding {
            TextEncoding::Ascii => out.extend(
                bytes
                    .iter()
                    .map(|&b| if b.is_ascii() { b as char } else { '?' }),
            ),
            TextEncoding::Utf8 => self.decode_utf8(bytes, flush, out),
        }
    }

    fn decode_utf8(&mut self, bytes: &[u8], flush: bool, out: &mut String) {
        self.partial.extend_from_slice(bytes);
        let mut consumed = 0;
        loop {
            match std::str::from_utf8(&self.partial[consumed..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.partial.len();
                    break;
                }
                Err(e) => {
                    let valid_end = consumed + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.partial[consumed..valid_end]));
                    match e.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_end + invalid;
                        }
                        None => {
                            consumed = valid_end;
                            if flush {
                                out.push(char::REPLACEMENT_CHARACTER);
                                consumed = self.partial.len();
                            }
                            break;
                        }
                    }
                }
            }
        }
        self.partial.drain(..consumed);
    }
}

/// Splits a byte stream into CRLF-terminated lines.
#[derive(Debug)]
pub struct LineReader {
    chunk: Vec<u8>,
    buffered: Vec<u8>,
    max_line_length: usize,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_READ_BUFFER_SIZE)
    }

    pub fn with_buffer_size(size: usize) -> Self {
        Self {
            chunk: vec![0; size.max(1)],
            buffered: Vec::new(),
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Reads the next line from `source`, decoded with `encoding`.
    ///
    /// Only CRLF ends a line; a bare LF is kept as part of the line. Fails with
    /// `LineError::UnexpectedEof` when the source closes before a terminator, and
    /// with `LineError::TooLong` once a line outgrows the maximum line length.
    pub async fn read_line<R>(
        &mut self,
        source: &mut R,
        encoding: TextEncoding,
    ) -> Result<String, LineError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut decoder = encoding.decoder();
        let mut line = String::new();
        let mut last_byte_is_cr = false;
        let mut line_length = 0;

        loop {
            if self.buffered.is_empty() {
                let count = source.read(&mut self.chunk).await?;
                if count == 0 {
                    return Err(LineError::UnexpectedEof);
                }
                self.buffered.extend_from_slice(&self.chunk[..count]);
            }

            let terminator = find_terminator(&self.buffered, last_byte_is_cr);
            line_length += terminator.unwrap_or(self.buffered.len());
            if line_length > self.max_line_length {
                self.buffered.clear();
                return Err(LineError::TooLong(self.max_line_length));
            }

            match terminator {
                Some(end) => {
                    decoder.decode(&self.buffered[..end], true, &mut line);
                    self.buffered.drain(..end);
                    if line.ends_with("\r\n") {
                        line.truncate(line.len() - 2);
                    }
                    return Ok(line);
                }
                None => {
                    last_byte_is_cr = self.buffered.last() == Some(&b'\r');
                    decoder.decode(&self.buffered, false, &mut line);
                    self.buffered.clear();
                }
            }
        }
    }
}

/// Returns the index just past the first CRLF, honouring a CR left at the end
/// of the previous chunk.
fn find_terminator(bytes: &[u8], mut last_byte_is_cr: bool) -> Option<usize> {
    for (i, &byte) in bytes.iter().enumerate() {
        if last_byte_is_cr && byte == b'\n' {
            return Some(i + 1);
        }
        last_byte_is_cr = byte == b'\r';
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    async fn read_all_lines(input: &[u8], buffer_size: usize, encoding: TextEncoding) -> Vec<String> {
        let mut source = input;
        let mut reader = LineReader::with_buffer_size(buffer_size);
        let mut lines = Vec::new();
        while let Ok(line) = reader.read_line(&mut source, encoding).await {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_lines_survive_any_chunk_size() {
        let input = b"USER anonymous\r\nPASS guest@example.com\r\nPWD\r\n";
        for size in 1..=24 {
            let lines = read_all_lines(input, size, TextEncoding::Utf8).await;
            assert_eq!(lines, vec!["USER anonymous", "PASS guest@example.com", "PWD"], "buffer size {}", size);
        }
    }

    #[tokio::test]
    async fn test_bare_lf_does_not_end_line() {
        let lines = read_all_lines(b"RNFR a\nb\r\n", 4, TextEncoding::Utf8).await;
        assert_eq!(lines, vec!["RNFR a\nb"]);
    }

    #[tokio::test]
    async fn test_cr_and_lf_split_across_reads() {
        let lines = read_all_lines(b"NOOP\r\nSYST\r\n", 5, TextEncoding::Utf8).await;
        assert_eq!(lines, vec!["NOOP", "SYST"]);
    }

    #[tokio::test]
    async fn test_multibyte_code_points_split_across_reads() {
        let input = "CWD /文件夹/données\r\n".as_bytes();
        for size in 1..=7 {
            let lines = read_all_lines(input, size, TextEncoding::Utf8).await;
            assert_eq!(lines, vec!["CWD /文件夹/données"], "buffer size {}", size);
        }
    }

    #[tokio::test]
    async fn test_ascii_replaces_high_bytes() {
        let lines = read_all_lines("CWD é\r\n".as_bytes(), 3, TextEncoding::Ascii).await;
        assert_eq!(lines, vec!["CWD ??"]);
    }

    #[tokio::test]
    async fn test_eof_before_terminator() {
        let mut source: &[u8] = b"QUIT";
        let mut reader = LineReader::with_buffer_size(16);
        let result = reader.read_line(&mut source, TextEncoding::Utf8).await;
        assert!(matches!(result, Err(LineError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn test_does_not_consume_following_line() {
        let mut source: &[u8] = b"USER a\r\nPASS b\r\n";
        let mut reader = LineReader::with_buffer_size(64);
        assert_eq!(reader.read_line(&mut source, TextEncoding::Utf8).await.unwrap(), "USER a");
        assert_eq!(reader.read_line(&mut source, TextEncoding::Ascii).await.unwrap(), "PASS b");
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let mut source: &[u8] = b"NOOP\r\nSTOR aaaaaaaaaaaaaaaa\r\n";
        let mut reader = LineReader::with_buffer_size(4).with_max_line_length(8);
        assert_eq!(reader.read_line(&mut source, TextEncoding::Utf8).await.unwrap(), "NOOP");
        let result = reader.read_line(&mut source, TextEncoding::Utf8).await;
        assert!(matches!(result, Err(LineError::TooLong(8))));
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let mut source: &[u8] = b"SYST\r\n";
        let mut reader = LineReader::with_buffer_size(64).with_max_line_length(6);
        assert_eq!(reader.read_line(&mut source, TextEncoding::Utf8).await.unwrap(), "SYST");
    }

    #[test]
    fn test_decoder_flushes_truncated_sequence() {
        let mut decoder = TextEncoding::Utf8.decoder();
        let mut out = String::new();
        decoder.decode(&[b'a', 0xE6], false, &mut out);
        assert_eq!(out, "a");
        decoder.decode(&[], true, &mut out);
        assert_eq!(out, "a\u{FFFD}");
    }

    #[test]
    fn test_ascii_encoding_masks_non_ascii() {
        assert_eq!(TextEncoding::Ascii.encode("257 \"/é\""), b"257 \"/?\"".to_vec());
        assert_eq!(TextEncoding::Utf8.encode("é"), "é".as_bytes().to_vec());
    }

    proptest! {
        #[test]
        fn prop_chunking_is_invisible(text in "[^\r\n]{0,80}", size in 1usize..40) {
            let input = format!("{}\r\n", text);
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let one_byte = runtime.block_on(read_all_lines(input.as_bytes(), 1, TextEncoding::Utf8));
            let chunked = runtime.block_on(read_all_lines(input.as_bytes(), size, TextEncoding::Utf8));
            prop_assert_eq!(&one_byte, &vec![text.clone()]);
            prop_assert_eq!(one_byte, chunked);
        }
    }
}
