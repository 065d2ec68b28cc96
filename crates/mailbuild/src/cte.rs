//! Content-Transfer-Encoding engine: turns raw body bytes into one of the
//! three encodings this crate supports, both as a one-shot function over
//! an in-memory buffer and as a streaming `Read` adapter for bodies
//! sourced from a file or other lazily-produced byte stream.

use std::io::Read;

use crate::error::MailBuildError;
use crate::safe_bytes::SafeByteBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    Base64,
    QuotedPrintable,
}

impl ContentTransferEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }
}

/// Number of base64 input bytes per output line: 57 bytes -> 76 base64
/// characters (19 groups of 4), the largest multiple of 3 bytes whose
/// base64 expansion fits in a 76-column line.
const BASE64_LINE_INPUT_BYTES: usize = 57;
const QP_LINE_MAX: usize = 76;

/// Validate that `data` is already 7-bit clean; this encoding never
/// transforms the bytes, it only asserts they need no transformation. The
/// validated bytes are wrapped in a `SafeByteBuffer` on the way out, since
/// `7bit` output is by definition a sequence of `SevenBitByte`s.
pub fn encode_7bit(data: &[u8]) -> Result<(), MailBuildError> {
    if !is_7bit_line_safe(data) {
        return Err(MailBuildError::EightBitIn7Bit);
    }
    let _validated: SafeByteBuffer = SafeByteBuffer::from_bytes(data)?;
    Ok(())
}

/// True if `data` has no byte with the top bit set, no bare CR or LF
/// (only `CRLF` pairs), and no line longer than RFC 5322's 998-byte limit
/// — everything `Content-Transfer-Encoding: 7bit` requires of a body.
fn is_7bit_line_safe(data: &[u8]) -> bool {
    let mut col = 0usize;
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b if b >= 0x80 => return false,
            b'\r' => {
                if data.get(i + 1) != Some(&b'\n') {
                    return false;
                }
                col = 0;
                i += 2;
                continue;
            }
            b'\n' => return false,
            _ => {
                col += 1;
                if col > 998 {
                    return false;
                }
            }
        }
        i += 1;
    }
    true
}

/// Pick the transfer encoding a textual body should use once its charset
/// bytes are known: plain `7bit` when the encoded text is already clean
/// 7-bit ASCII-line data (e.g. US-ASCII or ISO-2022-JP, whose escape
/// sequences stay within the 7-bit range), falling back to
/// `quoted-printable` for anything with 8-bit bytes or over-long lines
/// (e.g. UTF-8 body text).
pub fn choose_text_cte(bytes: &[u8]) -> ContentTransferEncoding {
    if is_7bit_line_safe(bytes) {
        ContentTransferEncoding::SevenBit
    } else {
        ContentTransferEncoding::QuotedPrintable
    }
}

/// Base64-encode `data`, wrapping output lines at 76 characters with
/// `CRLF`, per RFC 2045 §6.8.
pub fn encode_base64(data: &[u8]) -> String {
    let mut out = String::new();
    for chunk in data.chunks(BASE64_LINE_INPUT_BYTES) {
        out.push_str(&data_encoding::BASE64.encode(chunk));
        out.push_str("\r\n");
    }
    out
}

/// Quoted-printable-encode `data`, soft-wrapping at 76 columns with a
/// trailing `=` before the line break, per RFC 2045 §6.7.
pub fn encode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut col = 0usize;
    let bytes: &[u8] = data;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let is_eol = b == b'\r' && bytes.get(i + 1) == Some(&b'\n');
        if is_eol {
            out.push(b'\r');
            out.push(b'\n');
            col = 0;
            i += 2;
            continue;
        }
        let literal = (b == b'\t' || (0x20..=0x7E).contains(&b)) && b != b'=';
        let at_line_end = i + 1 == bytes.len() || (bytes.get(i + 1) == Some(&b'\r'));
        let needs_escape = !literal || ((b == b' ' || b == b'\t') && at_line_end);

        if needs_escape {
            if col + 3 > QP_LINE_MAX {
                out.push(b'=');
                out.push(b'\r');
                out.push(b'\n');
                col = 0;
            }
            out.push(b'=');
            out.push(hex_digit(b >> 4));
            out.push(hex_digit(b & 0xf));
            col += 3;
        } else {
            if col + 1 > QP_LINE_MAX {
                out.push(b'=');
                out.push(b'\r');
                out.push(b'\n');
                col = 0;
            }
            out.push(b);
            col += 1;
        }
        i += 1;
    }
    out
}

fn hex_digit(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        _ => b'A' + (nibble - 10),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CteStreamState {
    Idle,
    Reading,
    Drained,
    Failed,
}

/// A `Read` adapter that applies a `ContentTransferEncoding` to bytes
/// pulled lazily from `inner`, so a large body never needs to be fully
/// materialized in memory just to be transfer-encoded.
pub struct CteStream<R> {
    inner: R,
    encoding: ContentTransferEncoding,
    state: CteStreamState,
    raw_buf: Vec<u8>,
    out_buf: Vec<u8>,
    out_pos: usize,
}

impl<R: Read> CteStream<R> {
    pub fn new(inner: R, encoding: ContentTransferEncoding) -> Self {
        Self {
            inner,
            encoding,
            state: CteStreamState::Idle,
            raw_buf: Vec::new(),
            out_buf: Vec::new(),
            out_pos: 0,
        }
    }

    pub fn state(&self) -> CteStreamState {
        self.state
    }

    fn fill(&mut self) -> std::io::Result<()> {
        debug_assert!(self.out_pos >= self.out_buf.len());
        self.out_buf.clear();
        self.out_pos = 0;

        let read_target = match self.encoding {
            ContentTransferEncoding::Base64 => BASE64_LINE_INPUT_BYTES,
            _ => 8192,
        };
        let mut chunk = vec![0u8; read_target];
        let mut total = 0;
        while total < read_target {
            match self.inner.read(&mut chunk[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.state = CteStreamState::Failed;
                    return Err(e);
                }
            }
        }
        self.raw_buf.clear();
        self.raw_buf.extend_from_slice(&chunk[..total]);

        if total == 0 {
            tracing::trace!(encoding = self.encoding.as_str(), "CteStream drained");
            self.state = CteStreamState::Drained;
            return Ok(());
        }

        match self.encoding {
            ContentTransferEncoding::SevenBit => {
                if self.raw_buf.iter().any(|&b| b >= 0x80) {
                    tracing::debug!("CteStream found 8-bit data in a 7bit-encoded body");
                    self.state = CteStreamState::Failed;
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        MailBuildError::EightBitIn7Bit,
                    ));
                }
                self.out_buf.extend_from_slice(&self.raw_buf);
            }
            ContentTransferEncoding::Base64 => {
                self.out_buf
                    .extend_from_slice(encode_base64(&self.raw_buf).as_bytes());
            }
            ContentTransferEncoding::QuotedPrintable => {
                self.out_buf.extend(encode_quoted_printable(&self.raw_buf));
            }
        }
        self.state = CteStreamState::Reading;
        Ok(())
    }
}

impl<R: Read> Read for CteStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            match self.state {
                CteStreamState::Failed => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "CteStream already failed",
                    ))
                }
                CteStreamState::Drained => return Ok(0),
                CteStreamState::Idle | CteStreamState::Reading => {
                    if self.out_pos < self.out_buf.len() {
                        let n = (buf.len()).min(self.out_buf.len() - self.out_pos);
                        buf[..n].copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + n]);
                        self.out_pos += n;
                        return Ok(n);
                    }
                    self.fill()?;
                    if self.state == CteStreamState::Drained {
                        return Ok(0);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sevenbit_rejects_highbit() {
        assert!(encode_7bit(b"hello").is_ok());
        assert!(encode_7bit(&[0x80]).is_err());
    }

    #[test]
    fn sevenbit_rejects_bare_lf() {
        assert!(encode_7bit(b"foo\nbar").is_err());
        assert!(encode_7bit(b"foo\r\nbar").is_ok());
    }

    #[test]
    fn choose_text_cte_prefers_sevenbit_for_clean_ascii() {
        k9::assert_equal!(choose_text_cte(b"hello\r\nworld"), ContentTransferEncoding::SevenBit);
    }

    #[test]
    fn choose_text_cte_falls_back_to_quoted_printable_for_8bit() {
        k9::assert_equal!(
            choose_text_cte("héllo".as_bytes()),
            ContentTransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn base64_wraps_at_76() {
        let data = vec![0u8; 200];
        let out = encode_base64(&data);
        for line in out.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= 76);
        }
    }

    #[test]
    fn quoted_printable_roundtrips_ascii() {
        let out = encode_quoted_printable(b"hello world\r\n");
        k9::assert_equal!(out, b"hello world\r\n");
    }

    #[test]
    fn quoted_printable_escapes_high_bytes_and_equals() {
        let out = encode_quoted_printable(&[0xC3, 0xA9, b'=']);
        k9::assert_equal!(out, b"=C3=A9=3D");
    }

    #[test]
    fn quoted_printable_escapes_trailing_space_before_newline() {
        let out = encode_quoted_printable(b"foo \r\nbar");
        k9::assert_equal!(out, b"foo=20\r\nbar");
    }

    #[test]
    fn streaming_base64_matches_oneshot() {
        let data = vec![7u8; 200];
        let oneshot = encode_base64(&data);
        let mut stream = CteStream::new(std::io::Cursor::new(data), ContentTransferEncoding::Base64);
        let mut streamed = String::new();
        stream.read_to_string(&mut streamed).unwrap();
        k9::assert_equal!(streamed, oneshot);
        k9::assert_equal!(stream.state(), CteStreamState::Drained);
    }

    #[test]
    fn streaming_sevenbit_fails_on_highbit() {
        let mut stream = CteStream::new(
            std::io::Cursor::new(vec![0x80u8; 4]),
            ContentTransferEncoding::SevenBit,
        );
        let mut buf = [0u8; 16];
        assert!(stream.read(&mut buf).is_err());
        k9::assert_equal!(stream.state(), CteStreamState::Failed);
    }
}
