//! The MIME part tree: a leaf (some `Body`) or a `multipart/*` node
//! holding child parts, and the logic to write either one out as
//! RFC 2045/2046-conformant bytes, boundary framing and all.

use std::io::Read;

use mailbuild_charset::CharsetEncoder;
use mailbuild_mime::MimeValue;

use crate::body::Body;
use crate::cte::CteStream;
use crate::error::MailBuildError;
use crate::header::Header;
use crate::headermap::HeaderMap;
use crate::params::encode_parameter;

enum MimeContent {
    Leaf(Body),
    Multipart {
        parts: Vec<MimePart>,
        /// Literal text emitted before the first boundary line, e.g. the
        /// classic "This is a multi-part message in MIME format." notice
        /// `FileAttached` bodies carry for mail readers with no MIME
        /// support at all (spec §4.5).
        preamble: Option<String>,
    },
}

/// One node of the MIME tree. Headers belonging to this part specifically
/// (`Content-Type`, `Content-Transfer-Encoding`, and whatever extra ones
/// the caller adds) live in `headers`; top-level message headers
/// (`From`, `Subject`, ...) belong on the envelope in `message.rs`, not
/// here, mirroring the RFC 5322/2045 split between the message header
/// block and each MIME part's own headers.
pub struct MimePart {
    headers: HeaderMap,
    content: MimeContent,
}

fn content_type_header_value(mime: &MimeValue, charset: CharsetEncoder) -> Result<String, MailBuildError> {
    let mut out = mime.full_type();
    for (name, value) in mime.params() {
        for segment in encode_parameter(name, value, charset, None)? {
            out.push_str("; ");
            out.push_str(&segment);
        }
    }
    Ok(out)
}

impl MimePart {
    /// Build a leaf part from `body`, deriving `Content-Type`,
    /// `Content-Transfer-Encoding`, and (for attachments) `Content-ID`/
    /// `Content-Disposition` from it.
    pub fn new_leaf(body: Body, charset: CharsetEncoder) -> Result<Self, MailBuildError> {
        let mut headers = HeaderMap::new();
        let mime = body.mime_value();
        headers.push(Header::new_verbatim(
            "Content-Type",
            content_type_header_value(&mime, charset)?,
        )?);
        headers.push(Header::new_verbatim(
            "Content-Transfer-Encoding",
            body.transfer_encoding()?.as_str(),
        )?);

        if let Some(cid) = body.content_id() {
            headers.push(Header::new_verbatim("Content-ID", format!("<{cid}>"))?);
        }

        if let Some(filename) = body.filename() {
            let disposition = if matches!(body, Body::FileAttached { .. }) {
                "inline"
            } else {
                "attachment"
            };
            let mut value = disposition.to_string();
            for segment in encode_parameter("filename", filename, charset, None)? {
                value.push_str("; ");
                value.push_str(&segment);
            }
            headers.push(Header::new_verbatim("Content-Disposition", value)?);
        }

        Ok(Self {
            headers,
            content: MimeContent::Leaf(body),
        })
    }

    /// Build a `multipart/<subtype>` node. `boundary` must be unique
    /// within the message; `MessageBuilder` generates one when the caller
    /// doesn't supply it.
    pub fn new_multipart(subtype: &str, parts: Vec<MimePart>, boundary: &str) -> Result<Self, MailBuildError> {
        Self::new_multipart_full(subtype, parts, boundary, None, None)
    }

    /// Same as `new_multipart`, plus a literal preamble written before the
    /// first boundary line (spec §4.5's `FileAttached` notice).
    pub fn new_multipart_with_preamble(
        subtype: &str,
        parts: Vec<MimePart>,
        boundary: &str,
        preamble: Option<&str>,
    ) -> Result<Self, MailBuildError> {
        Self::new_multipart_full(subtype, parts, boundary, preamble, None)
    }

    /// Same as `new_multipart`, plus a `type` parameter on the
    /// `Content-Type` header (RFC 2387's `multipart/related; type=...`,
    /// naming the MIME type of the root part the related resources hang
    /// off of).
    pub fn new_multipart_with_type(
        subtype: &str,
        parts: Vec<MimePart>,
        boundary: &str,
        type_param: &str,
    ) -> Result<Self, MailBuildError> {
        Self::new_multipart_full(subtype, parts, boundary, None, Some(type_param))
    }

    fn new_multipart_full(
        subtype: &str,
        parts: Vec<MimePart>,
        boundary: &str,
        preamble: Option<&str>,
        type_param: Option<&str>,
    ) -> Result<Self, MailBuildError> {
        let mut mime = MimeValue::new("multipart", subtype);
        mime.set_param("boundary", boundary);
        if let Some(type_param) = type_param {
            mime.set_param("type", type_param);
        }
        let mut headers = HeaderMap::new();
        headers.push(Header::new_verbatim(
            "Content-Type",
            content_type_header_value(&mime, CharsetEncoder::Ascii)?,
        )?);
        Ok(Self {
            headers,
            content: MimeContent::Multipart {
                parts,
                preamble: preamble.map(str::to_string),
            },
        })
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn boundary(&self) -> Option<&str> {
        self.headers.get_first("Content-Type").and_then(|h| {
            h.raw_value()
                .split(';')
                .map(str::trim)
                .find_map(|seg| seg.strip_prefix("boundary=").map(|v| v.trim_matches('"')))
        })
    }

    /// Write this part (headers, blank line, body) into `out`. For a leaf
    /// this transfer-encodes the body; for a multipart node this
    /// recursively writes each child framed by the boundary.
    pub fn write(&self, out: &mut Vec<u8>, charset: CharsetEncoder) -> Result<(), MailBuildError> {
        let mut header_text = String::new();
        self.headers.write(&mut header_text, charset)?;
        out.extend_from_slice(header_text.as_bytes());
        out.extend_from_slice(b"\r\n");

        match &self.content {
            MimeContent::Leaf(body) => {
                let reader = body.source()?.reader();
                let mut cte_stream = CteStream::new(reader, body.transfer_encoding()?);
                let mut chunk = [0u8; 8192];
                loop {
                    let n = cte_stream.read(&mut chunk).map_err(|e| {
                        let message = e.to_string();
                        e.into_inner()
                            .and_then(|inner| inner.downcast::<MailBuildError>().ok())
                            .map(|boxed| *boxed)
                            .unwrap_or(MailBuildError::UnexpectedError(message))
                    })?;
                    if n == 0 {
                        break;
                    }
                    out.extend_from_slice(&chunk[..n]);
                }
            }
            MimeContent::Multipart { parts, preamble } => {
                let boundary = self
                    .boundary()
                    .ok_or(MailBuildError::BuildError("multipart part is missing its boundary"))?
                    .to_string();
                if let Some(preamble) = preamble {
                    out.extend_from_slice(preamble.as_bytes());
                    out.extend_from_slice(b"\r\n\r\n");
                }
                for part in parts {
                    out.extend_from_slice(b"--");
                    out.extend_from_slice(boundary.as_bytes());
                    out.extend_from_slice(b"\r\n");
                    part.write(out, charset)?;
                    // Every body-part is followed by `CRLF dash-boundary`
                    // (RFC 2046 §5.1.1's `encapsulation`/`close-delimiter`
                    // grammar); without it the next boundary line would be
                    // glued onto the previous part's trailing byte instead
                    // of starting its own line.
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(b"--");
                out.extend_from_slice(boundary.as_bytes());
                out.extend_from_slice(b"--\r\n");
            }
        }
        Ok(())
    }
}
