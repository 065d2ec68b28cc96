//! Body content and the lazy fragment-streaming machinery behind it.
//!
//! A [`Body`] is one leaf of the MIME tree: text in one of a few flavors,
//! or a file-like attachment, each associated with a [`FragmentSource`]
//! that produces the raw bytes. Sources are lazy so that a large
//! attachment never has to be buffered in memory just to compute its
//! encoded size or to be included in a tree that ultimately gets streamed
//! straight to a socket.

use std::sync::Arc;

use mailbuild_charset::CharsetEncoder;
use mailbuild_mime::MimeValue;

use crate::cte::ContentTransferEncoding;
use crate::error::MailBuildError;

/// Where a body's raw bytes come from. Cheap to clone: `Const` is
/// reference-counted, `Lazy`/`Concat` hold `Arc`s to their producers.
#[derive(Clone)]
pub enum FragmentSource {
    /// Bytes already in memory.
    Const(Arc<Vec<u8>>),
    /// Bytes produced on demand, e.g. by reading a file. Called once per
    /// traversal of the tree (building the message twice re-reads the
    /// source); callers that need it read exactly once should capture the
    /// result themselves and use `Const`.
    Lazy(Arc<dyn Fn() -> std::io::Result<Vec<u8>> + Send + Sync>),
    /// Several sources concatenated in order, e.g. a multipart body's
    /// preamble/children/boundaries without buffering the whole thing.
    Concat(Vec<FragmentSource>),
}

impl FragmentSource {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Const(Arc::new(bytes))
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> std::io::Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self::Lazy(Arc::new(f))
    }

    /// Materialize the whole source into one buffer. Defeats the purpose
    /// of streaming for large bodies; used by the CTE engine's streaming
    /// `Read` adapter only as a fallback when a single in-memory encode is
    /// cheaper than chunked reads (callers who care about bounded memory
    /// should prefer `FragmentSource::reader`).
    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Const(b) => Ok((**b).clone()),
            Self::Lazy(f) => f(),
            Self::Concat(parts) => {
                let mut out = Vec::new();
                for part in parts {
                    out.extend(part.to_bytes()?);
                }
                Ok(out)
            }
        }
    }

    /// A `Read` view over this source, for the streaming CTE path.
    pub fn reader(&self) -> FragmentReader {
        FragmentReader {
            source: self.clone(),
            queue: None,
        }
    }
}

/// Flattens a (possibly `Concat`-nested) `FragmentSource` into a `Read`
/// stream, pulling each leaf's bytes only when reached.
pub struct FragmentReader {
    source: FragmentSource,
    queue: Option<std::collections::VecDeque<FragmentSource>>,
}

impl std::io::Read for FragmentReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.queue.is_none() {
            let mut q = std::collections::VecDeque::new();
            flatten(&self.source, &mut q);
            self.queue = Some(q);
        }
        let queue = self.queue.as_mut().unwrap();
        loop {
            let Some(front) = queue.front() else {
                return Ok(0);
            };
            let bytes = front.to_bytes()?;
            if bytes.is_empty() {
                queue.pop_front();
                continue;
            }
            let n = buf.len().min(bytes.len());
            buf[..n].copy_from_slice(&bytes[..n]);
            queue.pop_front();
            if n < bytes.len() {
                queue.push_front(FragmentSource::from_bytes(bytes[n..].to_vec()));
            }
            return Ok(n);
        }
    }
}

fn flatten(source: &FragmentSource, out: &mut std::collections::VecDeque<FragmentSource>) {
    match source {
        FragmentSource::Concat(parts) => {
            for part in parts {
                flatten(part, out);
            }
        }
        other => out.push_back(other.clone()),
    }
}

/// The domain used to qualify a `File`'s auto-generated `Content-ID` when
/// the caller doesn't supply one. `MessageBuilder` uses the same default
/// for `Message-ID` (see `message.rs`'s `boundary_domain`); a bare `File`
/// constructed outside a `MessageBuilder` has no per-message domain to draw
/// on, so it falls back to this constant instead.
const DEFAULT_CONTENT_ID_DOMAIN: &str = "mailbuild.local";

/// Which kind of leaf content a `Body` holds. Mirrors the handful of body
/// shapes a message actually needs to build, rather than trying to be a
/// general MIME-part value. Plain-text-plus-HTML ("rich text") is not a
/// variant here: it is the `multipart/alternative` wrapping that
/// `MessageBuilder::build` assembles from a `PlainText` and an
/// `HtmlContent` leaf, not its own leaf shape.
pub enum Body {
    /// `text/plain`.
    PlainText { text: String, charset: CharsetEncoder },
    /// `text/html`.
    HtmlContent { html: String, charset: CharsetEncoder },
    /// An inline attachment referenced from other parts via a
    /// `Content-ID` (e.g. an image embedded in HTML with `cid:`).
    FileAttached {
        mime: MimeValue,
        filename: Option<String>,
        content_id: String,
        source: FragmentSource,
    },
    /// A regular, non-inline attachment. Always carries a `Content-ID`
    /// (spec.md's `File` shape), minted from a fresh UUID against
    /// `DEFAULT_CONTENT_ID_DOMAIN` when the caller doesn't supply one.
    File {
        mime: MimeValue,
        filename: Option<String>,
        content_id: Option<String>,
        source: FragmentSource,
    },
}

impl Body {
    pub fn mime_value(&self) -> MimeValue {
        match self {
            Self::PlainText { charset, .. } => {
                let mut m = MimeValue::new("text", "plain");
                m.set_param("charset", charset.canonical_name());
                m
            }
            Self::HtmlContent { charset, .. } => {
                let mut m = MimeValue::new("text", "html");
                m.set_param("charset", charset.canonical_name());
                m
            }
            Self::FileAttached { mime, .. } | Self::File { mime, .. } => mime.clone(),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::FileAttached { filename, .. } | Self::File { filename, .. } => filename.as_deref(),
            _ => None,
        }
    }

    /// The `Content-ID` this body should be announced under, if any. A
    /// `File` without an explicit one gets a fresh UUID minted against
    /// `DEFAULT_CONTENT_ID_DOMAIN` on every call, so callers that need a
    /// stable id across multiple calls (e.g. to both set the header and
    /// reference it from an HTML `cid:` link) should generate one
    /// themselves and pass it in.
    pub fn content_id(&self) -> Option<String> {
        match self {
            Self::FileAttached { content_id, .. } => Some(content_id.clone()),
            Self::File { content_id, .. } => Some(content_id.clone().unwrap_or_else(|| {
                crate::content_id::ContentID::generate(DEFAULT_CONTENT_ID_DOMAIN).as_bare()
            })),
            _ => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::PlainText { .. } | Self::HtmlContent { .. } | Self::FileAttached { .. })
    }

    /// The transfer encoding this body should be sent with. Textual
    /// bodies get `7bit` when their charset bytes are already clean
    /// 7-bit ASCII-line data (true for US-ASCII and for ISO-2022-JP, whose
    /// shift sequences stay 7-bit) and `quoted-printable` otherwise (e.g.
    /// UTF-8 text with non-ASCII scalars); binary attachments always use
    /// `base64`.
    pub fn transfer_encoding(&self) -> Result<ContentTransferEncoding, MailBuildError> {
        match self {
            Self::PlainText { text, charset } => Ok(crate::cte::choose_text_cte(&charset.encode(text)?)),
            Self::HtmlContent { html, charset } => Ok(crate::cte::choose_text_cte(&charset.encode(html)?)),
            Self::FileAttached { .. } | Self::File { .. } => Ok(ContentTransferEncoding::Base64),
        }
    }

    pub fn source(&self) -> Result<FragmentSource, MailBuildError> {
        match self {
            Self::PlainText { text, charset } => Ok(FragmentSource::from_bytes(charset.encode(text)?)),
            Self::HtmlContent { html, charset } => Ok(FragmentSource::from_bytes(charset.encode(html)?)),
            Self::FileAttached { source, .. } | Self::File { source, .. } => Ok(source.clone()),
        }
    }
}
