//! Top-level message assembly: `MessageBuilder` turns text/html bodies,
//! inline and attached files, and envelope headers into a `MimePart` tree
//! and writes the finished RFC 5322 message.

use mailbuild_charset::CharsetEncoder;
use rand::RngCore;

use crate::body::Body;
use crate::content_id::ContentID;
use crate::error::MailBuildError;
use crate::header::Header;
use crate::headermap::HeaderMap;
use crate::mimepart::MimePart;
use crate::person::{Group, Person};

/// Generate a boundary/Content-ID-local-part string from caller-supplied
/// randomness: 18 random bytes, base32-encoded, lower-cased. Grounded on
/// the teacher's fallback of generating a fresh UUID when the caller
/// doesn't pin a boundary down for snapshot-stable tests.
pub fn generate_boundary(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0u8; 18];
    rng.fill_bytes(&mut bytes);
    let boundary = format!("b{}", data_encoding::BASE32_NOPAD.encode(&bytes).to_ascii_lowercase());
    tracing::trace!(boundary, "generated multipart boundary");
    boundary
}

enum AddressHeaderValue {
    People(Vec<Person>),
    Group(Group),
}

/// Builds up a message's envelope and content, then assembles the final
/// MIME tree. Mirrors the teacher's `MessageBuilder` shape (plain/html
/// text, inline files, attachments, arbitrary extra headers) generalized
/// to this crate's richer body and address types.
pub struct MessageBuilder {
    text: Option<String>,
    html: Option<String>,
    headers: HeaderMap,
    address_headers: Vec<(String, AddressHeaderValue)>,
    inline: Vec<Body>,
    attached: Vec<Body>,
    charset: CharsetEncoder,
    boundary_domain: String,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self {
            text: None,
            html: None,
            headers: HeaderMap::new(),
            address_headers: Vec::new(),
            inline: Vec::new(),
            attached: Vec::new(),
            charset: CharsetEncoder::Utf8,
            boundary_domain: "mailbuild.local".to_string(),
        }
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charset used for RFC 2047 header encoding and textual bodies that
    /// don't specify their own. Defaults to UTF-8.
    pub fn set_charset(&mut self, charset: CharsetEncoder) {
        self.charset = charset;
    }

    /// Domain used to qualify auto-generated `Content-ID`s for inline
    /// attachments that don't supply their own.
    pub fn set_boundary_domain(&mut self, domain: impl Into<String>) {
        self.boundary_domain = domain.into();
    }

    pub fn text_plain(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn text_html(&mut self, html: impl Into<String>) {
        self.html = Some(html.into());
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<(), MailBuildError> {
        self.headers.set(Header::new_unstructured("Subject", subject.into())?);
        Ok(())
    }

    pub fn set_from(&mut self, people: Vec<Person>) {
        self.address_headers.retain(|(n, _)| n != "From");
        self.address_headers.push(("From".to_string(), AddressHeaderValue::People(people)));
    }

    pub fn set_to(&mut self, people: Vec<Person>) {
        self.address_headers.retain(|(n, _)| n != "To");
        self.address_headers.push(("To".to_string(), AddressHeaderValue::People(people)));
    }

    pub fn set_cc(&mut self, people: Vec<Person>) {
        self.address_headers.retain(|(n, _)| n != "Cc");
        self.address_headers.push(("Cc".to_string(), AddressHeaderValue::People(people)));
    }

    pub fn set_bcc(&mut self, people: Vec<Person>) {
        self.address_headers.retain(|(n, _)| n != "Bcc");
        self.address_headers.push(("Bcc".to_string(), AddressHeaderValue::People(people)));
    }

    pub fn set_to_group(&mut self, group: Group) {
        self.address_headers.retain(|(n, _)| n != "To");
        self.address_headers.push(("To".to_string(), AddressHeaderValue::Group(group)));
    }

    /// Set an arbitrary extra header. `Content-Type` and
    /// `Content-Transfer-Encoding` are rejected here (spec §3): those are
    /// derived from the body the caller builds via `text_plain`/
    /// `text_html`/`attach`, never set directly on the envelope.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), MailBuildError> {
        let name = name.into();
        if name.eq_ignore_ascii_case("Content-Type") || name.eq_ignore_ascii_case("Content-Transfer-Encoding") {
            return Err(MailBuildError::ForbiddenHeader(name));
        }
        self.headers.set(Header::new_verbatim(name, value)?);
        Ok(())
    }

    pub fn attach_inline(&mut self, body: Body) {
        self.inline.push(body);
    }

    pub fn attach(&mut self, body: Body) {
        self.attached.push(body);
    }

    /// Assemble `alternative -> related -> mixed` per how much of
    /// text/html/inline/attached was supplied, then write the finished
    /// message (envelope headers + MIME tree) as bytes.
    pub fn build(self, rng: &mut dyn RngCore) -> Result<Vec<u8>, MailBuildError> {
        let charset = self.charset;
        let text_part = self
            .text
            .map(|text| MimePart::new_leaf(Body::PlainText { text, charset }, charset))
            .transpose()?;
        let html_part = self
            .html
            .map(|html| MimePart::new_leaf(Body::HtmlContent { html, charset }, charset))
            .transpose()?;

        let content_node = match (text_part, html_part) {
            (Some(t), Some(h)) => {
                let boundary = generate_boundary(rng);
                MimePart::new_multipart("alternative", vec![t, h], &boundary)?
            }
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => {
                return Err(MailBuildError::BuildError(
                    "no text or html body was specified",
                ))
            }
        };

        let content_node = if !self.inline.is_empty() {
            let mut parts = vec![content_node];
            for body in self.inline {
                parts.push(MimePart::new_leaf(body, charset)?);
            }
            let boundary = generate_boundary(rng);
            MimePart::new_multipart_with_type("related", parts, &boundary, "text/html")?
        } else {
            content_node
        };

        let mut root = if !self.attached.is_empty() {
            let mut parts = vec![content_node];
            for body in self.attached {
                parts.push(MimePart::new_leaf(body, charset)?);
            }
            let boundary = generate_boundary(rng);
            MimePart::new_multipart_with_preamble(
                "mixed",
                parts,
                &boundary,
                Some("This is a multi-part message in MIME format."),
            )?
        } else {
            content_node
        };

        let mut address_headers = self.address_headers;
        let has_recipients = address_headers.iter().any(|(name, value)| {
            matches!(name.as_str(), "To" | "Cc" | "Bcc")
                && match value {
                    AddressHeaderValue::People(people) => !people.is_empty(),
                    AddressHeaderValue::Group(group) => !group.members().is_empty(),
                }
        });
        if !has_recipients {
            return Err(MailBuildError::NoRecipients);
        }

        let render = |value: AddressHeaderValue, charset: CharsetEncoder| -> Result<String, MailBuildError> {
            match value {
                AddressHeaderValue::People(people) => {
                    let mut parts = Vec::with_capacity(people.len());
                    for person in &people {
                        parts.push(person.encode(charset)?);
                    }
                    Ok(parts.join(", "))
                }
                AddressHeaderValue::Group(group) => group.encode(charset),
            }
        };

        // Deterministic envelope order per spec §4.5: From, To, Cc, Bcc,
        // Subject, MIME-Version, X-Mailer, then everything else sorted
        // alphabetically, all *before* the derived Content-Type/CTE headers
        // `root` already carries from `MimePart::new_leaf`/`new_multipart`.
        let mut envelope: Vec<Header> = Vec::new();
        for slot in ["From", "To", "Cc", "Bcc"] {
            if let Some(pos) = address_headers.iter().position(|(n, _)| n == slot) {
                let (name, value) = address_headers.remove(pos);
                envelope.push(Header::new_verbatim(name, render(value, charset)?)?);
            }
        }

        let mut headers = self.headers;
        for slot in ["Subject", "Mime-Version", "X-Mailer"] {
            if let Some(pos) = headers.iter().position(|h| h.name().eq_ignore_ascii_case(slot)) {
                envelope.push(headers.remove(pos));
            }
        }
        if !envelope.iter().any(|h| h.name().eq_ignore_ascii_case("Mime-Version")) {
            envelope.push(Header::new_verbatim("Mime-Version", "1.0")?);
        }

        let mut rest: Vec<Header> = headers.iter().cloned().collect();
        for (name, value) in address_headers {
            rest.push(Header::new_verbatim(name, render(value, charset)?)?);
        }
        if !rest.iter().any(|h| h.name().eq_ignore_ascii_case("Message-ID")) {
            let id = ContentID::generate(self.boundary_domain.clone());
            rest.push(Header::new_verbatim("Message-ID", id.to_string())?);
        }
        rest.sort_by(|a, b| a.name().to_ascii_lowercase().cmp(&b.name().to_ascii_lowercase()));
        envelope.extend(rest);

        for header in root.headers().iter().cloned() {
            envelope.push(header);
        }
        let mut new_headers = HeaderMap::new();
        for header in envelope {
            new_headers.push(header);
        }
        *root.headers_mut() = new_headers;

        let mut out = Vec::new();
        root.write(&mut out, charset)?;
        if out.is_empty() {
            return Err(MailBuildError::NoDataWrittenToStream);
        }
        Ok(out)
    }
}

/// An already-assembled message body without the top-level header
/// concerns `MessageBuilder` adds; useful when a caller wants full
/// control over the MIME tree but still wants the CTE/boundary machinery.
pub struct MailMessage {
    root: MimePart,
}

impl MailMessage {
    pub fn from_root(root: MimePart) -> Self {
        Self { root }
    }

    pub fn into_bytes(self, charset: CharsetEncoder) -> Result<Vec<u8>, MailBuildError> {
        let mut out = Vec::new();
        self.root.write(&mut out, charset)?;
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mailbuild_address::MailAddress;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn plain_text_only_message() {
        let mut b = MessageBuilder::new();
        b.set_subject("Hello").unwrap();
        b.set_from(vec![Person::new(MailAddress::parse("a@example.com").unwrap())]);
        b.set_to(vec![Person::new(MailAddress::parse("b@example.com").unwrap())]);
        b.text_plain("hi there");
        let out = String::from_utf8(b.build(&mut rng()).unwrap()).unwrap();
        assert!(out.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(out.contains("Subject: Hello\r\n"));
        assert!(out.contains("From: a@example.com\r\n"));
        assert!(out.contains("To: b@example.com\r\n"));
        assert!(out.contains("Mime-Version: 1.0\r\n"));
        assert!(out.contains("Message-ID: <"));
        assert!(out.ends_with("hi there"));
        // From/To/Subject/MIME-Version precede the derived Content-Type, per
        // the deterministic header order spec §4.5 mandates.
        let from_pos = out.find("From:").unwrap();
        let to_pos = out.find("To:").unwrap();
        let subject_pos = out.find("Subject:").unwrap();
        let content_type_pos = out.find("Content-Type:").unwrap();
        assert!(from_pos < to_pos);
        assert!(to_pos < subject_pos);
        assert!(subject_pos < content_type_pos);
    }

    #[test]
    fn text_and_html_produce_alternative() {
        let mut b = MessageBuilder::new();
        b.set_to(vec![Person::new(MailAddress::parse("b@example.com").unwrap())]);
        b.text_plain("hi");
        b.text_html("<b>hi</b>");
        let out = String::from_utf8(b.build(&mut rng()).unwrap()).unwrap();
        assert!(out.contains("Content-Type: multipart/alternative;"));
        assert!(out.contains("text/plain"));
        assert!(out.contains("text/html"));
    }

    #[test]
    fn build_without_body_fails() {
        let b = MessageBuilder::new();
        assert!(b.build(&mut rng()).is_err());
    }

    #[test]
    fn build_without_recipients_fails() {
        let mut b = MessageBuilder::new();
        b.text_plain("hi");
        k9::assert_equal!(b.build(&mut rng()), Err(MailBuildError::NoRecipients));
    }

    #[test]
    fn content_type_cannot_be_set_as_a_plain_header() {
        let mut b = MessageBuilder::new();
        assert!(matches!(
            b.set_header("Content-Type", "text/plain"),
            Err(MailBuildError::ForbiddenHeader(_))
        ));
        assert!(matches!(
            b.set_header("content-transfer-encoding", "base64"),
            Err(MailBuildError::ForbiddenHeader(_))
        ));
    }

    #[test]
    fn inline_resource_wraps_in_related_with_html_type() {
        let mut b = MessageBuilder::new();
        b.set_to(vec![Person::new(MailAddress::parse("b@example.com").unwrap())]);
        b.text_html("<img src=cid:logo@local>");
        b.attach_inline(Body::FileAttached {
            mime: mailbuild_mime::MimeValue::new("image", "png"),
            filename: Some("logo.png".to_string()),
            content_id: "logo@local".to_string(),
            source: crate::body::FragmentSource::from_bytes(vec![1, 2, 3]),
        });
        let out = String::from_utf8(b.build(&mut rng()).unwrap()).unwrap();
        assert!(out.contains("Content-Type: multipart/related;"));
        assert!(out.contains("type=\"text/html\""));
    }

    #[test]
    fn file_attached_message_carries_mime_preamble() {
        let mut b = MessageBuilder::new();
        b.set_to(vec![Person::new(MailAddress::parse("b@example.com").unwrap())]);
        b.text_plain("hi");
        b.attach(Body::File {
            mime: mailbuild_mime::MimeValue::new("application", "pdf"),
            filename: Some("report.pdf".to_string()),
            content_id: None,
            source: crate::body::FragmentSource::from_bytes(vec![1, 2, 3]),
        });
        let out = String::from_utf8(b.build(&mut rng()).unwrap()).unwrap();
        assert!(out.contains("This is a multi-part message in MIME format.\r\n\r\n--"));
    }
}
