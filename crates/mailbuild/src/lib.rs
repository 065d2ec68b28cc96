//! Construct and serialize RFC 5322 / MIME (RFC 2045-2047, 2046, 2231)
//! email messages.
//!
//! This crate only builds messages; it does not parse inbound mail. The
//! pipeline is: classify and encode header values ([`tokenizer`]), encode
//! MIME parameters ([`params`]), transfer-encode bodies ([`cte`]), and
//! assemble a tree of [`mimepart::MimePart`]s via [`message::MessageBuilder`].

mod body;
mod content_id;
mod cte;
mod error;
mod header;
mod headermap;
mod message;
mod mimepart;
mod params;
mod person;
mod safe_bytes;
mod tokenizer;

pub use body::{Body, FragmentSource};
pub use content_id::ContentID;
pub use cte::{
    encode_7bit, encode_base64, encode_quoted_printable, ContentTransferEncoding, CteStream,
    CteStreamState,
};
pub use error::MailBuildError;
pub use header::Header;
pub use headermap::HeaderMap;
pub use message::{generate_boundary, MailMessage, MessageBuilder};
pub use mimepart::MimePart;
pub use params::encode_parameter;
pub use person::{Group, Person};
pub use safe_bytes::{SafeByteBuffer, SevenBitByte};
pub use tokenizer::encode_header_value;

pub use mailbuild_address::{AddressError, Domain, DomainPart, IpLiteral, MailAddress};
pub use mailbuild_charset::{CharsetEncoder, CharsetError};
pub use mailbuild_mime::MimeValue;

pub type Result<T> = std::result::Result<T, MailBuildError>;
