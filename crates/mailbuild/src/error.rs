use thiserror::Error;

/// Everything that can go wrong building a message. Each stage of the
/// pipeline (address parsing, charset resolution, CTE encoding, header
/// construction) has its own narrow error type; this is the glue that lets
/// callers propagate any of them with `?`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MailBuildError {
    #[error("invalid header name {0:?}: header names are a dot-atom-like token, no spaces or colons")]
    InvalidHeaderName(String),
    #[error("header {0:?} is derived from the body and cannot be set directly")]
    ForbiddenHeader(String),
    #[error("header '{header_name}' value could not be encoded: {error}")]
    HeaderValueEncoding {
        header_name: String,
        error: String,
    },
    #[error("invalid mail address: {0}")]
    Address(#[from] mailbuild_address::AddressError),
    #[error("charset error: {0}")]
    Charset(#[from] mailbuild_charset::CharsetError),
    #[error("data is not valid 7-bit when Content-Transfer-Encoding: 7bit was requested")]
    EightBitIn7Bit,
    #[error("mime tree has too many child parts")]
    TooManyParts,
    #[error("error building message: {0}")]
    BuildError(&'static str),
    #[error("io error while streaming a body fragment")]
    FragmentIoError,
    #[error("message has no recipients (To/Cc/Bcc are all empty)")]
    NoRecipients,
    #[error("no data was written to the output stream")]
    NoDataWrittenToStream,
    #[error("'{0}' is not a Content-Transfer-Encoding this crate can produce")]
    InvalidContentTransferEncoding(String),
    #[error("body cannot be represented in a 7-bit-safe transfer encoding")]
    Non7bitRepresentation,
    #[error("output sink has reached its capacity")]
    HasReachedCapacity,
    #[error("unexpected error: {0}")]
    UnexpectedError(String),
}
