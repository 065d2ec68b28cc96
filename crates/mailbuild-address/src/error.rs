use thiserror::Error;

/// Every way a mail-address surface form can fail to parse.
///
/// Variants are deliberately specific rather than collapsed into a single
/// "invalid address" bucket: callers building interactive forms or bounce
/// reports want to say *what* was wrong, not just that something was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("unterminated quoted string")]
    UnterminatedQuotedString,
    #[error("invalid scalar in quoted string")]
    InvalidScalarInQuotedString,
    #[error("unterminated IP address literal")]
    UnterminatedIPAddressLiteral,
    #[error("invalid scalar in IP address literal")]
    InvalidScalarInIPAddressLiteral,
    #[error("invalid IP address literal")]
    InvalidIPAddressLiteral,
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,
    #[error("address is too long")]
    TooLong,
    #[error("more than one @ sign")]
    DuplicateAtSigns,
    #[error("missing @ sign")]
    MissingAtSign,
    #[error("missing local part")]
    MissingLocalPart,
    #[error("missing domain")]
    MissingDomain,
    #[error("comment in invalid position")]
    InvalidCommentPosition,
    #[error("invalid domain")]
    InvalidDomain,
    #[error("consecutive dots")]
    ConsecutiveDots,
    #[error("dot in invalid position")]
    InvalidDotPosition,
    #[error("invalid scalar in local part")]
    InvalidScalarInLocalPart,
    #[error("quoted string in invalid position")]
    InvalidQuotedStringPosition,
    #[error("local part is too long")]
    TooLongLocalPart,
}
