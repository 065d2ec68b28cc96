use crate::domain::IpLiteral;
use crate::error::AddressError;
use crate::scalars::{is_escape_allowed, is_ip_literal_scalar};

/// A single lexical unit of a mail-address surface form. Stage 1 of the
/// pipeline; see `preparser` for how these get nested into a tree and
/// `parser` for how the tree becomes a `MailAddress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailToken {
    OpenComment,
    CloseComment,
    Dot,
    AtSign,
    IpAddress(IpLiteral),
    PlainText(String),
    QuotedText(String),
}

/// Split `input` into tokens. Validation is intentionally shallow here:
/// quoted-strings and IP-address literals are checked because their
/// grammar is self-contained (bounded by matching delimiters), but plain
/// runs of scalars are accepted as-is and checked for dot-atom safety only
/// in stage 3, once we know whether they sit in the local-part or domain.
pub fn lex(input: &str) -> Result<Vec<MailToken>, AddressError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut plain = String::new();

    fn flush_plain(plain: &mut String, tokens: &mut Vec<MailToken>) {
        if !plain.is_empty() {
            tokens.push(MailToken::PlainText(std::mem::take(plain)));
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                flush_plain(&mut plain, &mut tokens);
                tokens.push(MailToken::QuotedText(lex_quoted(&mut chars)?));
            }
            '[' => {
                flush_plain(&mut plain, &mut tokens);
                tokens.push(MailToken::IpAddress(lex_ip_literal(&mut chars)?));
            }
            '(' => {
                flush_plain(&mut plain, &mut tokens);
                tokens.push(MailToken::OpenComment);
            }
            ')' => {
                flush_plain(&mut plain, &mut tokens);
                tokens.push(MailToken::CloseComment);
            }
            '.' => {
                flush_plain(&mut plain, &mut tokens);
                tokens.push(MailToken::Dot);
            }
            '@' => {
                flush_plain(&mut plain, &mut tokens);
                tokens.push(MailToken::AtSign);
            }
            other => plain.push(other),
        }
    }
    flush_plain(&mut plain, &mut tokens);
    Ok(tokens)
}

fn lex_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, AddressError> {
    let mut content = String::new();
    loop {
        match chars.next() {
            None => return Err(AddressError::UnterminatedQuotedString),
            Some('"') => return Ok(content),
            Some('\\') => match chars.next() {
                Some(escaped) if is_escape_allowed(escaped) => content.push(escaped),
                Some(_) => return Err(AddressError::InvalidScalarInQuotedString),
                None => return Err(AddressError::UnterminatedQuotedString),
            },
            Some(c) if crate::scalars::is_dot_atom_scalar(c) || crate::scalars::is_quoted_extra(c) => {
                content.push(c);
            }
            Some(_) => return Err(AddressError::InvalidScalarInQuotedString),
        }
    }
}

fn lex_ip_literal(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<IpLiteral, AddressError> {
    let mut interior = String::new();
    loop {
        match chars.next() {
            None => return Err(AddressError::UnterminatedIPAddressLiteral),
            Some(']') => break,
            Some(c) if is_ip_literal_scalar(c) => interior.push(c),
            Some(_) => return Err(AddressError::InvalidScalarInIPAddressLiteral),
        }
    }
    IpLiteral::from_bracket_interior(&interior).ok_or(AddressError::InvalidIPAddressLiteral)
}
