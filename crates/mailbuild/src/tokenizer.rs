//! RFC 2047 header-value tokenizer and encoder.
//!
//! A header value is split into a sequence of tokens: runs of linear
//! white space (which double as fold points), runs of plain-ASCII visible
//! text that can be emitted verbatim, and runs containing anything else
//! (non-ASCII Unicode or ASCII control scalars) that must become one or
//! more `=?charset?B?...?=` encoded-words. The tokenizer and the encoder
//! are kept separate: tokenizing only needs to know which scalars are
//! "safe", encoding needs a charset and a line-length budget.

use mailbuild_charset::CharsetEncoder;

use crate::error::MailBuildError;

/// The maximum length of a single encoded-word, per RFC 2047 ("an
/// 'encoded-word' may not be more than 75 characters long"), including the
/// `=?charset?B?` prefix and `?=` suffix.
const ENCODED_WORD_MAX: usize = 75;

/// The column at which we prefer to fold a header value onto a new line,
/// continued by a single space (RFC 5322 `obs-FWS` / `CRLF SP`).
const FOLD_COLUMN: usize = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarClass {
    Lws,
    Vis,
    Oth,
}

fn classify(c: char) -> ScalarClass {
    if c == ' ' || c == '\t' {
        ScalarClass::Lws
    } else if c.is_ascii() && !c.is_ascii_control() {
        ScalarClass::Vis
    } else {
        ScalarClass::Oth
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderToken {
    /// Linear white space, kept verbatim; also a candidate fold point.
    Space(String),
    /// A run of plain-ASCII visible scalars, safe to emit as-is.
    Raw(String),
    /// A run that must be represented as one or more encoded-words. May
    /// contain embedded single spaces from merging adjacent
    /// encoded-requiring words (see `tokenize`).
    Encoded(String),
}

/// Split `input` into alternating space/word tokens, classifying each
/// non-whitespace word as `Raw` (plain ASCII) or `Encoded` (contains any
/// scalar that can't be emitted unescaped in a header value). Adjacent
/// `Encoded` words separated by a single space are merged into one token
/// so encoding covers the separating space too: some non-conformant
/// decoders join adjacent encoded-words and drop the whitespace between
/// them, so folding the space into the encoded text avoids losing it.
fn tokenize(input: &str) -> Vec<HeaderToken> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if classify(c) == ScalarClass::Lws {
            let mut ws = String::new();
            while let Some(&c) = chars.peek() {
                if classify(c) == ScalarClass::Lws {
                    ws.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(HeaderToken::Space(ws));
        } else {
            let mut word = String::new();
            let mut needs_encoding = false;
            while let Some(&c) = chars.peek() {
                if classify(c) == ScalarClass::Lws {
                    break;
                }
                if classify(c) == ScalarClass::Oth {
                    needs_encoding = true;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(if needs_encoding {
                HeaderToken::Encoded(word)
            } else {
                HeaderToken::Raw(word)
            });
        }
    }

    merge_adjacent_encoded(tokens)
}

fn merge_adjacent_encoded(tokens: Vec<HeaderToken>) -> Vec<HeaderToken> {
    let mut out: Vec<HeaderToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match (out.last_mut(), &token) {
            (Some(HeaderToken::Encoded(prev)), HeaderToken::Space(ws)) if ws == " " => {
                // Hold the space; only commit the merge once we see whether
                // the following word is also Encoded.
                prev.push(' ');
            }
            (Some(HeaderToken::Encoded(prev)), HeaderToken::Encoded(next)) => {
                prev.push_str(next);
            }
            (Some(HeaderToken::Encoded(prev)), _) if prev.ends_with(' ') => {
                // The held space wasn't followed by another Encoded run;
                // give it back as its own token.
                prev.pop();
                out.push(HeaderToken::Space(" ".to_string()));
                out.push(token);
            }
            _ => out.push(token),
        }
    }
    out
}

fn encoded_word_len(charset: &CharsetEncoder, chunk: &str) -> Result<usize, MailBuildError> {
    let bytes = charset.encode(chunk)?;
    let b64_len = data_encoding::BASE64.encode_len(bytes.len());
    Ok(4 + charset.canonical_name().len() + 2 + b64_len)
}

fn make_encoded_word(charset: &CharsetEncoder, chunk: &str) -> Result<String, MailBuildError> {
    let bytes = charset.encode(chunk)?;
    Ok(format!(
        "=?{}?B?{}?=",
        charset.canonical_name(),
        data_encoding::BASE64.encode(&bytes)
    ))
}

/// Split a run of text that needs encoding into one or more encoded-words,
/// each fitting within `ENCODED_WORD_MAX`, by binary-searching the widest
/// scalar prefix that still fits the budget.
fn split_encoded(charset: &CharsetEncoder, text: &str) -> Result<Vec<String>, MailBuildError> {
    let scalars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut start = 0;

    while start < scalars.len() {
        let mut lo = start + 1;
        let mut hi = scalars.len();
        let mut best = lo;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let candidate: String = scalars[start..mid].iter().collect();
            if encoded_word_len(charset, &candidate)? <= ENCODED_WORD_MAX {
                best = mid;
                lo = mid + 1;
            } else if mid == lo {
                break;
            } else {
                hi = mid - 1;
            }
        }
        let chunk: String = scalars[start..best].iter().collect();
        out.push(make_encoded_word(charset, &chunk)?);
        start = best;
    }
    Ok(out)
}

/// Encode a free-form header value for the wire: plain ASCII passes
/// through untouched, anything else becomes RFC 2047 encoded-words, and
/// the whole thing is folded at `FOLD_COLUMN` using `CRLF SP` continuation.
///
/// `initial_column` is the number of columns already consumed on the
/// current line (typically the length of `"Header-Name: "`), so folding
/// decisions account for it.
pub fn encode_header_value(
    charset: CharsetEncoder,
    raw: &str,
    initial_column: usize,
) -> Result<String, MailBuildError> {
    let tokens = tokenize(raw);
    let mut atoms: Vec<String> = Vec::new();
    for token in tokens {
        match token {
            HeaderToken::Space(ws) => atoms.push(ws),
            HeaderToken::Raw(word) => atoms.push(word),
            HeaderToken::Encoded(word) => atoms.extend(split_encoded(&charset, &word)?),
        }
    }

    let mut out = String::new();
    let mut column = initial_column;
    for (i, atom) in atoms.iter().enumerate() {
        let is_space = atom.chars().all(|c| c == ' ' || c == '\t');
        if is_space && i > 0 {
            let next_len = atoms.get(i + 1).map(|s| s.chars().count()).unwrap_or(0);
            if column + atom.chars().count() + next_len > FOLD_COLUMN {
                out.push_str("\r\n ");
                column = 1;
                continue;
            }
        }
        out.push_str(atom);
        column += atom.chars().count();
    }
    Ok(out)
}
