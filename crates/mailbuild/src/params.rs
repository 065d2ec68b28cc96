//! RFC 2231 parameter-value encoder (the reverse of RFC 2231 decoding):
//! turns a logical `name = value` pair into the wire form a
//! `Content-Type`/`Content-Disposition` header needs, choosing between
//! three forms depending on what the value contains and how long it is:
//!
//! - short form: `name=value` (bare token) when the value is a plain
//!   token with no reserved characters.
//! - quoted form: `name="value"` when the value needs quoting but is
//!   plain ASCII and fits on one line.
//! - continuation form: `name*0*=charset'lang'pct-encoded-segment;
//!   name*1*=pct-encoded-segment; ...` when the value is non-ASCII or
//!   too long to fit as a single parameter.

use mailbuild_charset::CharsetEncoder;

use crate::error::MailBuildError;

/// The budget for a single `name*N*=value` segment's `value` portion,
/// chosen to keep the whole `; name*N*=...` piece comfortably inside a
/// folded 78-column line once the parameter name and surrounding
/// boilerplate are accounted for.
const SEGMENT_MAX: usize = 60;

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|c| {
            c.is_ascii_whitespace()
                || matches!(
                    c,
                    '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '='
                )
        })
}

fn is_token_safe(value: &str) -> bool {
    value.is_ascii() && !needs_quoting(value)
}

fn percent_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for &b in bytes {
        let c = b as char;
        if b.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~') {
            out.push(c);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Encode one `name=value` parameter into its wire form(s). A
/// continuation-encoded value produces multiple `name*N*=...` pieces, one
/// per returned string; the caller joins them with `"; "` as it would any
/// other parameter.
pub fn encode_parameter(
    name: &str,
    value: &str,
    charset: CharsetEncoder,
    lang: Option<&str>,
) -> Result<Vec<String>, MailBuildError> {
    if is_token_safe(value) && value.chars().count() <= SEGMENT_MAX {
        return Ok(vec![format!("{name}={value}")]);
    }

    if value.is_ascii() && !value.contains('\n') && value.chars().count() <= SEGMENT_MAX {
        return Ok(vec![format!("{name}={}", quote(value))]);
    }

    let bytes = charset.encode(value)?;
    let encoded = percent_encode(&bytes);
    let lang = lang.unwrap_or("");
    let charset_name = charset.canonical_name();

    // Single segment: still needs the `*` marker (extended-parameter
    // syntax) to carry the charset/lang tag, but no continuation index
    // beyond 0 is required.
    if encoded.len() + charset_name.len() + lang.len() + 2 <= SEGMENT_MAX {
        return Ok(vec![format!("{name}*={charset_name}'{lang}'{encoded}")]);
    }

    // Continuation form: split the percent-encoded text on segment
    // boundaries that don't break a `%XX` escape in half.
    let mut segments = Vec::new();
    let chars: Vec<char> = encoded.chars().collect();
    let mut start = 0;
    let mut first = true;
    while start < chars.len() {
        let budget = if first {
            SEGMENT_MAX.saturating_sub(charset_name.len() + lang.len() + 2)
        } else {
            SEGMENT_MAX
        };
        let mut end = (start + budget).min(chars.len());
        // Don't split a `%XX` escape across segments.
        while end > start && end < chars.len() && chars[end - 1] == '%' {
            end -= 1;
        }
        if end > start + 1 && chars[end - 2] == '%' {
            end -= 2;
        }
        if end <= start {
            end = (start + 1).min(chars.len());
        }
        let segment: String = chars[start..end].iter().collect();
        segments.push(segment);
        start = end;
        first = false;
    }

    Ok(segments
        .into_iter()
        .enumerate()
        .map(|(i, seg)| {
            if i == 0 {
                format!("{name}*{i}*={charset_name}'{lang}'{seg}")
            } else {
                format!("{name}*{i}*={seg}")
            }
        })
        .collect())
}
