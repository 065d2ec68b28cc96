//! Scalar classification shared by the lexer and the stage-3 parser.
//!
//! These mirror RFC 5322's `atext`/`qtext` definitions closely enough for
//! our purposes but are named after what they're used for here rather than
//! after the grammar productions, since this crate never claims to be a
//! full RFC 5322 grammar.

/// `atext`: letters, digits, and the usual set of special printable ASCII
/// punctuation that RFC 5322 permits unescaped in a dot-atom, plus `.`
/// (dot-atom allows internal dots; the lexer already splits `.` into its
/// own token, so callers re-add it where needed).
pub fn is_dot_atom_scalar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '/'
                | '='
                | '?'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
                | '~'
                | '.'
        )
}

/// The extra punctuation a quoted-string may contain unescaped, beyond the
/// dot-atom set: space and the specials that would otherwise need escaping
/// outside of quotes.
pub fn is_quoted_extra(c: char) -> bool {
    matches!(
        c,
        ' ' | '(' | ')' | ',' | ':' | ';' | '<' | '>' | '@' | '[' | ']'
    )
}

/// A scalar that may follow a backslash inside a quoted-string: `"`, `\`,
/// space, tab, or any VCHAR (0x21..=0x7E).
pub fn is_escape_allowed(c: char) -> bool {
    c == ' ' || c == '\t' || c == '"' || c == '\\' || ('\u{21}'..='\u{7E}').contains(&c)
}

/// Hex digit, `.`/`:`, or one of the ASCII letters needed to spell the
/// `IPv6` literal prefix, all that's allowed inside an IP-address literal's
/// brackets.
pub fn is_ip_literal_scalar(c: char) -> bool {
    c.is_ascii_hexdigit() || matches!(c, '.' | ':' | 'I' | 'P' | 'v')
}

/// Quote and backslash-escape `s` for embedding inside a quoted-string.
pub fn quote_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// True if every scalar of `s` is dot-atom safe, meaning `s` can be
/// embedded unquoted.
pub fn is_dot_atom_safe(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_dot_atom_scalar) && !s.starts_with('.') && !s.ends_with('.') && !s.contains("..")
}
