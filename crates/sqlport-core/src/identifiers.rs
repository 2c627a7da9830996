//! SQL identifier quoting.

/// Delimiters a backend uses around identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierStyle {
    /// `"name"` (ANSI, PostgreSQL, SQLite)
    Ansi,
    /// `` `name` `` (MySQL)
    Backtick,
    /// `[name]` (SQL Server)
    Bracket,
}

impl IdentifierStyle {
    const fn delimiters(self) -> (char, char) {
        match self {
            IdentifierStyle::Ansi => ('"', '"'),
            IdentifierStyle::Backtick => ('`', '`'),
            IdentifierStyle::Bracket => ('[', ']'),
        }
    }
}

/// Quote an identifier, doubling any embedded closing delimiter.
///
/// Safe against SQL injection for any input string.
///
/// # Examples
///
/// ```
/// use sqlport_core::identifiers::{IdentifierStyle, quote_ident};
///
/// assert_eq!(quote_ident("users", IdentifierStyle::Ansi), "\"users\"");
/// assert_eq!(quote_ident("user`name", IdentifierStyle::Backtick), "`user``name`");
/// ```
pub fn quote_ident(name: &str, style: IdentifierStyle) -> String {
    let (open, close) = style.delimiters();
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(open);
    for c in name.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}
