//! The connection collaborator the type layer talks to.
//!
//! A [`Backend`] exposes the options, string escaping rules, identifier
//! quoting and optional SQL function helpers of one database connection.
//! The type layer never executes SQL itself.

use std::sync::{Mutex, PoisonError};

use crate::error::Result;
use crate::identifiers::{IdentifierStyle, quote_ident};
use crate::lob::LobEntry;
use crate::options::Options;

/// Wildcards recognized in LIKE patterns.
pub const PATTERN_WILDCARDS: [char; 2] = ['%', '_'];

/// How a backend delimits and escapes string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringQuoting {
    /// Opening delimiter
    pub start: char,
    /// Closing delimiter
    pub end: char,
    /// Character used to escape the closing delimiter inside a literal
    pub escape: char,
    /// Character used to escape wildcards in patterns
    pub escape_pattern: Option<char>,
}

impl Default for StringQuoting {
    fn default() -> Self {
        Self {
            start: '\'',
            end: '\'',
            escape: '\'',
            escape_pattern: Some('\\'),
        }
    }
}

impl StringQuoting {
    /// Whether wildcard escaping needs an explicit `ESCAPE` clause.
    pub fn needs_escape_clause(&self) -> bool {
        self.escape_pattern.is_some_and(|c| c != self.escape)
    }
}

/// Which current-time keyword to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NowKind {
    Date,
    Time,
    Timestamp,
}

impl NowKind {
    /// The ANSI keyword for this kind.
    pub const fn keyword(self) -> &'static str {
        match self {
            NowKind::Date => "CURRENT_DATE",
            NowKind::Time => "CURRENT_TIME",
            NowKind::Timestamp => "CURRENT_TIMESTAMP",
        }
    }

    /// Recognize a `CURRENT_*` sentinel value.
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "CURRENT_DATE" => Some(NowKind::Date),
            "CURRENT_TIME" => Some(NowKind::Time),
            "CURRENT_TIMESTAMP" => Some(NowKind::Timestamp),
            _ => None,
        }
    }
}

/// Backend-specific SQL function expressions.
pub trait SqlFunctions {
    /// Expression for the current date, time or timestamp.
    fn now(&self, kind: NowKind) -> String;

    /// Expression lower-casing `expression`.
    fn lower(&self, expression: &str) -> String;
}

/// ANSI SQL function expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFunctions;

impl SqlFunctions for StandardFunctions {
    fn now(&self, kind: NowKind) -> String {
        kind.keyword().to_string()
    }

    fn lower(&self, expression: &str) -> String {
        format!("LOWER({expression})")
    }
}

/// A database connection as seen by the type layer.
pub trait Backend {
    /// Current options. Re-read on every call.
    fn options(&self) -> &Options;

    /// Identity embedded in LOB locators issued for this connection.
    fn identity(&self) -> &str;

    /// Escape text for inclusion in a string literal (no delimiters added).
    fn escape(&self, text: &str, escape_wildcards: bool) -> Result<String>;

    /// Escape the pattern escape character and wildcards in `text`.
    fn escape_pattern(&self, text: &str) -> String;

    /// Quote an identifier. With `check_option`, quoting only happens when
    /// [`Options::quote_identifier`] is enabled.
    fn quote_identifier(&self, name: &str, check_option: bool) -> String;

    /// String literal delimiters and escape characters.
    fn string_quoting(&self) -> StringQuoting;

    /// Literal for binary data that cannot travel inside a string literal.
    fn quote_binary(&self, bytes: &[u8]) -> String {
        let mut literal = String::with_capacity(bytes.len() * 2 + 3);
        literal.push_str("X'");
        for byte in bytes {
            literal.push_str(&format!("{byte:02X}"));
        }
        literal.push('\'');
        literal
    }

    /// Clause appended to patterns whose wildcards were escaped.
    fn pattern_escape_string(&self) -> String {
        match self.string_quoting().escape_pattern {
            Some(c) => format!(" ESCAPE '{c}'"),
            None => String::new(),
        }
    }

    /// SQL function helpers, if this backend provides them.
    fn functions(&self) -> Option<&dyn SqlFunctions> {
        None
    }

    /// Record a non-fatal warning.
    fn warn(&self, message: &str);

    /// Load the contents of a LOB on first access.
    fn retrieve_lob(&self, entry: &mut LobEntry) -> Result<()> {
        if entry.value().is_none() {
            let bytes = entry.resource_bytes();
            entry.set_value(bytes);
        }
        Ok(())
    }

    /// Free backend resources held by a LOB that is being destroyed.
    fn release_lob(&self, _entry: &LobEntry) -> Result<()> {
        Ok(())
    }
}

/// Reference [`Backend`] following ANSI SQL conventions.
///
/// Quotes are escaped by doubling, wildcards with a backslash, identifiers
/// with double quotes. Warnings are kept in memory and also emitted as
/// `tracing` events.
#[derive(Debug)]
pub struct AnsiBackend {
    identity: String,
    options: Options,
    quoting: StringQuoting,
    identifier_style: IdentifierStyle,
    functions: Option<StandardFunctions>,
    warnings: Mutex<Vec<String>>,
}

impl AnsiBackend {
    /// Create a backend with default options.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            options: Options::default(),
            quoting: StringQuoting::default(),
            identifier_style: IdentifierStyle::Ansi,
            functions: Some(StandardFunctions),
            warnings: Mutex::new(Vec::new()),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Replace the string quoting rules.
    pub fn with_string_quoting(mut self, quoting: StringQuoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Use a different identifier delimiter.
    pub fn with_identifier_style(mut self, style: IdentifierStyle) -> Self {
        self.identifier_style = style;
        self
    }

    /// Drop the SQL function helpers.
    pub fn without_functions(mut self) -> Self {
        self.functions = None;
        self
    }

    /// Mutable access to the options, for changes between calls.
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Backend for AnsiBackend {
    fn options(&self) -> &Options {
        &self.options
    }

    fn identity(&self) -> &str {
        &self.identity
    }

    fn escape(&self, text: &str, escape_wildcards: bool) -> Result<String> {
        let quoting = self.quoting;
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if c == quoting.end || (c == quoting.escape && quoting.escape != quoting.end) {
                escaped.push(quoting.escape);
            }
            escaped.push(c);
        }
        if escape_wildcards {
            escaped = self.escape_pattern(&escaped);
        }
        Ok(escaped)
    }

    fn escape_pattern(&self, text: &str) -> String {
        let Some(escape) = self.quoting.escape_pattern else {
            return text.to_string();
        };
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if c == escape || PATTERN_WILDCARDS.contains(&c) {
                escaped.push(escape);
            }
            escaped.push(c);
        }
        escaped
    }

    fn quote_identifier(&self, name: &str, check_option: bool) -> String {
        if check_option && !self.options.quote_identifier {
            return name.to_string();
        }
        quote_ident(name, self.identifier_style)
    }

    fn string_quoting(&self) -> StringQuoting {
        self.quoting
    }

    fn functions(&self) -> Option<&dyn SqlFunctions> {
        self.functions.as_ref().map(|f| f as &dyn SqlFunctions)
    }

    fn warn(&self, message: &str) {
        tracing::warn!(connection = %self.identity, "{message}");
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
