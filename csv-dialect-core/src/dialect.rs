use std::convert::TryFrom;
use std::error;
use std::fmt;

use crate::quoting::{EscapeMode, QuoteStyle};

const DEFAULT_DELIMITER: char = ',';
const DEFAULT_QUOTE: char = '"';
const DEFAULT_ESCAPE: char = '\\';
const DEFAULT_TERMINATOR: &str = "\n";

/// A fully resolved CSV dialect.
///
/// A dialect describes the textual grammar shared by a CSV reader and a
/// CSV writer. Every field has a value: defaults are substituted when the
/// dialect is built from a [`PartialDialect`](struct.PartialDialect.html)
/// or a [`DialectBuilder`](struct.DialectBuilder.html). Once built, a
/// dialect cannot be changed.
///
/// Building a dialect guarantees that:
///
/// * the record terminator is not empty,
/// * the delimiter, quote and comment characters (and the escape character
///   when escaping with it) are pairwise distinct,
/// * none of those characters occurs in the record terminator,
/// * the comment character is not a space or a tab,
/// * with a non-numeric quote style, neither the delimiter, the quote
///   character nor the record terminator uses a digit or `.`, since
///   numeric fields are written unquoted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PartialDialect")
)]
pub struct Dialect {
    delimiter: char,
    quote: char,
    escape: char,
    escape_mode: EscapeMode,
    quote_style: QuoteStyle,
    terminator: String,
    comment: Option<char>,
}

impl Default for Dialect {
    fn default() -> Dialect {
        Dialect {
            delimiter: DEFAULT_DELIMITER,
            quote: DEFAULT_QUOTE,
            escape: DEFAULT_ESCAPE,
            escape_mode: EscapeMode::default(),
            quote_style: QuoteStyle::default(),
            terminator: DEFAULT_TERMINATOR.to_string(),
            comment: None,
        }
    }
}

impl Dialect {
    /// The character that separates fields. The default is `,`.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The character that brackets a quoted field. The default is `"`.
    pub fn quote(&self) -> char {
        self.quote
    }

    /// The escape character. The default is `\`.
    ///
    /// This is only used when the escape mode is `EscapeMode::EscapeChar`.
    pub fn escape(&self) -> char {
        self.escape
    }

    /// How quote characters are escaped inside quoted fields. The default
    /// is `EscapeMode::DoubleQuote`.
    pub fn escape_mode(&self) -> EscapeMode {
        self.escape_mode
    }

    /// When a writer quotes fields. The default is `QuoteStyle::Necessary`.
    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }

    /// The string that ends a record. The default is `\n`.
    ///
    /// This is never empty and may be more than one character, e.g.,
    /// `\r\n`.
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// The comment character, if any. There is no comment character by
    /// default.
    pub fn comment(&self) -> Option<char> {
        self.comment
    }
}

/// A dialect where any field may be left unset.
///
/// This is the configuration surface for dialects. Unset fields are
/// replaced with their defaults by [`resolve`](#method.resolve). With the
/// `serde` feature enabled, a partial dialect can be deserialized from any
/// configuration format, e.g., `{"delimiter": ";", "quote_style":
/// "non_numeric"}`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct PartialDialect {
    /// The field delimiter.
    pub delimiter: Option<char>,
    /// The quote character.
    pub quote: Option<char>,
    /// The escape character.
    pub escape: Option<char>,
    /// The escape mode.
    pub escape_mode: Option<EscapeMode>,
    /// The quote style used by writers.
    pub quote_style: Option<QuoteStyle>,
    /// The record terminator.
    pub terminator: Option<String>,
    /// The comment character.
    pub comment: Option<char>,
}

impl PartialDialect {
    /// Substitute defaults for every unset field and validate the result.
    pub fn resolve(&self) -> Result<Dialect, DialectError> {
        let dialect = Dialect {
            delimiter: self.delimiter.unwrap_or(DEFAULT_DELIMITER),
            quote: self.quote.unwrap_or(DEFAULT_QUOTE),
            escape: self.escape.unwrap_or(DEFAULT_ESCAPE),
            escape_mode: self.escape_mode.unwrap_or_default(),
            quote_style: self.quote_style.unwrap_or_default(),
            terminator: match self.terminator {
                None => DEFAULT_TERMINATOR.to_string(),
                Some(ref term) => term.clone(),
            },
            comment: self.comment,
        };
        validate(&dialect)?;
        Ok(dialect)
    }
}

impl From<Dialect> for PartialDialect {
    fn from(dialect: Dialect) -> PartialDialect {
        PartialDialect {
            delimiter: Some(dialect.delimiter),
            quote: Some(dialect.quote),
            escape: Some(dialect.escape),
            escape_mode: Some(dialect.escape_mode),
            quote_style: Some(dialect.quote_style),
            terminator: Some(dialect.terminator),
            comment: dialect.comment,
        }
    }
}

impl TryFrom<PartialDialect> for Dialect {
    type Error = DialectError;

    fn try_from(partial: PartialDialect) -> Result<Dialect, DialectError> {
        partial.resolve()
    }
}

fn validate(dialect: &Dialect) -> Result<(), DialectError> {
    if dialect.terminator.is_empty() {
        return Err(DialectError::EmptyTerminator);
    }
    let mut specials = vec![
        ("delimiter", dialect.delimiter),
        ("quote", dialect.quote),
    ];
    if let Some(comment) = dialect.comment {
        specials.push(("comment", comment));
    }
    if dialect.escape_mode == EscapeMode::EscapeChar {
        specials.push(("escape", dialect.escape));
    }
    for (i, &(first, a)) in specials.iter().enumerate() {
        for &(second, b) in &specials[i + 1..] {
            if a == b {
                return Err(DialectError::Conflict { first, second, ch: a });
            }
        }
        if dialect.terminator.contains(a) {
            return Err(DialectError::TerminatorConflict { role: first, ch: a });
        }
    }
    if let Some(ch) = dialect.comment.filter(|&c| c == ' ' || c == '\t') {
        return Err(DialectError::BlankComment { ch });
    }
    match dialect.quote_style {
        QuoteStyle::NonNumeric | QuoteStyle::NonNumericNonEmpty => {
            let numeric = |c: char| c.is_ascii_digit() || c == '.';
            let structural = [
                ("delimiter", dialect.delimiter),
                ("quote", dialect.quote),
            ];
            for &(role, ch) in &structural {
                if numeric(ch) {
                    return Err(DialectError::NumericConflict { role, ch });
                }
            }
            if let Some(ch) = dialect.terminator.chars().find(|&c| numeric(c)) {
                return Err(DialectError::NumericConflict {
                    role: "record terminator",
                    ch,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

/// Builds a dialect with various configuration knobs.
///
/// Every knob that isn't set uses its default. The dialect is validated
/// when it is built.
#[derive(Clone, Debug, Default)]
pub struct DialectBuilder {
    partial: PartialDialect,
}

impl DialectBuilder {
    /// Create a new builder.
    pub fn new() -> DialectBuilder {
        DialectBuilder::default()
    }

    /// Create a new builder whose unset knobs come from `partial`.
    pub fn from_partial(partial: PartialDialect) -> DialectBuilder {
        DialectBuilder { partial }
    }

    /// Build a dialect from this configuration.
    pub fn build(&self) -> Result<Dialect, DialectError> {
        self.partial.resolve()
    }

    /// The field delimiter.
    ///
    /// The default is `,`.
    pub fn delimiter(&mut self, delimiter: char) -> &mut DialectBuilder {
        self.partial.delimiter = Some(delimiter);
        self
    }

    /// The quote character.
    ///
    /// The default is `"`.
    pub fn quote(&mut self, quote: char) -> &mut DialectBuilder {
        self.partial.quote = Some(quote);
        self
    }

    /// The escape character.
    ///
    /// This is only used when the escape mode is `EscapeMode::EscapeChar`.
    ///
    /// The default is `\`.
    pub fn escape(&mut self, escape: char) -> &mut DialectBuilder {
        self.partial.escape = Some(escape);
        self
    }

    /// The quote escaping mechanism.
    ///
    /// When set to `EscapeMode::DoubleQuote` (the default), quotes are
    /// escaped by doubling them. e.g., `"` escapes to `""`.
    ///
    /// When set to `EscapeMode::EscapeChar`, quotes are escaped with the
    /// escape character, e.g., `\"`.
    pub fn escape_mode(&mut self, mode: EscapeMode) -> &mut DialectBuilder {
        self.partial.escape_mode = Some(mode);
        self
    }

    /// The quoting style used when writing.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut DialectBuilder {
        self.partial.quote_style = Some(style);
        self
    }

    /// The record terminator.
    ///
    /// The terminator may be any non-empty string. The default is `\n`.
    pub fn terminator<S: Into<String>>(
        &mut self,
        term: S,
    ) -> &mut DialectBuilder {
        self.partial.terminator = Some(term.into());
        self
    }

    /// The comment character.
    ///
    /// When set, lines that start with the comment character (optionally
    /// preceded by spaces or tabs) are skipped when reading. There is no
    /// comment character by default.
    pub fn comment(&mut self, comment: Option<char>) -> &mut DialectBuilder {
        self.partial.comment = comment;
        self
    }

    /// A convenience method for ASCII delimited text.
    ///
    /// This sets the delimiter and record terminator to the ASCII unit
    /// separator (`\x1F`) and record separator (`\x1E`), respectively.
    pub fn ascii(&mut self) -> &mut DialectBuilder {
        self.delimiter('\x1F').terminator("\x1E")
    }
}

/// An error that occurs when a dialect's configuration is invalid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DialectError {
    /// The record terminator is the empty string.
    EmptyTerminator,
    /// Two special characters are the same character.
    Conflict {
        /// The name of the first special character, e.g., `delimiter`.
        first: &'static str,
        /// The name of the second special character, e.g., `quote`.
        second: &'static str,
        /// The character both were set to.
        ch: char,
    },
    /// The record terminator contains a special character.
    TerminatorConflict {
        /// The name of the special character, e.g., `delimiter`.
        role: &'static str,
        /// The special character.
        ch: char,
    },
    /// The comment character is a space or a tab. Leading blanks are
    /// skipped before looking for a comment, so such a comment character
    /// would never be found.
    BlankComment {
        /// The comment character.
        ch: char,
    },
    /// A non-numeric quote style is used with a delimiter, quote character
    /// or record terminator that can occur in a numeric field.
    NumericConflict {
        /// The name of the character's role, e.g., `delimiter`.
        role: &'static str,
        /// The digit or `.`.
        ch: char,
    },
}

impl fmt::Display for DialectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DialectError::EmptyTerminator => {
                write!(f, "invalid dialect: record terminator is empty")
            }
            DialectError::Conflict { first, second, ch } => write!(
                f,
                "invalid dialect: {} and {} are both {:?}",
                first, second, ch
            ),
            DialectError::TerminatorConflict { role, ch } => write!(
                f,
                "invalid dialect: record terminator contains the {} {:?}",
                role, ch
            ),
            DialectError::BlankComment { ch } => write!(
                f,
                "invalid dialect: comment character {:?} is blank",
                ch
            ),
            DialectError::NumericConflict { role, ch } => write!(
                f,
                "invalid dialect: the {} {:?} can occur in unquoted \
                 numeric fields",
                role, ch
            ),
        }
    }
}

impl error::Error for DialectError {}
