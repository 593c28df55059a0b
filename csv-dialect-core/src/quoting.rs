use crate::dialect::Dialect;

/// The quoting style to use when writing CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, the delimiter or the
    /// record terminator.
    ///
    /// This is the default.
    Necessary,
    /// This puts quotes around every field that is not numeric.
    ///
    /// Empty fields are not numeric, so they are quoted.
    NonNumeric,
    /// This puts quotes around every field that is neither numeric nor
    /// empty.
    NonNumericNonEmpty,
    /// This *never* writes quotes.
    ///
    /// Fields are written verbatim, even when they contain the delimiter or
    /// the record terminator. Use with care: the output may be ambiguous.
    Never,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// How a quote character is represented inside a quoted field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum EscapeMode {
    /// Quotes are escaped by doubling them. e.g., `"` escapes to `""`.
    ///
    /// The escape character has no meaning in this mode.
    ///
    /// This is the default.
    DoubleQuote,
    /// Quotes (and the escape character itself) are escaped by prefixing
    /// them with the escape character. e.g., `"` escapes to `\"`.
    EscapeChar,
}

impl Default for EscapeMode {
    fn default() -> EscapeMode {
        EscapeMode::DoubleQuote
    }
}

/// Returns true if and only if the field given must be quoted when written
/// with the dialect given.
///
/// The decision depends only on the dialect's quote style:
///
/// * `Never` never quotes and `Always` always quotes.
/// * `Necessary` quotes iff the field contains the record terminator, the
///   delimiter or the quote character, or if the record terminator written
///   after the field would be found starting inside the field (e.g., the
///   field `a;` followed by the terminator `;;`).
/// * `NonNumeric` quotes iff the field is not numeric (see
///   [`is_numeric`](fn.is_numeric.html)).
/// * `NonNumericNonEmpty` quotes iff the field is neither numeric nor
///   empty.
pub fn needs_quotes(field: &str, dialect: &Dialect) -> bool {
    match dialect.quote_style() {
        QuoteStyle::Never => false,
        QuoteStyle::Always => true,
        QuoteStyle::NonNumeric => !is_numeric(field),
        QuoteStyle::NonNumericNonEmpty => {
            !(is_numeric(field) || field.is_empty())
        }
        QuoteStyle::Necessary => {
            contains_char(field, dialect.delimiter())
                || contains_char(field, dialect.quote())
                || contains_str(field, dialect.terminator())
                || terminator_overlaps(field, dialect.terminator())
        }
    }
}

/// Returns true if and only if the field is numeric.
///
/// A numeric field is non-empty, consists of ASCII decimal digits and at
/// most one `.`, and contains at least one digit. So `12`, `1.5` and `.5`
/// are numeric while ``, `.`, `1.2.3` and `-1` are not.
pub fn is_numeric(field: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for b in field.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Appends the quoted form of `field` to `out`.
///
/// The opening and closing quote characters are always written. Every
/// quote character inside the field is escaped according to the dialect's
/// escape mode. In `EscapeChar` mode, the escape character is escaped too.
/// All other characters are copied verbatim.
pub fn quote_field(field: &str, dialect: &Dialect, out: &mut String) {
    let quote = dialect.quote();
    out.reserve(field.len() + 2);
    out.push(quote);
    match dialect.escape_mode() {
        EscapeMode::DoubleQuote => {
            for c in field.chars() {
                if c == quote {
                    out.push(quote);
                }
                out.push(c);
            }
        }
        EscapeMode::EscapeChar => {
            let escape = dialect.escape();
            for c in field.chars() {
                if c == quote || c == escape {
                    out.push(escape);
                }
                out.push(c);
            }
        }
    }
    out.push(quote);
}

fn contains_char(haystack: &str, needle: char) -> bool {
    if needle.is_ascii() {
        // An ASCII byte in valid UTF-8 always encodes that ASCII character.
        memchr::memchr(needle as u8, haystack.as_bytes()).is_some()
    } else {
        haystack.contains(needle)
    }
}

fn contains_str(haystack: &str, needle: &str) -> bool {
    memchr::memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}

/// Returns true if `field` followed by `term` contains `term` at an offset
/// inside `field`. This only happens for terminators with a proper prefix
/// that is also a suffix, like `;;`.
fn terminator_overlaps(field: &str, term: &str) -> bool {
    let (field, term) = (field.as_bytes(), term.as_bytes());
    (1..term.len()).any(|k| {
        field.ends_with(&term[..k]) && term[..term.len() - k] == term[k..]
    })
}
