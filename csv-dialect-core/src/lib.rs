/*!
`csv-dialect-core` provides the I/O free half of a configurable CSV codec:
the [`Dialect`](struct.Dialect.html) that describes a CSV grammar and the
quoting policy shared by readers and writers.

A dialect names the field delimiter, the quote character, how a quote
character is escaped inside a quoted field, when a writer must quote a
field, the record terminator and an optional comment character. Dialects
are built from a [`PartialDialect`](struct.PartialDialect.html) (or the
[`DialectBuilder`](struct.DialectBuilder.html)), which substitutes defaults
for every unset field and validates the result. Once built, a dialect is
immutable and may be shared freely.

# Example

```
use csv_dialect_core::{needs_quotes, DialectBuilder, QuoteStyle};

let dialect = DialectBuilder::new()
    .delimiter(';')
    .quote_style(QuoteStyle::NonNumeric)
    .build()
    .unwrap();

assert!(needs_quotes("abc", &dialect));
assert!(!needs_quotes("123", &dialect));
```

The default dialect matches common CSV conventions: `,` delimiter, `"`
quote, doubled quotes, minimal quoting and a `\n` terminator.
*/

#![deny(missing_docs)]

pub use crate::dialect::{Dialect, DialectBuilder, DialectError, PartialDialect};
pub use crate::quoting::{
    is_numeric, needs_quotes, quote_field, EscapeMode, QuoteStyle,
};

mod dialect;
mod quoting;
