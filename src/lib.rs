/*!
`csv-dialect` reads and writes CSV data according to a configurable
[`Dialect`](struct.Dialect.html).

A dialect names the field delimiter, the quote character, how quote
characters are escaped inside quoted fields (by doubling them or with an
escape character), when the writer quotes fields, the record terminator
(which may span several characters, like `\r\n`) and an optional comment
character. The same dialect drives both the [`Reader`](struct.Reader.html)
and the [`Writer`](struct.Writer.html), so anything written with a dialect
reads back to the same records.

# Example

```
use csv_dialect::{DialectBuilder, EscapeMode, ReaderBuilder, WriterBuilder};

let dialect = DialectBuilder::new()
    .delimiter(';')
    .escape_mode(EscapeMode::EscapeChar)
    .terminator("\r\n")
    .build()?;

let mut wtr = WriterBuilder::new().dialect(dialect.clone()).from_writer(vec![]);
wtr.write_record(&["a", "say \"hi\"", "x;y"])?;
let data = wtr.into_inner().unwrap();
assert_eq!(data, b"a;\"say \\\"hi\\\"\";\"x;y\"\r\n");

let mut rdr = ReaderBuilder::new().dialect(dialect).from_reader(&data[..]);
let records = rdr.read_all()?;
assert_eq!(records, vec![vec!["a", "say \"hi\"", "x;y"]]);
# Ok::<(), Box<dyn std::error::Error>>(())
```

# Logging

Readers and writers emit [`tracing`](https://docs.rs/tracing) events: a
`trace` event for every skipped comment line and every flush, and a `debug`
event when unexpected content after a closing quote ends a record early.
No subscriber is installed by this crate.
*/

#![deny(missing_docs)]

pub use csv_dialect_core::{
    is_numeric, needs_quotes, quote_field, Dialect, DialectBuilder,
    DialectError, EscapeMode, PartialDialect, QuoteStyle,
};

#[cfg(feature = "serde")]
pub use crate::deserializer::{DeserializeError, DeserializeErrorKind};
pub use crate::error::{Error, IntoInnerError, Result, Utf8Error};
#[cfg(feature = "serde")]
pub use crate::reader::DeserializeRecordsIter;
pub use crate::reader::{
    ReadStatus, Reader, ReaderBuilder, RecordsIntoIter, RecordsIter,
};
pub use crate::record::{Position, Record, RecordIter};
pub use crate::source::RuneSource;
pub use crate::writer::{Writer, WriterBuilder};

#[cfg(feature = "serde")]
mod deserializer;
mod error;
mod reader;
mod record;
#[cfg(feature = "serde")]
mod serializer;
pub mod source;
mod writer;
