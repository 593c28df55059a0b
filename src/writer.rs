use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::result;

use csv_dialect_core::{needs_quotes, quote_field, Dialect, QuoteStyle};
#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::trace;

use crate::error::{new_into_inner_error, IntoInnerError, Result};
#[cfg(feature = "serde")]
use crate::serializer::serialize;

/// Builds a CSV writer with various configuration knobs.
///
/// This builder can be used to set the dialect and the buffer capacity of a
/// CSV writer. Once a CSV `Writer` is built, its configuration cannot be
/// changed.
#[derive(Debug)]
pub struct WriterBuilder {
    dialect: Dialect,
    capacity: usize,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder { dialect: Dialect::default(), capacity: 8 * (1 << 10) }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    ///
    /// To convert a builder into a writer, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_dialect::{DialectBuilder, QuoteStyle, WriterBuilder};
    ///
    /// let dialect = DialectBuilder::new()
    ///     .delimiter('\t')
    ///     .quote_style(QuoteStyle::NonNumeric)
    ///     .build()
    ///     .unwrap();
    /// let mut wtr = WriterBuilder::new().dialect(dialect).from_writer(vec![]);
    /// wtr.write_record(&["Boston", "4628910"]).unwrap();
    ///
    /// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    /// assert_eq!(data, "\"Boston\"\t4628910\n");
    /// ```
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to the
    /// given file path. The file is truncated if it already exists.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Ok(Writer::new(self, File::create(path)?))
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    ///
    /// Note that the CSV writer is buffered automatically, so you should not
    /// wrap `wtr` in a buffered writer like `io::BufWriter`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer::new(self, wtr)
    }

    /// The dialect to use when writing CSV.
    ///
    /// The default is `Dialect::default()`.
    pub fn dialect(&mut self, dialect: Dialect) -> &mut WriterBuilder {
        self.dialect = dialect;
        self
    }

    /// Set the capacity (in bytes) of the internal buffer used in the CSV
    /// writer.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut WriterBuilder {
        self.capacity = capacity;
        self
    }
}

/// A CSV writer.
///
/// This writer writes records to any `io::Write`. Fields are separated by
/// the dialect's delimiter, quoted according to its quote style, and each
/// record is followed by its record terminator.
///
/// The writer is buffered. Writes fail fast: the first I/O error is
/// returned and anything written before it stays written. Buffered data is
/// flushed when the writer is dropped, but errors from that flush are
/// ignored, so call `flush` (or `into_inner`) to observe them.
///
/// # Example
///
/// ```
/// use csv_dialect::Writer;
///
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_record(&["a", "b c", "d,e"]).unwrap();
/// wtr.write_record(&["x", "say \"hi\"", ""]).unwrap();
///
/// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "a,b c,\"d,e\"\nx,\"say \"\"hi\"\"\",\n");
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: Option<io::BufWriter<W>>,
    dialect: Dialect,
    /// The number of fields written in the current record.
    fields: u64,
    /// Whether the current record's output so far is only spaces and tabs.
    blank_line: bool,
    /// Scratch space for quoted fields.
    buf: String,
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.wtr.is_some() {
            let _ = self.flush();
        }
    }
}

impl Writer<File> {
    /// Build a CSV writer with a default configuration that writes data to
    /// the given file path. The file is truncated if it already exists.
    ///
    /// To customize CSV writing, use a `WriterBuilder`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    fn new(builder: &WriterBuilder, wtr: W) -> Writer<W> {
        Writer {
            wtr: Some(io::BufWriter::with_capacity(builder.capacity, wtr)),
            dialect: builder.dialect.clone(),
            fields: 0,
            blank_line: true,
            buf: String::new(),
        }
    }

    /// Build a CSV writer with a default configuration that writes data to
    /// `wtr`.
    ///
    /// To customize CSV writing, use a `WriterBuilder`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single record.
    ///
    /// Each field is separated by the delimiter and quoted when the
    /// dialect's quote style requires it. The record terminator is written
    /// after the last field. A record with no fields is written as a lone
    /// record terminator.
    ///
    /// If a record is only partially written by `write_field`, then this
    /// appends to it.
    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for field in record {
            self.write_field(field)?;
        }
        self.write_terminator()
    }

    /// Write every record in order, then flush.
    ///
    /// This stops at the first error. Records written before the error stay
    /// written.
    pub fn write_all<I, R, T>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for record in records {
            self.write_record(record)?;
        }
        self.flush()?;
        Ok(())
    }

    /// Write a single field.
    ///
    /// One should prefer using `write_record` over this method. It is
    /// provided for cases where writing a field at a time is more
    /// convenient than writing a record at a time.
    ///
    /// Note that if this API is used, `write_terminator` must be called to
    /// end the current record.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_dialect::Writer;
    ///
    /// let mut wtr = Writer::from_writer(vec![]);
    /// wtr.write_field("a")?;
    /// wtr.write_field("b,c")?;
    /// wtr.write_terminator()?;
    ///
    /// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    /// assert_eq!(data, "a,\"b,c\"\n");
    /// # Ok::<(), csv_dialect::Error>(())
    /// ```
    pub fn write_field<T: AsRef<str>>(&mut self, field: T) -> Result<()> {
        let field = field.as_ref();
        let delimiter = self.dialect.delimiter();
        let wtr = self.wtr.as_mut().unwrap();
        if self.fields > 0 {
            wtr.write_all(delimiter.encode_utf8(&mut [0; 4]).as_bytes())?;
            self.blank_line = self.blank_line && is_blank(delimiter);
        }

        let quote = needs_quotes(field, &self.dialect)
            || (self.blank_line && starts_comment(field, &self.dialect));
        let written = if quote {
            self.buf.clear();
            quote_field(field, &self.dialect, &mut self.buf);
            self.buf.as_str()
        } else {
            field
        };
        wtr.write_all(written.as_bytes())?;
        if self.blank_line {
            self.blank_line = written.chars().all(is_blank);
        }
        self.fields += 1;
        Ok(())
    }

    /// Write a record terminator, ending the current record.
    pub fn write_terminator(&mut self) -> Result<()> {
        let wtr = self.wtr.as_mut().unwrap();
        wtr.write_all(self.dialect.terminator().as_bytes())?;
        self.fields = 0;
        self.blank_line = true;
        Ok(())
    }

    /// Serialize a single record using Serde.
    ///
    /// The value is written as one record. Every primitive value (a number,
    /// a string, a bool, etc.) becomes one field. Structs, tuples and
    /// sequences are flattened into consecutive fields. `None` and unit
    /// are written as empty fields.
    ///
    /// Maps and enum variants with fields (tuple or struct variants) are
    /// not supported and produce an `Error::Serialize`.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_dialect::Writer;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Row<'a> {
    ///     city: &'a str,
    ///     latitude: f64,
    ///     population: Option<u64>,
    /// }
    ///
    /// let mut wtr = Writer::from_writer(vec![]);
    /// wtr.serialize(Row { city: "Boston", latitude: 42.36, population: None })?;
    /// wtr.serialize(("Concord", 43.2, 42695))?;
    ///
    /// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    /// assert_eq!(data, "Boston,42.36,\nConcord,43.2,42695\n");
    /// # Ok::<(), csv_dialect::Error>(())
    /// ```
    #[cfg(feature = "serde")]
    pub fn serialize<S: Serialize>(&mut self, record: S) -> Result<()> {
        serialize(self, &record)?;
        self.write_terminator()
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// If there was a problem writing to the underlying writer, then an
    /// error is returned. Flushing an already flushed writer does nothing
    /// and succeeds.
    pub fn flush(&mut self) -> io::Result<()> {
        let wtr = self.wtr.as_mut().unwrap();
        trace!(buffered = wtr.buffer().len(), "flushing CSV writer");
        wtr.flush()
    }

    /// Returns the dialect used by this writer.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.wtr.as_ref().unwrap().get_ref()
    }

    /// Flush the contents of the internal buffer and return the underlying
    /// writer.
    pub fn into_inner(
        mut self,
    ) -> result::Result<W, IntoInnerError<Writer<W>>> {
        match self.flush() {
            Ok(()) => Ok(self.wtr.take().unwrap().into_parts().0),
            Err(err) => Err(new_into_inner_error(self, err)),
        }
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Returns true if `field`, written unquoted at the start of a line (or
/// after blanks only), would be read back as a comment line.
fn starts_comment(field: &str, dialect: &Dialect) -> bool {
    if dialect.quote_style() == QuoteStyle::Never {
        return false;
    }
    match dialect.comment() {
        None => false,
        Some(comment) => {
            field.trim_start_matches(is_blank).starts_with(comment)
        }
    }
}
