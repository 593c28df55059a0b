use std::fs::File;
use std::io;
#[cfg(feature = "serde")]
use std::marker::PhantomData;
use std::path::Path;

use csv_dialect_core::{Dialect, EscapeMode};
#[cfg(feature = "serde")]
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::record::{Position, Record};
use crate::source::RuneSource;

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to set the dialect and the buffer capacity of a
/// CSV reader. Once a CSV `Reader` is built, its configuration cannot be
/// changed.
#[derive(Debug)]
pub struct ReaderBuilder {
    dialect: Dialect,
    capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder { dialect: Dialect::default(), capacity: 8 * (1 << 10) }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_dialect::{DialectBuilder, ReaderBuilder};
    ///
    /// let dialect = DialectBuilder::new()
    ///     .delimiter(';')
    ///     .comment(Some('#'))
    ///     .build()
    ///     .unwrap();
    /// let data = "\
    /// ## cities
    /// Boston;United States;4628910
    /// Concord;United States;42695
    /// ";
    /// let mut rdr = ReaderBuilder::new().dialect(dialect).from_reader(data.as_bytes());
    /// let records = rdr.read_all().unwrap();
    /// assert_eq!(records.len(), 2);
    /// assert_eq!(records[1], vec!["Concord", "United States", "42695"]);
    /// ```
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV reader from this configuration that reads data from the
    /// given file path.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Ok(Reader::new(self, File::open(path)?))
    }

    /// Build a CSV reader from this configuration that reads data from `rdr`.
    ///
    /// Note that the CSV reader is buffered automatically, so you should not
    /// wrap `rdr` in a buffered reader like `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        Reader::new(self, rdr)
    }

    /// The dialect to use when parsing CSV.
    ///
    /// The default is `Dialect::default()`.
    pub fn dialect(&mut self, dialect: Dialect) -> &mut ReaderBuilder {
        self.dialect = dialect;
        self
    }

    /// Set the capacity (in bytes) of the buffer used in the CSV reader.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }
}

/// The outcome of a successful call to `Reader::read_record`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadStatus {
    /// A record was read. More records may follow.
    Record,
    /// The end of the input was reached.
    ///
    /// If the record is not empty, then it holds the last record of the
    /// input, which was not followed by a record terminator. If the record
    /// is empty, then there were no more records to read.
    End,
}

/// A CSV reader.
///
/// This reader scans records from any `io::Read` according to a
/// [`Dialect`](struct.Dialect.html). Each record is an ordered sequence of
/// string fields.
///
/// The grammar, for each record, is:
///
/// * If the dialect has a comment character, lines consisting of optional
///   spaces or tabs, the comment character and arbitrary text are skipped
///   through the next record terminator.
/// * Fields are separated by the delimiter. A field that starts with the
///   quote character is quoted: it ends at the closing quote, and may
///   contain delimiters, terminators and escaped quotes. Any other field
///   ends at the next delimiter, record terminator or the end of input.
/// * After a field, a record terminator ends the record and a delimiter
///   starts the next field. Anything else (e.g., text following a closing
///   quote) ends the record immediately, and the remaining text is scanned
///   as the start of the next record.
///
/// A blank line is a record with one empty field.
///
/// # Example
///
/// ```
/// use csv_dialect::{ReadStatus, Reader, Record};
///
/// let mut rdr = Reader::from_reader("a,b,c\n\"x,y\",z".as_bytes());
/// let mut record = Record::new();
///
/// assert_eq!(rdr.read_record(&mut record).unwrap(), ReadStatus::Record);
/// assert_eq!(record, vec!["a", "b", "c"]);
///
/// assert_eq!(rdr.read_record(&mut record).unwrap(), ReadStatus::End);
/// assert_eq!(record, vec!["x,y", "z"]);
///
/// assert_eq!(rdr.read_record(&mut record).unwrap(), ReadStatus::End);
/// assert!(record.is_empty());
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    src: RuneSource<R>,
    dialect: Dialect,
    /// The record terminator, as characters.
    term: Vec<char>,
    /// Scratch space for the field being scanned.
    field: String,
    /// The index of the next record.
    record: u64,
}

impl Reader<File> {
    /// Create a new CSV reader with the default dialect for the given file
    /// path.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Reader<R> {
    /// Create a new CSV parser with a default configuration for the given
    /// reader.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    fn new(builder: &ReaderBuilder, rdr: R) -> Reader<R> {
        Reader {
            src: RuneSource::new(rdr, builder.capacity),
            term: builder.dialect.terminator().chars().collect(),
            dialect: builder.dialect.clone(),
            field: String::new(),
            record: 0,
        }
    }

    /// Read a single record into the given record.
    ///
    /// The record is cleared first, so it may be reused across calls. On
    /// success, the status says whether the record was ended by a record
    /// terminator or by the end of the input. See
    /// [`ReadStatus`](enum.ReadStatus.html).
    ///
    /// # Errors
    ///
    /// If the input ends inside a quoted field, then an
    /// `Error::UnterminatedQuote` is returned. I/O errors and invalid
    /// UTF-8 are returned as they occur. In all cases, the fields scanned
    /// before the error, including a partial last field, are left in
    /// `record`.
    pub fn read_record(&mut self, record: &mut Record) -> Result<ReadStatus> {
        record.clear();
        let start = self.position();
        if let Err(err) = self.skip_comments() {
            return Err(locate(err, &start));
        }
        match self.src.is_eof() {
            Ok(true) => return Ok(ReadStatus::End),
            Ok(false) => {}
            Err(err) => return Err(locate(err, &start)),
        }
        let pos = self.position();
        record.set_position(Some(pos.clone()));
        let result = self.read_fields(record, &pos);
        self.record += 1;
        result.map_err(|err| locate(err, &pos))
    }

    /// Read all remaining records.
    ///
    /// The end of the input is not an error: a last record without a record
    /// terminator is included. Any other error stops reading and is
    /// returned.
    pub fn read_all(&mut self) -> Result<Vec<Record>> {
        self.records().collect()
    }

    /// Returns a borrowed iterator over all remaining records.
    ///
    /// Each item yielded by this iterator is a `Result<Record, Error>`.
    /// The iterator stops after yielding the first error.
    pub fn records(&mut self) -> RecordsIter<R> {
        RecordsIter { rdr: self, done: false }
    }

    /// Returns an owned iterator over all remaining records.
    ///
    /// This is mostly useful when you want to return a CSV iterator or
    /// store it somewhere.
    pub fn into_records(self) -> RecordsIntoIter<R> {
        RecordsIntoIter { rdr: self, done: false }
    }

    /// Returns a borrowed iterator over deserialized records.
    ///
    /// Each record is deserialized positionally into a `D`. See
    /// [`Record::deserialize`](struct.Record.html#method.deserialize).
    ///
    /// # Example
    ///
    /// ```
    /// use csv_dialect::Reader;
    ///
    /// let data = "Boston,4628910\nConcord,42695\n";
    /// let mut rdr = Reader::from_reader(data.as_bytes());
    /// let rows: Vec<(String, u64)> =
    ///     rdr.deserialize().collect::<csv_dialect::Result<_>>().unwrap();
    /// assert_eq!(rows[1], ("Concord".to_string(), 42695));
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<D: DeserializeOwned>(
        &mut self,
    ) -> DeserializeRecordsIter<R, D> {
        DeserializeRecordsIter { it: self.records(), _priv: PhantomData }
    }

    /// Return the current position of this reader.
    ///
    /// The byte offset and line number point at the next unread character.
    /// The record index is that of the next record to be read.
    pub fn position(&self) -> Position {
        let mut pos = self.src.position().clone();
        pos.set_record(self.record);
        pos
    }

    /// Returns the dialect used by this reader.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.src.get_ref()
    }

    /// Unwraps this CSV reader, returning the underlying reader.
    ///
    /// Note that any leftover data inside this reader's internal buffer is
    /// lost.
    pub fn into_inner(self) -> R {
        self.src.into_inner()
    }

    /// Scan fields into `record` until the record ends.
    fn read_fields(
        &mut self,
        record: &mut Record,
        pos: &Position,
    ) -> Result<ReadStatus> {
        let quote = self.dialect.quote();
        let delimiter = self.dialect.delimiter();
        loop {
            self.field.clear();
            let scanned = match self.src.peek_char() {
                Ok(Some(c)) if c == quote => self.read_quoted_field(pos),
                Ok(_) => self.read_unquoted_field(),
                Err(err) => Err(err),
            };
            record.push_field(&self.field);
            scanned?;

            if self.src.starts_with(&self.term)? {
                self.src.advance(self.term.len());
                return Ok(ReadStatus::Record);
            }
            match self.src.peek_char()? {
                None => return Ok(ReadStatus::End),
                Some(c) if c == delimiter => self.src.advance(1),
                Some(c) => {
                    debug!(
                        record = pos.record(),
                        byte = self.src.position().byte(),
                        "record ended early by {:?} after a quoted field",
                        c
                    );
                    return Ok(ReadStatus::Record);
                }
            }
        }
    }

    /// Scan a quoted field into `self.field`. The next character must be
    /// the opening quote.
    fn read_quoted_field(&mut self, pos: &Position) -> Result<()> {
        let quote = self.dialect.quote();
        let escape = self.dialect.escape();
        let unterminated = || Error::UnterminatedQuote { pos: pos.clone() };

        self.src.advance(1);
        loop {
            let c = match self.src.read_one()? {
                None => return Err(unterminated()),
                Some(c) => c,
            };
            match self.dialect.escape_mode() {
                EscapeMode::DoubleQuote => {
                    if c != quote {
                        self.field.push(c);
                    } else if self.src.peek_char()? == Some(quote) {
                        self.src.advance(1);
                        self.field.push(quote);
                    } else {
                        return Ok(());
                    }
                }
                EscapeMode::EscapeChar => {
                    if c == quote {
                        return Ok(());
                    } else if c != escape {
                        self.field.push(c);
                        continue;
                    }
                    match self.src.peek_char()? {
                        None => return Err(unterminated()),
                        Some(next) if next == quote || next == escape => {
                            self.src.advance(1);
                            self.field.push(next);
                        }
                        // Not an escape sequence, so the escape is data.
                        Some(_) => self.field.push(escape),
                    }
                }
            }
        }
    }

    /// Scan an unquoted field into `self.field`. The delimiter or record
    /// terminator that ends the field is not consumed.
    fn read_unquoted_field(&mut self) -> Result<()> {
        let delimiter = self.dialect.delimiter();
        let term_start = self.term[0];
        loop {
            let c = match self.src.peek_char()? {
                None => return Ok(()),
                Some(c) => c,
            };
            if c == delimiter
                || (c == term_start && self.src.starts_with(&self.term)?)
            {
                return Ok(());
            }
            self.src.advance(1);
            self.field.push(c);
        }
    }

    /// Skip any comment lines at the start of the next record.
    fn skip_comments(&mut self) -> Result<()> {
        let comment = match self.dialect.comment() {
            None => return Ok(()),
            Some(comment) => comment,
        };
        loop {
            let mut n = 0;
            loop {
                match self.src.peek_nth(n)? {
                    Some(' ') | Some('\t') => n += 1,
                    Some(c) if c == comment => break,
                    _ => return Ok(()),
                }
            }
            trace!(line = self.src.position().line(), "skipping comment");
            self.src.advance(n + 1);
            self.skip_line()?;
        }
    }

    /// Discard everything through the next record terminator, or to the end
    /// of the input.
    fn skip_line(&mut self) -> Result<()> {
        loop {
            if self.src.starts_with(&self.term)? {
                self.src.advance(self.term.len());
                return Ok(());
            }
            if self.src.read_one()?.is_none() {
                return Ok(());
            }
        }
    }
}

/// Attach a position to errors that don't carry one yet.
fn locate(err: Error, pos: &Position) -> Error {
    match err {
        Error::Utf8 { pos: None, err } => {
            Error::Utf8 { pos: Some(pos.clone()), err }
        }
        err => err,
    }
}

/// Reads the next record for the record iterators.
fn next_record<R: io::Read>(
    rdr: &mut Reader<R>,
    done: &mut bool,
) -> Option<Result<Record>> {
    if *done {
        return None;
    }
    let mut record = Record::new();
    match rdr.read_record(&mut record) {
        Ok(ReadStatus::Record) => Some(Ok(record)),
        Ok(ReadStatus::End) => {
            *done = true;
            if record.is_empty() {
                None
            } else {
                Some(Ok(record))
            }
        }
        Err(err) => {
            *done = true;
            Some(Err(err))
        }
    }
}

/// A borrowed iterator over records.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// CSV `Reader`.
pub struct RecordsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
    done: bool,
}

impl<'r, R: io::Read> RecordsIter<'r, R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        self.rdr
    }
}

impl<'r, R: io::Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        next_record(self.rdr, &mut self.done)
    }
}

/// An owned iterator over records.
pub struct RecordsIntoIter<R> {
    rdr: Reader<R>,
    done: bool,
}

impl<R: io::Read> RecordsIntoIter<R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RecordsIntoIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        next_record(&mut self.rdr, &mut self.done)
    }
}

/// A borrowed iterator over deserialized records.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying
/// CSV `Reader`. The type parameter `D` is the type being deserialized.
#[cfg(feature = "serde")]
pub struct DeserializeRecordsIter<'r, R: 'r, D> {
    it: RecordsIter<'r, R>,
    _priv: PhantomData<D>,
}

#[cfg(feature = "serde")]
impl<'r, R: io::Read, D: DeserializeOwned> Iterator
    for DeserializeRecordsIter<'r, R, D>
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Result<D>> {
        self.it.next().map(|res| res.and_then(|rec| rec.deserialize()))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use csv_dialect_core::{Dialect, DialectBuilder, EscapeMode};
    use serde::Deserialize;

    use crate::error::Error;
    use crate::record::Record;

    use super::{ReadStatus, Reader, ReaderBuilder};

    fn reader(data: &str, dialect: Dialect) -> Reader<&[u8]> {
        ReaderBuilder::new().dialect(dialect).from_reader(data.as_bytes())
    }

    fn parse(data: &str, dialect: Dialect) -> Vec<Vec<String>> {
        reader(data, dialect)
            .read_all()
            .unwrap()
            .iter()
            .map(|rec| rec.iter().map(|f| f.to_string()).collect())
            .collect()
    }

    macro_rules! parses_to {
        ($name:ident, $data:expr, $expected:expr) => {
            parses_to!($name, $data, $expected, |builder| builder);
        };
        ($name:ident, $data:expr, $expected:expr, $config:expr) => {
            #[test]
            fn $name() {
                let mut builder = DialectBuilder::new();
                $config(&mut builder);
                let got = parse($data, builder.build().unwrap());
                let expected: Vec<Vec<&str>> = $expected;
                assert_eq!(expected, got);
            }
        };
    }

    fn escaped(b: &mut DialectBuilder) -> &mut DialectBuilder {
        b.escape_mode(EscapeMode::EscapeChar)
    }

    parses_to!(one_row_one_field, "a", vec![vec!["a"]]);
    parses_to!(one_row_many_fields, "a,b,c", vec![vec!["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma, "a,b,", vec![vec!["a", "b", ""]]);
    parses_to!(one_row_one_field_lf, "a\n", vec![vec!["a"]]);
    parses_to!(one_row_many_fields_lf, "a,b,c\n", vec![vec!["a", "b", "c"]]);
    parses_to!(one_row_trailing_comma_lf, "a,b,\n", vec![vec!["a", "b", ""]]);
    parses_to!(
        many_rows_many_fields,
        "a,b,c\nx,y,z",
        vec![vec!["a", "b", "c"], vec!["x", "y", "z"]]
    );
    parses_to!(
        many_rows_many_fields_lf,
        "a,b,c\nx,y,z\n",
        vec![vec!["a", "b", "c"], vec!["x", "y", "z"]]
    );
    parses_to!(
        many_rows_trailing_comma,
        "a,b,\nx,y,\n",
        vec![vec!["a", "b", ""], vec!["x", "y", ""]]
    );

    parses_to!(empty, "", vec![]);
    parses_to!(empty_lines, "\n\n", vec![vec![""], vec![""]]);
    parses_to!(
        empty_lines_interspersed,
        "a,b\n\nx,y\n",
        vec![vec!["a", "b"], vec![""], vec!["x", "y"]]
    );
    parses_to!(empty_fields, ",,\n", vec![vec!["", "", ""]]);
    parses_to!(cr_is_data, "a\rb\n", vec![vec!["a\rb"]]);

    parses_to!(
        term_crlf,
        "a,b\r\nc,d\r\n",
        vec![vec!["a", "b"], vec!["c", "d"]],
        |b: &mut DialectBuilder| {
            b.terminator("\r\n");
        }
    );
    parses_to!(
        term_crlf_lone_cr,
        "a\rb\r\nc\r",
        vec![vec!["a\rb"], vec!["c\r"]],
        |b: &mut DialectBuilder| {
            b.terminator("\r\n");
        }
    );
    parses_to!(
        term_weird,
        "a,bzzc,dzz",
        vec![vec!["a", "b"], vec!["c", "d"]],
        |b: &mut DialectBuilder| {
            b.terminator("zz");
        }
    );
    parses_to!(
        term_overlapping_prefix,
        "azzzb",
        vec![vec!["a"], vec!["zb"]],
        |b: &mut DialectBuilder| {
            b.terminator("zz");
        }
    );
    parses_to!(
        ascii_delimited,
        "a\x1fb\x1ec\x1fd",
        vec![vec!["a", "b"], vec!["c", "d"]],
        |b: &mut DialectBuilder| {
            b.ascii();
        }
    );

    parses_to!(quote_empty, "\"\"", vec![vec![""]]);
    parses_to!(quote_lf, "\"\"\n", vec![vec![""]]);
    parses_to!(quote_space, "\" \"", vec![vec![" "]]);
    parses_to!(quote_inner_space, "\" a \"", vec![vec![" a "]]);
    parses_to!(quote_outer_space, "  \"a\"  ", vec![vec!["  \"a\"  "]]);
    parses_to!(
        quote_change,
        "zaz",
        vec![vec!["a"]],
        |b: &mut DialectBuilder| {
            b.quote('z');
        }
    );
    parses_to!(quote_doubled, r#""a""b""#, vec![vec![r#"a"b"#]]);
    parses_to!(
        quote_structural,
        "\"a,b\nc\",d\n",
        vec![vec!["a,b\nc", "d"]]
    );
    parses_to!(quote_no_escapes, r#""a\"b""#, vec![vec![r"a\"], vec![r#"b""#]]);
    parses_to!(
        quote_trailing_content,
        r#""a"b,c"#,
        vec![vec!["a"], vec!["b", "c"]]
    );

    parses_to!(quote_escapes, r#""a\"b""#, vec![vec![r#"a"b"#]], escaped);
    parses_to!(
        quote_escapes_change,
        r#""az"b""#,
        vec![vec![r#"a"b"#]],
        |b: &mut DialectBuilder| {
            b.escape('z').escape_mode(EscapeMode::EscapeChar);
        }
    );
    parses_to!(quote_escaped_escape, r#""a\\b""#, vec![vec![r"a\b"]], escaped);
    parses_to!(quote_escape_literal, r#""a\nb""#, vec![vec![r"a\nb"]], escaped);
    parses_to!(quote_escape_empty, r#""","x""#, vec![vec!["", "x"]], escaped);
    parses_to!(
        quote_escape_no_doubling,
        r#""a""b""#,
        vec![vec!["a"], vec!["b"]],
        escaped
    );
    parses_to!(unquoted_escape_is_data, r"a\,b", vec![vec![r"a\", "b"]], escaped);

    parses_to!(
        delimiter_tabs,
        "a\tb",
        vec![vec!["a", "b"]],
        |b: &mut DialectBuilder| {
            b.delimiter('\t');
        }
    );
    parses_to!(
        delimiter_non_ascii,
        "a¦b¦☃\n",
        vec![vec!["a", "b", "☃"]],
        |b: &mut DialectBuilder| {
            b.delimiter('¦');
        }
    );

    parses_to!(
        rob_pike,
        "\"Rob\",\"Pike\",\nKen,Thompson,ken\n",
        vec![vec!["Rob", "Pike", ""], vec!["Ken", "Thompson", "ken"]]
    );

    fn hash_comments(b: &mut DialectBuilder) -> &mut DialectBuilder {
        b.comment(Some('#'))
    }

    parses_to!(
        comments,
        "#-,-,-\n   #aa\na,b,c\n\t#aa#aaaa\nd,e,f\n",
        vec![vec!["a", "b", "c"], vec!["d", "e", "f"]],
        hash_comments
    );
    parses_to!(comment_inner_space, "# a b, c\nd\n", vec![vec!["d"]], hash_comments);
    parses_to!(comment_in_field, "a,#b\n", vec![vec!["a", "#b"]], hash_comments);
    parses_to!(comment_after_content, "x #y\n", vec![vec!["x #y"]], hash_comments);
    parses_to!(comment_last_line, "a\n#end", vec![vec!["a"]], hash_comments);
    parses_to!(comment_only, "#a\n#b\n", vec![], hash_comments);
    parses_to!(comment_blank_line, "  \n", vec![vec!["  "]], hash_comments);
    parses_to!(comment_disabled, "#a\n", vec![vec!["#a"]]);
    parses_to!(
        comment_crlf,
        "#x\r\na\r\n",
        vec![vec!["a"]],
        |b: &mut DialectBuilder| {
            b.comment(Some('#')).terminator("\r\n");
        }
    );
    parses_to!(
        comment_inside_quoted_field,
        "\"a\n#b\"\n",
        vec![vec!["a\n#b"]],
        hash_comments
    );

    #[test]
    fn read_record_statuses() {
        let mut rdr = reader("a,b\nc", Dialect::default());
        let mut rec = Record::new();

        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::Record);
        assert_eq!(rec, vec!["a", "b"]);
        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::End);
        assert_eq!(rec, vec!["c"]);
        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::End);
        assert!(rec.is_empty());
        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::End);
    }

    #[test]
    fn terminated_then_end() {
        let mut rdr = reader("a\n", Dialect::default());
        let mut rec = Record::new();

        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::Record);
        assert_eq!(rec, vec!["a"]);
        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::End);
        assert!(rec.is_empty());
    }

    #[test]
    fn unterminated_quote_keeps_partial_record() {
        let mut rdr = reader("a,\"bc", Dialect::default());
        let mut rec = Record::new();

        match rdr.read_record(&mut rec) {
            Err(Error::UnterminatedQuote { pos }) => {
                assert_eq!(pos.record(), 0);
                assert_eq!(pos.byte(), 0);
            }
            x => panic!("expected unterminated quote, got {:?}", x),
        }
        assert_eq!(rec, vec!["a", "bc"]);
        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::End);
    }

    #[test]
    fn unterminated_quote_after_escape() {
        let dialect = DialectBuilder::new()
            .escape_mode(EscapeMode::EscapeChar)
            .build()
            .unwrap();
        let mut rdr = reader("\"ab\\", dialect);
        let mut rec = Record::new();
        match rdr.read_record(&mut rec) {
            Err(Error::UnterminatedQuote { .. }) => {}
            x => panic!("expected unterminated quote, got {:?}", x),
        }
        assert_eq!(rec, vec!["ab"]);
    }

    #[test]
    fn unterminated_quote_position() {
        let mut rdr = reader("a\n\"b", Dialect::default());
        let mut rec = Record::new();
        rdr.read_record(&mut rec).unwrap();
        let err = rdr.read_record(&mut rec).unwrap_err();
        let pos = err.position().unwrap();
        assert_eq!(pos.byte(), 2);
        assert_eq!(pos.line(), 2);
        assert_eq!(pos.record(), 1);
    }

    #[test]
    fn read_all_fails_on_unterminated_quote() {
        let mut rdr = reader("a\n\"b\n", Dialect::default());
        match rdr.read_all() {
            Err(Error::UnterminatedQuote { .. }) => {}
            x => panic!("expected unterminated quote, got {:?}", x),
        }
    }

    #[test]
    fn records_stop_after_error() {
        let mut rdr = reader("a\n\"b", Dialect::default());
        let mut it = rdr.records();
        assert_eq!(it.next().unwrap().unwrap(), vec!["a"]);
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());
    }

    #[test]
    fn invalid_utf8_has_position() {
        let mut rdr = Reader::from_reader(&b"a\nb,\xFF\n"[..]);
        let mut rec = Record::new();
        rdr.read_record(&mut rec).unwrap();
        match rdr.read_record(&mut rec) {
            Err(Error::Utf8 { pos: Some(pos), err }) => {
                assert_eq!(pos.record(), 1);
                assert_eq!(pos.line(), 2);
                assert_eq!(err.valid_up_to(), 4);
            }
            x => panic!("expected UTF-8 error, got {:?}", x),
        }
        assert_eq!(rec, vec!["b", ""]);
    }

    /// Yields its data once, then fails every read.
    struct FailAfter<'a> {
        data: &'a [u8],
    }

    impl<'a> io::Read for FailAfter<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "gone"));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn io_error_keeps_partial_record() {
        let mut rdr = Reader::from_reader(FailAfter { data: b"x\na,b" });
        let mut rec = Record::new();
        assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::Record);
        match rdr.read_record(&mut rec) {
            Err(Error::Io(err)) => assert_eq!(err.to_string(), "gone"),
            x => panic!("expected I/O error, got {:?}", x),
        }
        assert_eq!(rec, vec!["a", "b"]);
    }

    #[test]
    fn positions() {
        let mut rdr = reader("a,b\n\"c\nd\"\ne", Dialect::default());
        let mut rec = Record::new();

        rdr.read_record(&mut rec).unwrap();
        assert_eq!(rec.position().unwrap().byte(), 0);
        rdr.read_record(&mut rec).unwrap();
        let pos = rec.position().unwrap().clone();
        assert_eq!((pos.byte(), pos.line(), pos.record()), (4, 2, 1));
        rdr.read_record(&mut rec).unwrap();
        let pos = rec.position().unwrap().clone();
        assert_eq!((pos.byte(), pos.line(), pos.record()), (10, 4, 2));

        let pos = rdr.position();
        assert_eq!((pos.byte(), pos.line(), pos.record()), (11, 4, 3));
    }

    #[test]
    fn into_records() {
        let rdr = reader("a\nb\nc", Dialect::default());
        let got: Vec<_> = rdr.into_records().map(|r| r.unwrap()).collect();
        assert_eq!(got, vec![
            Record::from(vec!["a"]),
            Record::from(vec!["b"]),
            Record::from(vec!["c"]),
        ]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_records() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            city: String,
            pop: Option<u64>,
        }

        let dialect = DialectBuilder::new().delimiter('\t').build().unwrap();
        let mut rdr = reader("Boston\t4628910\nConcord\t\n", dialect);
        let rows: Vec<Row> =
            rdr.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![
            Row { city: "Boston".into(), pop: Some(4628910) },
            Row { city: "Concord".into(), pop: None },
        ]);
    }

    #[test]
    fn small_buffer() {
        let data = "\"a☃\"\"b\",c\r\nd,\"e\r\nf\"\r\n";
        let dialect = DialectBuilder::new().terminator("\r\n").build().unwrap();
        let mut rdr = ReaderBuilder::new()
            .dialect(dialect)
            .buffer_capacity(1)
            .from_reader(data.as_bytes());
        let got = rdr.read_all().unwrap();
        assert_eq!(got[0], vec!["a☃\"b", "c"]);
        assert_eq!(got[1], vec!["d", "e\r\nf"]);
    }
}
