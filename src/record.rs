use std::fmt;
use std::iter::FromIterator;
use std::ops::{self, Range};

#[cfg(feature = "serde")]
use serde::de::Deserialize;

#[cfg(feature = "serde")]
use crate::deserializer::deserialize_record;
use crate::error::Result;

/// A position in CSV data.
///
/// A position is used to report errors in CSV data. All positions include
/// the byte offset, line number and record index at which the error
/// occurred.
///
/// Byte offsets and record indices start at `0`. Line numbers start at `1`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    byte: u64,
    line: u64,
    record: u64,
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Position {
    /// Returns a new position initialized to the start value.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, record: 0 }
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`, of this position.
    ///
    /// Lines are counted by `\n` characters, regardless of the record
    /// terminator in use.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The record index, starting with the first record at `0`.
    pub fn record(&self) -> u64 {
        self.record
    }

    /// Set the byte offset of this position.
    pub fn set_byte(&mut self, byte: u64) -> &mut Position {
        self.byte = byte;
        self
    }

    /// Set the line number of this position.
    ///
    /// If the line number is less than `1`, then this method panics.
    pub fn set_line(&mut self, line: u64) -> &mut Position {
        assert!(line > 0);
        self.line = line;
        self
    }

    /// Set the record index of this position.
    pub fn set_record(&mut self, record: u64) -> &mut Position {
        self.record = record;
        self
    }
}

/// A single CSV record: an ordered sequence of string fields.
///
/// Fields are stored contiguously in a single buffer, so reusing a record
/// with [`Reader::read_record`](struct.Reader.html#method.read_record)
/// amortizes allocation.
///
/// Two records are equal if and only if they have the same number of
/// fields and their fields are equal in order. The position a record was
/// read at does not take part in equality.
#[derive(Clone)]
pub struct Record {
    /// All fields in this record, stored contiguously.
    fields: String,
    /// The ending offset of each field in `fields`.
    ends: Vec<usize>,
    /// The position of this record, if it was read from CSV data.
    pos: Option<Position>,
}

impl Default for Record {
    fn default() -> Record {
        Record::new()
    }
}

impl Record {
    /// Create a new empty `Record`.
    pub fn new() -> Record {
        Record::with_capacity(0, 0)
    }

    /// Create a new empty `Record` with room for `buffer` bytes of field
    /// data spread over `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> Record {
        Record {
            fields: String::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
            pos: None,
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.range(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Clear this record so that it has zero fields.
    ///
    /// This also clears the position of the record. The allocated capacity
    /// is kept.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
        self.pos = None;
    }

    /// Add a new field to the end of this record.
    pub fn push_field(&mut self, field: &str) {
        self.fields.push_str(field);
        self.ends.push(self.fields.len());
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> RecordIter {
        RecordIter { rec: self, i: 0 }
    }

    /// Return the position of this record, if available.
    ///
    /// Records read by a `Reader` carry the position of their first byte.
    pub fn position(&self) -> Option<&Position> {
        self.pos.as_ref()
    }

    /// Set the position of this record.
    pub fn set_position(&mut self, pos: Option<Position>) {
        self.pos = pos;
    }

    /// Deserialize this record positionally into a value of type `D`.
    ///
    /// Each field of the record maps to one primitive value, in order.
    /// Structs, tuples and sequences consume consecutive fields. An empty
    /// field deserializes to `None` for `Option` types. A missing trailing
    /// field is an error, even for `Option` types.
    ///
    /// # Example
    ///
    /// ```
    /// use csv_dialect::Record;
    ///
    /// let record = Record::from(vec!["Boston", "42.36", ""]);
    /// let (city, lat, pop): (String, f64, Option<u64>) =
    ///     record.deserialize().unwrap();
    /// assert_eq!(city, "Boston");
    /// assert_eq!(lat, 42.36);
    /// assert_eq!(pop, None);
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<'de, D: Deserialize<'de>>(&'de self) -> Result<D> {
        deserialize_record(self)
    }

    fn range(&self, i: usize) -> Option<Range<usize>> {
        let end = *self.ends.get(i)?;
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        Some(start..end)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Record(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Record) -> bool {
        self.ends == other.ends && self.fields == other.fields
    }
}

impl Eq for Record {}

impl<T: AsRef<str>> PartialEq<[T]> for Record {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<'a, T: AsRef<str>> PartialEq<[T]> for &'a Record {
    fn eq(&self, other: &[T]) -> bool {
        **self == *other
    }
}

impl<T: AsRef<str>> PartialEq<Vec<T>> for Record {
    fn eq(&self, other: &Vec<T>) -> bool {
        *self == other[..]
    }
}

impl<'a, T: AsRef<str>> PartialEq<Vec<T>> for &'a Record {
    fn eq(&self, other: &Vec<T>) -> bool {
        **self == other[..]
    }
}

impl ops::Index<usize> for Record {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "index out of bounds: record has {} fields but index is {}",
                self.len(),
                i
            ),
        }
    }
}

impl<T: AsRef<str>> From<Vec<T>> for Record {
    fn from(fields: Vec<T>) -> Record {
        Record::from_iter(fields)
    }
}

impl<'a, T: AsRef<str>> From<&'a [T]> for Record {
    fn from(fields: &'a [T]) -> Record {
        Record::from_iter(fields)
    }
}

impl<T: AsRef<str>> FromIterator<T> for Record {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Record {
        let mut record = Record::new();
        record.extend(iter);
        record
    }
}

impl<T: AsRef<str>> Extend<T> for Record {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for field in iter {
            self.push_field(field.as_ref());
        }
    }
}

impl<'r> IntoIterator for &'r Record {
    type IntoIter = RecordIter<'r>;
    type Item = &'r str;

    fn into_iter(self) -> RecordIter<'r> {
        self.iter()
    }
}

/// An iterator over the fields in a record.
///
/// The `'r` lifetime refers to the lifetime of the `Record` that is being
/// iterated over.
#[derive(Clone)]
pub struct RecordIter<'r> {
    rec: &'r Record,
    i: usize,
}

impl<'r> Iterator for RecordIter<'r> {
    type Item = &'r str;

    fn next(&mut self) -> Option<&'r str> {
        let field = self.rec.get(self.i)?;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rec.len() - self.i;
        (remaining, Some(remaining))
    }
}

impl<'r> ExactSizeIterator for RecordIter<'r> {}
