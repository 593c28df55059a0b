use std::error;
use std::fmt;
use std::io;
use std::result;

use csv_dialect_core::DialectError;

#[cfg(feature = "serde")]
use crate::deserializer::DeserializeError;
use crate::record::Position;

/// A type alias for `Result<T, csv_dialect::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when processing CSV data.
///
/// This error can happen when writing or reading CSV data.
///
/// Note that reaching the end of the input is never an error. Readers
/// report it through `ReadStatus::End`.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// The CSV data being read is not valid UTF-8.
    Utf8 {
        /// The position of the record in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The corresponding UTF-8 error.
        err: Utf8Error,
    },
    /// The input ended inside a quoted field.
    ///
    /// The fields read before the end of the input, including the
    /// unterminated field, are left in the record being read.
    UnterminatedQuote {
        /// The position of the record containing the unterminated field.
        pos: Position,
    },
    /// A dialect's configuration is invalid.
    Dialect(DialectError),
    /// An error of this kind occurs only when using the Serde serializer.
    #[cfg(feature = "serde")]
    Serialize(String),
    /// An error of this kind occurs only when performing automatic
    /// deserialization with serde.
    #[cfg(feature = "serde")]
    Deserialize {
        /// The position of this error, if available.
        pos: Option<Position>,
        /// The deserialization error.
        err: DeserializeError,
    },
}

impl Error {
    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Return the position for this error, if one exists.
    ///
    /// This is a convenience function that permits callers to easily access
    /// the position on an error without doing case analysis on the error.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Utf8 { ref pos, .. } => pos.as_ref(),
            Error::UnterminatedQuote { ref pos } => Some(pos),
            #[cfg(feature = "serde")]
            Error::Deserialize { ref pos, .. } => pos.as_ref(),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<DialectError> for Error {
    fn from(err: DialectError) -> Error {
        Error::Dialect(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Utf8 { ref err, .. } => Some(err),
            Error::UnterminatedQuote { .. } => None,
            Error::Dialect(ref err) => Some(err),
            #[cfg(feature = "serde")]
            Error::Serialize(_) => None,
            #[cfg(feature = "serde")]
            Error::Deserialize { ref err, .. } => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8 { pos: None, ref err } => {
                write!(f, "CSV parse error: {}", err)
            }
            Error::Utf8 { pos: Some(ref pos), ref err } => write!(
                f,
                "CSV parse error: record {} (line {}, byte {}): {}",
                pos.record(),
                pos.line(),
                pos.byte(),
                err
            ),
            Error::UnterminatedQuote { ref pos } => write!(
                f,
                "CSV parse error: record {} (line {}, byte {}): \
                 input ended inside a quoted field",
                pos.record(),
                pos.line(),
                pos.byte()
            ),
            Error::Dialect(ref err) => err.fmt(f),
            #[cfg(feature = "serde")]
            Error::Serialize(ref err) => {
                write!(f, "CSV write error: {}", err)
            }
            #[cfg(feature = "serde")]
            Error::Deserialize { pos: None, ref err } => {
                write!(f, "CSV deserialize error: {}", err)
            }
            #[cfg(feature = "serde")]
            Error::Deserialize { pos: Some(ref pos), ref err } => write!(
                f,
                "CSV deserialize error: record {} \
                 (line {}, byte {}): {}",
                pos.record(),
                pos.line(),
                pos.byte(),
                err
            ),
        }
    }
}

/// A UTF-8 validation error that occurred while decoding CSV data.
///
/// The error includes the byte offset, relative to the start of the data,
/// of the first byte that is not part of a valid UTF-8 sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    valid_up_to: u64,
}

/// Create a new UTF-8 error.
pub(crate) fn new_utf8_error(valid_up_to: u64) -> Utf8Error {
    Utf8Error { valid_up_to }
}

impl Utf8Error {
    /// The byte offset up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> u64 {
        self.valid_up_to
    }
}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8: invalid UTF-8 sequence at byte {}",
            self.valid_up_to
        )
    }
}

impl error::Error for Utf8Error {}

/// `IntoInnerError` occurs when consuming a `Writer` fails.
///
/// Consuming the `Writer` causes a flush to happen. If the flush fails, then
/// this error is returned, which contains both the original `Writer` and
/// the error that occurred.
///
/// The type parameter `W` is the unconsumed writer.
pub struct IntoInnerError<W> {
    wtr: W,
    err: io::Error,
}

/// Creates a new `IntoInnerError`.
pub(crate) fn new_into_inner_error<W>(
    wtr: W,
    err: io::Error,
) -> IntoInnerError<W> {
    IntoInnerError { wtr, err }
}

impl<W> IntoInnerError<W> {
    /// Returns the error which caused the call to `into_inner` to fail.
    ///
    /// This error was returned when attempting to flush the internal buffer.
    pub fn error(&self) -> &io::Error {
        &self.err
    }

    /// Returns the underlying writer which generated the error.
    ///
    /// The returned value can be used for error recovery, such as
    /// re-inspecting the buffer.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: std::any::Any> error::Error for IntoInnerError<W> {}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.err.fmt(f)
    }
}
