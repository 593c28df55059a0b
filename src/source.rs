/*!
A pull based source of characters with arbitrary lookahead.

The CSV reader needs to test whether the upcoming input is a (possibly
multi-character) record terminator without consuming it when it is not.
`RuneSource` decodes UTF-8 from an underlying reader into a queue of
characters, so callers can peek any number of characters ahead and then
either consume them with `advance` or leave them for the next scan.
*/

use std::collections::VecDeque;
use std::io::{self, BufRead};

use crate::error::{new_utf8_error, Error, Result};
use crate::record::Position;

/// A character source with unbounded lookahead.
///
/// This is the only stateful I/O in the reader: everything that scans
/// fields works on top of `peek`, `advance` and `read_one`.
#[derive(Debug)]
pub struct RuneSource<R> {
    rdr: io::BufReader<R>,
    /// Decoded but not yet consumed characters.
    lookahead: VecDeque<char>,
    /// Whether the underlying reader has reported end of input.
    eof: bool,
    /// The number of bytes decoded from the underlying reader.
    decoded: u64,
    /// The byte offset and line number of the next unconsumed character.
    pos: Position,
}

impl<R: io::Read> RuneSource<R> {
    /// Create a new source that buffers `rdr` with the given capacity.
    pub fn new(rdr: R, capacity: usize) -> RuneSource<R> {
        RuneSource {
            rdr: io::BufReader::with_capacity(capacity, rdr),
            lookahead: VecDeque::new(),
            eof: false,
            decoded: 0,
            pos: Position::new(),
        }
    }

    /// Returns the next `n` characters without consuming them.
    ///
    /// If fewer than `n` characters remain in the input, then all of the
    /// remaining characters are returned. A returned slice shorter than `n`
    /// therefore indicates the end of the input.
    pub fn peek(&mut self, n: usize) -> Result<&[char]> {
        let available = self.fill(n)?;
        Ok(&self.lookahead.make_contiguous()[..available])
    }

    /// Returns the next character without consuming it, or `None` at the
    /// end of the input.
    pub fn peek_char(&mut self) -> Result<Option<char>> {
        self.peek_nth(0)
    }

    /// Returns the character `i` positions ahead (the next character is
    /// at `0`) without consuming anything.
    pub fn peek_nth(&mut self, i: usize) -> Result<Option<char>> {
        if self.fill(i + 1)? <= i {
            return Ok(None);
        }
        Ok(self.lookahead.get(i).copied())
    }

    /// Returns true if and only if the upcoming input is exactly `needle`.
    ///
    /// Nothing is consumed. An empty needle always matches.
    pub fn starts_with(&mut self, needle: &[char]) -> Result<bool> {
        Ok(self.peek(needle.len())? == needle)
    }

    /// Returns true if and only if no characters remain.
    pub fn is_eof(&mut self) -> Result<bool> {
        Ok(self.fill(1)? == 0)
    }

    /// Consume the next `n` characters, which must have been peeked
    /// already.
    ///
    /// If fewer than `n` characters have been peeked, then this panics.
    pub fn advance(&mut self, n: usize) {
        assert!(
            n <= self.lookahead.len(),
            "cannot advance {} characters with only {} peeked",
            n,
            self.lookahead.len()
        );
        for ch in self.lookahead.drain(..n) {
            self.pos.set_byte(self.pos.byte() + ch.len_utf8() as u64);
            if ch == '\n' {
                self.pos.set_line(self.pos.line() + 1);
            }
        }
    }

    /// Consume and return the next character, or `None` at the end of the
    /// input.
    pub fn read_one(&mut self) -> Result<Option<char>> {
        let ch = self.peek_char()?;
        if ch.is_some() {
            self.advance(1);
        }
        Ok(ch)
    }

    /// The byte offset and line number of the next unconsumed character.
    ///
    /// The record index of the returned position is always `0`.
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.rdr.get_ref()
    }

    /// Unwraps this source, returning the underlying reader.
    ///
    /// Any buffered or peeked data is lost.
    pub fn into_inner(self) -> R {
        self.rdr.into_inner()
    }

    /// Decode characters until at least `n` are buffered or the input ends.
    /// Returns the number of buffered characters, up to `n`.
    fn fill(&mut self, n: usize) -> Result<usize> {
        while self.lookahead.len() < n && !self.eof {
            match self.decode()? {
                Some(ch) => self.lookahead.push_back(ch),
                None => self.eof = true,
            }
        }
        Ok(self.lookahead.len().min(n))
    }

    /// Decode the next character from the underlying reader.
    fn decode(&mut self) -> Result<Option<char>> {
        let mut bytes = [0u8; 4];
        let mut len = 0;
        loop {
            let byte = match self.rdr.fill_buf()?.first().copied() {
                Some(byte) => byte,
                None if len == 0 => return Ok(None),
                None => return Err(self.utf8_error()),
            };
            self.rdr.consume(1);
            bytes[len] = byte;
            len += 1;
            match bstr::decode_utf8(&bytes[..len]) {
                (Some(ch), _) => {
                    self.decoded += len as u64;
                    return Ok(Some(ch));
                }
                // A valid but incomplete prefix of a longer sequence.
                (None, n) if n == len && len < utf8_width(bytes[0]) => {}
                (None, _) => return Err(self.utf8_error()),
            }
        }
    }

    fn utf8_error(&self) -> Error {
        Error::Utf8 { pos: None, err: new_utf8_error(self.decoded) }
    }
}

/// The number of bytes in the UTF-8 sequence started by `lead`, or `1` if
/// `lead` cannot start a sequence.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    }
}
