/*
 * Created on Tue Mar 16 2021
 *
 * This file is a part of Spinel
 * Spinel is a free and open-source in-memory key/value database that
 * speaks the RESP wire protocol, written by the Spinel developers with
 * the vision to provide a simple and reliable caching primitive without
 * compromising on performance.
 *
 * Copyright (c) 2021, The Spinel developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! # The RESP protocol
//!
//! This module provides the [`Parser`], which deserializes the five RESP
//! frame variants — simple strings (`+`), simple errors (`-`), integers
//! (`:`), bulk strings (`$`) and arrays (`*`) — from a byte buffer. Frames
//! are terminated by CR-LF; bulk strings and arrays are length-prefixed,
//! which makes the framing independent of the payload. The serialization
//! side lives in [`element::Element`].
//!
//! The parser does not own the buffer: it tracks a cursor into it, and a
//! successful parse reports the number of bytes consumed so that the
//! caller can discard them.

// modules
pub mod element;
pub mod responses;
#[cfg(test)]
mod tests;
// endof modules

use crate::coredb::Data;
use self::element::Element;
use std::vec::IntoIter;

/// The frame terminator: every preamble and simple scalar ends with CR-LF
pub const TERMINATOR: &[u8] = b"\r\n";

const SYM_SIMPLE_STRING: u8 = b'+';
const SYM_SIMPLE_ERROR: u8 = b'-';
const SYM_INTEGER: u8 = b':';
const SYM_BULK_STRING: u8 = b'$';
const SYM_ARRAY: u8 = b'*';

/// The maximum capacity we pre-allocate for a client-declared length
const SIZE_CAP: usize = 1024;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// # Parser Errors
///
/// Several errors can arise during parsing and this enum accounts for them
pub enum ParseError {
    /// The buffer ended before the frame was complete; the stream should be
    /// read again. This is never an error on the wire
    NotEnough,
    /// CR-LF is missing where it was expected
    TerminatorNotFound,
    /// A numeric preamble (array size, bulk string length) failed to parse
    LengthExtraction,
    /// The textual payload of an integer frame failed to parse
    IntegerConversion,
    /// The declared bulk string length does not match the available body
    BulkStringDataSize,
    /// An element starts with an identifier byte the server doesn't know
    UnidentifiedType,
    /// The frame was dispatched to the wrong-type decoder
    InvalidDeserialiser,
    /// The request is not an array of bulk strings, or lacks required parts
    InvalidClientData,
    /// The buffer is empty
    ///
    /// The **parser will never return this**, but instead it is provided for
    /// convenience with [`crate::dbnet`]
    Empty,
}

impl ParseError {
    /// The wire form of this error: a simple error frame describing it
    pub const fn response_bytes(&self) -> &'static [u8] {
        match self {
            Self::LengthExtraction => responses::groups::LENGTH_EXTRACTION_ERR,
            Self::IntegerConversion => responses::groups::INTEGER_CONVERSION_ERR,
            Self::BulkStringDataSize => responses::groups::BULK_DATA_SIZE_ERR,
            Self::UnidentifiedType => responses::groups::UNIDENTIFIED_TYPE_ERR,
            Self::InvalidDeserialiser => responses::groups::INVALID_DESERIALISER_ERR,
            Self::InvalidClientData => responses::groups::INVALID_CLIENT_DATA_ERR,
            // an EOF or a stray byte where a terminator was due
            Self::NotEnough | Self::TerminatorNotFound | Self::Empty => {
                responses::groups::TERMINATOR_NOT_FOUND_ERR
            }
        }
    }
}

/// A generic result to indicate parsing errors through the [`ParseError`] enum
pub type ParseResult<T> = Result<T, ParseError>;

/// # `ActionGroup`
///
/// The `ActionGroup` is a parsed request: the command name followed by its
/// arguments, each of which arrived as a bulk string. It may look like:
/// ```text
/// ["GET", "x"]
/// ```
#[derive(Debug, PartialEq)]
pub struct ActionGroup(Vec<Data>);

impl ActionGroup {
    #[cfg(test)]
    /// Assemble a group directly; only tests get to skip the parser
    pub fn new(parts: Vec<Data>) -> Self {
        ActionGroup(parts)
    }
    /// Returns how many arguments there are, excluding the name of the action
    pub fn howmany(&self) -> usize {
        self.0.len() - 1
    }
    /// The name of the action
    pub fn get_first(&self) -> Option<&Data> {
        self.0.first()
    }
}

impl IntoIterator for ActionGroup {
    type Item = Data;
    type IntoIter = std::iter::Skip<IntoIter<Data>>;
    fn into_iter(self) -> <Self as IntoIterator>::IntoIter {
        self.0.into_iter().skip(1)
    }
}

/// Parse a stream of ASCII digits, with an optional leading `-`, into an
/// [`i64`], checking for overflow. Returns `None` on any stray byte
pub(crate) fn parse_into_i64(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() {
        return None;
    }
    let (negative, digits) = match bytes[0] {
        b'-' => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return None;
    }
    let mut item: i64 = 0;
    for dig in digits {
        if !dig.is_ascii_digit() {
            // dig has to be an ASCII digit
            return None;
        }
        // 48 is the ASCII code for 0, and 57 is the ASCII code for 9
        let curdig = i64::from(dig - 48);
        item = item.checked_mul(10)?.checked_add(curdig)?;
    }
    Some(if negative { -item } else { item })
}

#[derive(Debug)]
/// # The RESP deserializer
///
/// The parser takes a buffer and a cursor into it. Two modes exist:
/// - [`Parser::new`] is the streaming mode used by the connection loop: if
///   the buffer ends before a frame is complete, [`ParseError::NotEnough`]
///   is returned so the caller can read more data and try again
/// - [`Parser::complete`] is used on buffers that are known to hold whole
///   frames (the snapshot file): running out of bytes there is a hard
///   framing error, not a "read more" signal
pub struct Parser<'a> {
    /// the source buffer
    buffer: &'a [u8],
    /// the read cursor, always pointing at the next unread byte
    cursor: usize,
    /// whether the buffer is known to be complete
    complete: bool,
}

impl<'a> Parser<'a> {
    /// Create a new streaming parser
    pub const fn new(buffer: &'a [u8]) -> Self {
        Parser {
            buffer,
            cursor: 0,
            complete: false,
        }
    }
    /// Create a parser over a buffer known to hold whole frames
    pub const fn complete(buffer: &'a [u8]) -> Self {
        Parser {
            buffer,
            cursor: 0,
            complete: true,
        }
    }
    /// Returns the number of bytes consumed so far
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
    /// Returns true if there is nothing left to read
    pub fn exhausted(&self) -> bool {
        self.cursor >= self.buffer.len()
    }
    fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }
    fn incr_cursor_by(&mut self, by: usize) {
        self.cursor += by;
    }
    fn incr_cursor(&mut self) {
        self.incr_cursor_by(1)
    }
    /// The error to return when the buffer ran out mid-line
    const fn short_line_error(&self) -> ParseError {
        if self.complete {
            ParseError::TerminatorNotFound
        } else {
            ParseError::NotEnough
        }
    }
    /// The error to return when the buffer ran out mid-body
    const fn short_body_error(&self) -> ParseError {
        if self.complete {
            ParseError::BulkStringDataSize
        } else {
            ParseError::NotEnough
        }
    }
    /// Look at the identifier byte under the cursor without passing it
    fn peek_symbol(&self) -> ParseResult<u8> {
        if self.exhausted() {
            Err(self.short_line_error())
        } else {
            Ok(self.buffer[self.cursor])
        }
    }
    /// Read exactly `until` bytes, moving the cursor past them
    fn read_until(&mut self, until: usize) -> ParseResult<&'a [u8]> {
        if self.remaining() < until {
            Err(self.short_body_error())
        } else {
            let chunk = &self.buffer[self.cursor..self.cursor + until];
            self.incr_cursor_by(until);
            Ok(chunk)
        }
    }
    /// Read a CR-LF terminated line, placing the cursor past the LF. The
    /// terminator is not part of the returned chunk. A stray CR or LF is a
    /// framing error since neither may appear in a preamble or simple scalar
    fn read_line(&mut self) -> ParseResult<&'a [u8]> {
        let start = self.cursor;
        while self.cursor < self.buffer.len() {
            match self.buffer[self.cursor] {
                b'\r' => {
                    if self.cursor + 1 >= self.buffer.len() {
                        // we have the CR but not the LF
                        return Err(self.short_line_error());
                    }
                    if self.buffer[self.cursor + 1] != b'\n' {
                        return Err(ParseError::TerminatorNotFound);
                    }
                    let line = &self.buffer[start..self.cursor];
                    self.incr_cursor_by(2);
                    return Ok(line);
                }
                b'\n' => return Err(ParseError::TerminatorNotFound),
                _ => self.incr_cursor(),
            }
        }
        Err(self.short_line_error())
    }
    /// Read the CR-LF that terminates a bulk string body
    fn read_terminator(&mut self) -> ParseResult<()> {
        if self.remaining() < TERMINATOR.len() {
            return Err(self.short_line_error());
        }
        if &self.buffer[self.cursor..self.cursor + TERMINATOR.len()] == TERMINATOR {
            self.incr_cursor_by(TERMINATOR.len());
            Ok(())
        } else {
            Err(ParseError::TerminatorNotFound)
        }
    }
}

impl<'a> Parser<'a> {
    /// Parse the next element, with the cursor at its identifier byte.
    /// Arrays are parsed recursively
    pub fn parse_next_element(&mut self) -> ParseResult<Element> {
        let tsymbol = self.peek_symbol()?;
        self.incr_cursor();
        match tsymbol {
            SYM_SIMPLE_STRING => Ok(Element::SimpleString(Data::copy_from_slice(
                self.read_line()?,
            ))),
            SYM_SIMPLE_ERROR => Ok(Element::SimpleError(Data::copy_from_slice(
                self.read_line()?,
            ))),
            SYM_INTEGER => {
                let line = self.read_line()?;
                match parse_into_i64(line) {
                    Some(int) => Ok(Element::Integer(int)),
                    None => Err(ParseError::IntegerConversion),
                }
            }
            SYM_BULK_STRING => Ok(Element::BulkString(self.parse_bulk_body()?)),
            SYM_ARRAY => self.parse_array_body(),
            _ => Err(ParseError::UnidentifiedType),
        }
    }
    /// Parse a bulk string body, with the cursor past the `$`. A declared
    /// length of -1 is the null bulk string
    fn parse_bulk_body(&mut self) -> ParseResult<Option<Data>> {
        let sizeline = self.read_line()?;
        let size = match parse_into_i64(sizeline) {
            Some(size) => size,
            None => return Err(ParseError::LengthExtraction),
        };
        if size == -1 {
            return Ok(None);
        }
        if size < 0 {
            return Err(ParseError::LengthExtraction);
        }
        let body = self.read_until(size as usize)?;
        self.read_terminator()?;
        Ok(Some(Data::copy_from_slice(body)))
    }
    /// Parse an array body, with the cursor past the `*`. A declared length
    /// of -1 is the null array
    fn parse_array_body(&mut self) -> ParseResult<Element> {
        let sizeline = self.read_line()?;
        let size = match parse_into_i64(sizeline) {
            Some(size) => size,
            None => return Err(ParseError::LengthExtraction),
        };
        if size == -1 {
            return Ok(Element::Array(None));
        }
        if size < 0 {
            return Err(ParseError::LengthExtraction);
        }
        let size = size as usize;
        let mut elements = Vec::with_capacity(size.min(SIZE_CAP));
        for _ in 0..size {
            elements.push(self.parse_next_element()?);
        }
        Ok(Element::Array(Some(elements)))
    }
}

impl<'a> Parser<'a> {
    /// Parse the next frame, requiring it to be a simple string. Anything
    /// else is an [`ParseError::InvalidDeserialiser`] failure
    pub fn parse_next_simple_string(&mut self) -> ParseResult<Data> {
        if self.peek_symbol()? != SYM_SIMPLE_STRING {
            return Err(ParseError::InvalidDeserialiser);
        }
        self.incr_cursor();
        Ok(Data::copy_from_slice(self.read_line()?))
    }
    /// Parse the next frame, requiring it to be a bulk string
    pub fn parse_next_bulk_string(&mut self) -> ParseResult<Option<Data>> {
        if self.peek_symbol()? != SYM_BULK_STRING {
            return Err(ParseError::InvalidDeserialiser);
        }
        self.incr_cursor();
        self.parse_bulk_body()
    }
    /// Parse the next frame, requiring it to be a non-null array whose
    /// elements are all non-null bulk strings
    pub fn parse_next_bulk_array(&mut self) -> ParseResult<Vec<Data>> {
        if self.peek_symbol()? != SYM_ARRAY {
            return Err(ParseError::InvalidDeserialiser);
        }
        self.incr_cursor();
        let sizeline = self.read_line()?;
        let size = match parse_into_i64(sizeline) {
            Some(size) if size >= 0 => size as usize,
            _ => return Err(ParseError::LengthExtraction),
        };
        let mut elements = Vec::with_capacity(size.min(SIZE_CAP));
        for _ in 0..size {
            match self.parse_next_bulk_string()? {
                Some(element) => elements.push(element),
                None => return Err(ParseError::InvalidDeserialiser),
            }
        }
        Ok(elements)
    }
}

impl<'a> Parser<'a> {
    /// Try to parse one request from the buffer: an array of bulk strings,
    /// the first of which is the action name. On success, returns the
    /// [`ActionGroup`] and the number of bytes that the caller should
    /// discard from the buffer, as they have been read
    pub fn parse_query(mut self) -> ParseResult<(ActionGroup, usize)> {
        if self.buffer.is_empty() {
            return Err(ParseError::Empty);
        }
        if self.peek_symbol()? != SYM_ARRAY {
            return Err(ParseError::InvalidClientData);
        }
        self.incr_cursor();
        let sizeline = self.read_line()?;
        let size = match parse_into_i64(sizeline) {
            Some(size) => size,
            None => return Err(ParseError::LengthExtraction),
        };
        if size <= 0 {
            // a request with no action name is nonsense
            return Err(ParseError::InvalidClientData);
        }
        let size = size as usize;
        let mut group = Vec::with_capacity(size.min(SIZE_CAP));
        for _ in 0..size {
            if self.peek_symbol()? != SYM_BULK_STRING {
                return Err(ParseError::InvalidClientData);
            }
            self.incr_cursor();
            match self.parse_bulk_body()? {
                Some(part) => group.push(part),
                // a null bulk string can't name an action or an argument
                None => return Err(ParseError::InvalidClientData),
            }
        }
        Ok((ActionGroup(group), self.consumed()))
    }
}
