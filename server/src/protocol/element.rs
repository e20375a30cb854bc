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

use super::TERMINATOR;
use crate::coredb::Data;

#[derive(Debug, PartialEq, Clone)]
/// A single RESP frame
///
/// The variants map one-to-one onto the five identifier bytes of the wire
/// format. Bulk strings and arrays have a distinguishable null form which is
/// encoded with a length of -1
pub enum Element {
    /// A simple string (`+`); the payload must not contain CR or LF
    SimpleString(Data),
    /// A simple error (`-`); the payload must not contain CR or LF
    SimpleError(Data),
    /// A signed 64-bit integer (`:`)
    Integer(i64),
    /// A bulk string (`$`); `None` is the null bulk string
    BulkString(Option<Data>),
    /// An array (`*`); `None` is the null array. Arrays may nest
    Array(Option<Vec<Element>>),
}

impl Element {
    /// Serialise this element into a fresh buffer
    pub fn serialise(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.serialise_into(&mut buffer);
        buffer
    }
    /// Serialise this element, appending the bytes to the provided buffer
    pub fn serialise_into(&self, buffer: &mut Vec<u8>) {
        match self {
            Element::SimpleString(payload) => {
                buffer.push(b'+');
                buffer.extend_from_slice(payload);
                buffer.extend_from_slice(TERMINATOR);
            }
            Element::SimpleError(payload) => {
                buffer.push(b'-');
                buffer.extend_from_slice(payload);
                buffer.extend_from_slice(TERMINATOR);
            }
            Element::Integer(int) => {
                buffer.push(b':');
                buffer.extend_from_slice(int.to_string().as_bytes());
                buffer.extend_from_slice(TERMINATOR);
            }
            Element::BulkString(None) => buffer.extend_from_slice(b"$-1\r\n"),
            Element::BulkString(Some(payload)) => {
                buffer.push(b'$');
                buffer.extend_from_slice(payload.len().to_string().as_bytes());
                buffer.extend_from_slice(TERMINATOR);
                buffer.extend_from_slice(payload);
                buffer.extend_from_slice(TERMINATOR);
            }
            Element::Array(None) => buffer.extend_from_slice(b"*-1\r\n"),
            Element::Array(Some(elements)) => {
                buffer.push(b'*');
                buffer.extend_from_slice(elements.len().to_string().as_bytes());
                buffer.extend_from_slice(TERMINATOR);
                for element in elements {
                    element.serialise_into(buffer);
                }
            }
        }
    }
}
