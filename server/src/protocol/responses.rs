/*
 * Created on Wed Mar 17 2021
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

//! Primitives for generating RESP compatible responses

pub mod groups {
    #![allow(unused)]
    //! # Pre-compiled responses
    //! These are pre-compiled **complete** frames which can be written off
    //! directly to the stream
    /// The `PONG` simple string
    pub const PONG: &[u8] = "+PONG\r\n".as_bytes();
    /// The `OK` simple string
    pub const OKAY: &[u8] = "+OK\r\n".as_bytes();
    /// The null bulk string
    pub const NIL: &[u8] = "$-1\r\n".as_bytes();
    /// The empty array
    pub const EMPTY_ARRAY: &[u8] = "*0\r\n".as_bytes();
    /// An operation was run against a key holding the other variant
    pub const WRONGTYPE_ERR: &[u8] =
        "-operation against a key holding the wrong kind of value\r\n".as_bytes();
    /// A numeric operation was run against a list
    pub const NOT_NUMERIC_ERR: &[u8] = "-value is not of numeric type\r\n".as_bytes();
    /// The stored text could not be parsed as an integer
    pub const INTEGER_CONVERSION_ERR: &[u8] = "-failed to extract integer\r\n".as_bytes();
    /// An illegal combination of command options
    pub const SYNTAX_ERR: &[u8] = "-invalid syntax\r\n".as_bytes();
    /// The request is malformed, or an argument is missing
    pub const INVALID_CLIENT_DATA_ERR: &[u8] = "-invalid client data\r\n".as_bytes();
    /// CR-LF was missing where it was expected
    pub const TERMINATOR_NOT_FOUND_ERR: &[u8] = "-terminator not found\r\n".as_bytes();
    /// A numeric preamble failed to parse
    pub const LENGTH_EXTRACTION_ERR: &[u8] = "-failed to extract length\r\n".as_bytes();
    /// A bulk string body didn't match its declared length
    pub const BULK_DATA_SIZE_ERR: &[u8] = "-bulk string size mismatch\r\n".as_bytes();
    /// An unknown identifier byte
    pub const UNIDENTIFIED_TYPE_ERR: &[u8] = "-unidentified data type\r\n".as_bytes();
    /// A frame was dispatched to the wrong-type decoder
    pub const INVALID_DESERIALISER_ERR: &[u8] =
        "-data passed doesn't match deserialiser data type\r\n".as_bytes();
    /// The command name was not recognised
    pub const UNKNOWN_COMMAND_ERR: &[u8] = "-unknown command\r\n".as_bytes();
    /// `SAVE` could not create or write the snapshot file
    pub const SNAPSHOT_IO_ERR: &[u8] = "-snapshot I/O error\r\n".as_bytes();
}
