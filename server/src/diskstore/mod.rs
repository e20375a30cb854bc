/*
 * Created on Fri Apr 09 2021
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

//! This module provides tools for handling persistently stored data
//!
//! The snapshot is a plain concatenation of wire frames, four per mapping
//! and in a fixed order: the key as a simple string, the expiration instant
//! as a simple string (decimal milliseconds since the epoch, `0` meaning
//! "never"), the variant tag (`string` or `list`) as a simple string, and
//! the value itself as a bulk string or an array of bulk strings in
//! head-to-tail order. End-of-file is end-of-dump; there is no outer
//! framing and no version header.
//!
//! Keys travel as simple strings, so a key containing CR or LF cannot
//! round-trip through a snapshot. That is a known restriction of the
//! format; switching keys to bulk strings is a format revision.

use crate::coredb::list::List;
use crate::coredb::{Coretable, Data, Record, Value};
use crate::protocol::element::Element;
use crate::protocol::{parse_into_i64, ParseError, Parser};
use libspinel::TResult;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    /// The default save file
    pub static ref PERSIST_FILE: PathBuf = PathBuf::from("./data.spinel");
}

/// Try to get the saved data from disk. This returns `None` if the file
/// wasn't found; any other I/O failure or a corrupted dump is an error
pub fn get_saved(location: &Path) -> TResult<Option<HashMap<Data, Record>>> {
    let file = match fs::read(location) {
        Ok(f) => f,
        Err(e) => match e.kind() {
            ErrorKind::NotFound => return Ok(None),
            _ => return Err(format!("Couldn't read snapshot from disk: {}", e).into()),
        },
    };
    let parsed = deserialize(&file)
        .map_err(|e| format!("The snapshot file is corrupted ({:?})", e))?;
    Ok(Some(parsed))
}

/// Flush the in-memory table to the provided file
///
/// The dump is first written to a file with a trailing underscore appended
/// to its name and then renamed over the target, so a failed write never
/// destroys the previous save
pub fn write_to_disk(file: &Path, data: &Coretable) -> TResult<()> {
    let encoded = serialize(data);
    let mut tmp_name = file.as_os_str().to_owned();
    tmp_name.push("_");
    let tmp = PathBuf::from(tmp_name);
    let mut fle = fs::File::create(&tmp)?;
    fle.write_all(&encoded)?;
    fle.sync_all()?;
    fs::rename(&tmp, file)?;
    Ok(())
}

/// Serialise every mapping into the four-frame record format
fn serialize(data: &Coretable) -> Vec<u8> {
    let mut buffer = Vec::new();
    data.for_each(|key, record| {
        Element::SimpleString(key.clone()).serialise_into(&mut buffer);
        Element::SimpleString(Data::from_string(record.expires_at().to_string()))
            .serialise_into(&mut buffer);
        Element::SimpleString(Data::copy_from_slice(
            record.get_value().type_tag().as_bytes(),
        ))
        .serialise_into(&mut buffer);
        match record.get_value() {
            Value::Str(payload) => {
                Element::BulkString(Some(payload.clone())).serialise_into(&mut buffer)
            }
            Value::List(list) => Element::Array(Some(
                list.iter()
                    .map(|element| Element::BulkString(Some(element.clone())))
                    .collect(),
            ))
            .serialise_into(&mut buffer),
        }
    });
    buffer
}

/// Rehydrate a dump, reading records until the buffer is exhausted. A list
/// is reconstructed by tail-pushing each decoded element in read order
fn deserialize(buffer: &[u8]) -> Result<HashMap<Data, Record>, ParseError> {
    let mut parser = Parser::complete(buffer);
    let mut map = HashMap::new();
    while !parser.exhausted() {
        let key = parser.parse_next_simple_string()?;
        let expiry_text = parser.parse_next_simple_string()?;
        let expires_at = match parse_into_i64(&expiry_text) {
            Some(instant) => instant,
            None => return Err(ParseError::IntegerConversion),
        };
        let tag = parser.parse_next_simple_string()?;
        let value = match &tag[..] {
            b"string" => match parser.parse_next_bulk_string()? {
                Some(payload) => Value::Str(payload),
                // a null value can't be stored, so it can't be restored
                None => return Err(ParseError::InvalidDeserialiser),
            },
            b"list" => {
                let elements = parser.parse_next_bulk_array()?;
                let mut list = List::new();
                list.tail_push(elements);
                Value::List(list)
            }
            _ => return Err(ParseError::InvalidDeserialiser),
        };
        map.insert(key, Record::new(value, expires_at));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn sample_table() -> Coretable {
        let mut table = Coretable::new();
        table.set(
            Data::from_string("name".to_owned()),
            Record::new(Value::Str(Data::from_string("spinel".to_owned())), 0),
        );
        table.set(
            Data::from_string("session".to_owned()),
            Record::new(
                Value::Str(Data::from_string("xyz".to_owned())),
                4102444800000,
            ),
        );
        let mut list = List::new();
        list.tail_push(vec![
            Data::from_string("a".to_owned()),
            Data::from_string("b".to_owned()),
            Data::from_string("c".to_owned()),
        ]);
        table.set(
            Data::from_string("things".to_owned()),
            Record::new(Value::List(list), 0),
        );
        table
    }

    #[test]
    fn test_serialize_deserialize_round_trip() {
        let table = sample_table();
        let encoded = serialize(&table);
        let decoded = deserialize(&encoded).unwrap();
        assert_eq!(decoded.len(), 3);
        let mut expected = HashMap::new();
        table.for_each(|key, record| {
            expected.insert(key.clone(), record.clone());
        });
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_truncated_record_is_rejected() {
        // end-of-file on a *record boundary* simply ends the dump, so the
        // truncation has to land inside a record to be detectable
        let mut table = Coretable::new();
        table.set(
            Data::from_string("k".to_owned()),
            Record::new(Value::Str(Data::from_string("value".to_owned())), 1000),
        );
        let encoded = serialize(&table);
        for upto in 1..encoded.len() {
            assert!(
                deserialize(&encoded[..upto]).is_err(),
                "a record cut at {} should not parse",
                upto
            );
        }
    }

    #[test]
    fn test_garbage_expiry_is_rejected() {
        let mut buffer = Vec::new();
        Element::SimpleString(Data::from_string("k".to_owned())).serialise_into(&mut buffer);
        Element::SimpleString(Data::from_string("soon".to_owned())).serialise_into(&mut buffer);
        Element::SimpleString(Data::from_string("string".to_owned())).serialise_into(&mut buffer);
        Element::BulkString(Some(Data::from_string("v".to_owned()))).serialise_into(&mut buffer);
        assert_eq!(
            deserialize(&buffer).unwrap_err(),
            ParseError::IntegerConversion
        );
    }

    #[test]
    fn test_unknown_variant_tag_is_rejected() {
        let mut buffer = Vec::new();
        Element::SimpleString(Data::from_string("k".to_owned())).serialise_into(&mut buffer);
        Element::SimpleString(Data::from_string("0".to_owned())).serialise_into(&mut buffer);
        Element::SimpleString(Data::from_string("hyperloglog".to_owned()))
            .serialise_into(&mut buffer);
        Element::BulkString(Some(Data::from_string("v".to_owned()))).serialise_into(&mut buffer);
        assert_eq!(
            deserialize(&buffer).unwrap_err(),
            ParseError::InvalidDeserialiser
        );
    }

    #[test]
    fn test_write_then_restore_from_disk() {
        let location = env::temp_dir().join("spinel-diskstore-test.spinel");
        let table = sample_table();
        write_to_disk(&location, &table).unwrap();
        let restored = get_saved(&location).unwrap().unwrap();
        let mut expected = HashMap::new();
        table.for_each(|key, record| {
            expected.insert(key.clone(), record.clone());
        });
        assert_eq!(restored, expected);
        fs::remove_file(&location).unwrap();
    }

    #[test]
    fn test_get_saved_is_none_for_a_missing_file() {
        let location = env::temp_dir().join("spinel-diskstore-does-not-exist.spinel");
        assert!(get_saved(&location).unwrap().is_none());
    }
}
