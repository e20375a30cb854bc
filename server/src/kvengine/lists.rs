/*
 * Created on Tue Apr 06 2021
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

//! # List queries
//! This module provides functions to work with the list actions `LPUSH`,
//! `RPUSH` and `LRANGE`. A push against an absent key creates the list;
//! a push or a range against a string key is a wrong-type error

use crate::coredb::list::List;
use crate::coredb::{CoreDB, Data, Record, Value};
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionError, ActionResult};
use crate::protocol::parse_into_i64;
use crate::protocol::responses;
use crate::protocol::ActionGroup;
use crate::resp::writer::BulkArrayWriter;
use crate::util::Unwrappable;

/// Run an `LPUSH` query
pub async fn lpush<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    push(handle, con, act, true).await
}

/// Run an `RPUSH` query
pub async fn rpush<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    push(handle, con, act, false).await
}

/// Insert the provided elements at the head or the tail of the list stored
/// against the key, creating it if needed, and reply with the new length
async fn push<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
    at_head: bool,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len >= 2)?;
    let mut parts = act.into_iter();
    let key = unsafe {
        // UNSAFE(@spinel): This is completely safe as we've already checked
        // that there are at least 2 arguments
        parts.next().unsafe_unwrap()
    };
    let new_len: usize = {
        let mut table = handle.acquire_table();
        match table.get_mut(&key) {
            Some(record) => match record.get_value_mut() {
                Value::List(list) => {
                    if at_head {
                        list.head_push(parts);
                    } else {
                        list.tail_push(parts);
                    }
                    list.len()
                }
                Value::Str(_) => {
                    return Err(ActionError::ActionError(responses::groups::WRONGTYPE_ERR))
                }
            },
            None => {
                let mut list = List::new();
                if at_head {
                    list.head_push(parts);
                } else {
                    list.tail_push(parts);
                }
                let len = list.len();
                table.set(key, Record::new(Value::List(list), 0));
                len
            }
        }
    };
    conwrite!(con, new_len)?;
    Ok(())
}

/// Run an `LRANGE` query. The requested index range is clamped to the list
/// bounds; an absent key yields the empty array
pub async fn lrange<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len == 3)?;
    let mut parts = act.into_iter();
    let (key, start, end) = unsafe {
        // UNSAFE(@spinel): This is completely safe as we've already checked
        // that there are exactly 3 arguments
        (
            parts.next().unsafe_unwrap(),
            parts.next().unsafe_unwrap(),
            parts.next().unsafe_unwrap(),
        )
    };
    let (start, end) = match (parse_into_i64(&start), parse_into_i64(&end)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ActionError::ActionError(
                responses::groups::INTEGER_CONVERSION_ERR,
            ))
        }
    };
    let elements: Vec<Data> = {
        let mut table = handle.acquire_table();
        match table.get(&key) {
            Some(record) => match record.get_value() {
                Value::List(list) => list.range(start, end),
                Value::Str(_) => {
                    return Err(ActionError::ActionError(responses::groups::WRONGTYPE_ERR))
                }
            },
            None => Vec::new(),
        }
    };
    let mut writer = BulkArrayWriter::new(&mut con.stream, elements.len())
        .await
        .map_err(ActionError::IoError)?;
    for element in elements {
        writer
            .write_element(element)
            .await
            .map_err(ActionError::IoError)?;
    }
    Ok(())
}
