/*
 * Created on Sat Mar 27 2021
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

//! # `INCR` and `DECR` queries
//! This module provides functions to work with the string-valued counters.
//! The stored text is re-parsed as a signed decimal integer on demand; an
//! absent key counts from zero

use crate::coredb::{CoreDB, Data, Record, Value};
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionError, ActionResult};
use crate::protocol::parse_into_i64;
use crate::protocol::responses;
use crate::protocol::ActionGroup;
use crate::util::Unwrappable;

/// Run an `INCR` query
pub async fn incr<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    step(handle, con, act, 1).await
}

/// Run a `DECR` query
pub async fn decr<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    step(handle, con, act, -1).await
}

/// Apply `by` to the counter stored against the key and write the new value
/// back in its textual form. The expiration instant of an existing key is
/// left untouched
async fn step<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
    by: i64,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len == 1)?;
    let key = unsafe {
        // UNSAFE(@spinel): This is completely safe as we've already checked
        // that there is exactly one argument
        act.into_iter().next().unsafe_unwrap()
    };
    let new_value: i64 = {
        let mut table = handle.acquire_table();
        let (current, expires_at) = match table.get(&key) {
            Some(record) => match record.get_value() {
                Value::Str(data) => match parse_into_i64(data) {
                    Some(int) => (int, record.expires_at()),
                    None => {
                        return Err(ActionError::ActionError(
                            responses::groups::INTEGER_CONVERSION_ERR,
                        ))
                    }
                },
                Value::List(_) => {
                    return Err(ActionError::ActionError(responses::groups::NOT_NUMERIC_ERR))
                }
            },
            None => (0, 0),
        };
        let new_value = match current.checked_add(by) {
            Some(int) => int,
            // the counter would leave the 64-bit range
            None => {
                return Err(ActionError::ActionError(
                    responses::groups::INTEGER_CONVERSION_ERR,
                ))
            }
        };
        table.set(
            key,
            Record::new(
                Value::Str(Data::from_string(new_value.to_string())),
                expires_at,
            ),
        );
        new_value
    };
    conwrite!(con, new_value)?;
    Ok(())
}
