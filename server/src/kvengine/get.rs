/*
 * Created on Thu Mar 25 2021
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

//! # `GET` queries
//! This module provides functions to work with `GET` queries

use crate::coredb::CoreDB;
use crate::coredb::Value;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionError, ActionResult};
use crate::protocol::responses;
use crate::protocol::ActionGroup;
use crate::resp::BytesWrapper;
use crate::util::Unwrappable;
use bytes::Bytes;

/// Run a `GET` query
pub async fn get<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len == 1)?;
    let key = unsafe {
        // UNSAFE(@spinel): This is completely safe as we've already checked
        // that there is exactly one argument
        act.into_iter().next().unsafe_unwrap()
    };
    let res: Option<Bytes> = {
        let mut table = handle.acquire_table();
        match table.get(&key) {
            Some(record) => match record.get_value() {
                Value::Str(data) => Some(data.get_blob().clone()),
                Value::List(_) => {
                    return Err(ActionError::ActionError(responses::groups::WRONGTYPE_ERR))
                }
            },
            None => None,
        }
    };
    if let Some(value) = res {
        // Good, we got the value, write it off to the stream
        conwrite!(con, BytesWrapper(value))?;
    } else {
        // Ah, couldn't find that key
        conwrite!(con, responses::groups::NIL)?;
    }
    Ok(())
}
