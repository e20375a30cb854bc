/*
 * Created on Fri Mar 26 2021
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

//! # `DEL` queries
//! This module provides functions to work with `DEL` queries

use crate::coredb::CoreDB;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionResult};
use crate::protocol::ActionGroup;

/// Run a `DEL` query
///
/// Do note that this function is blocking since it acquires a write lock.
/// The reply is the number of keys that were actually removed; expired
/// mappings are purged along the way but count as absent
pub async fn del<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len != 0)?;
    let done_howmany: usize = {
        let mut table = handle.acquire_table();
        let mut many = 0;
        act.into_iter().for_each(|key| {
            if table.del(&key) {
                many += 1
            }
        });
        many
    };
    conwrite!(con, done_howmany)?;
    Ok(())
}
