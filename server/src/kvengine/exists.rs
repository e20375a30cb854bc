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

//! # `EXISTS` queries
//! This module provides functions to work with `EXISTS` queries

use crate::coredb::CoreDB;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionResult};
use crate::protocol::ActionGroup;

/// Run an `EXISTS` query. Duplicate keys count each time they appear
pub async fn exists<C: BufferedSocketStream>(
    handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len != 0)?;
    let how_many_of_them_exist: usize = {
        let mut table = handle.acquire_table();
        let mut many = 0;
        act.into_iter().for_each(|key| {
            if table.exists(&key) {
                many += 1
            }
        });
        many
    };
    conwrite!(con, how_many_of_them_exist)?;
    Ok(())
}
