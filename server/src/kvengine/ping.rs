/*
 * Created on Wed Mar 24 2021
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

//! # `PING` queries
//! This module provides functions to work with `PING` queries

use crate::coredb::CoreDB;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionResult};
use crate::protocol::responses;
use crate::protocol::ActionGroup;
use crate::resp::StringWrapper;

/// Run a `PING` query. With no argument the reply is `PONG`; with one, the
/// argument is echoed back as a simple string
pub async fn ping<C: BufferedSocketStream>(
    _handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len < 2)?;
    match act.into_iter().next() {
        Some(message) => conwrite!(con, StringWrapper(message))?,
        None => conwrite!(con, responses::groups::PONG)?,
    }
    Ok(())
}
