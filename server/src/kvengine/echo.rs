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

//! # `ECHO` queries
//! This module provides functions to work with `ECHO` queries

use crate::coredb::CoreDB;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine::{ensure_length, ActionResult};
use crate::protocol::ActionGroup;
use crate::resp::BytesWrapper;
use crate::util::Unwrappable;

/// Run an `ECHO` query: the argument comes back as a bulk string, which
/// keeps it binary-safe
pub async fn echo<C: BufferedSocketStream>(
    _handle: &CoreDB,
    con: &mut Connection<C>,
    act: ActionGroup,
) -> ActionResult<()> {
    ensure_length(act.howmany(), |len| len == 1)?;
    let message = unsafe {
        // UNSAFE(@spinel): This is completely safe as we've already checked
        // that there is exactly one argument
        act.into_iter().next().unsafe_unwrap()
    };
    conwrite!(con, BytesWrapper(message.into_inner()))?;
    Ok(())
}
