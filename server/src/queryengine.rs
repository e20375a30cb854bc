/*
 * Created on Sun Mar 28 2021
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

//! # The Query Engine
//!
//! Takes a parsed request, matches the action name and runs the action.
//! Names are matched case-sensitively in uppercase: `ping` is not a command

use crate::coredb::CoreDB;
use crate::dbnet::BufferedSocketStream;
use crate::dbnet::Connection;
use crate::kvengine;
use crate::kvengine::ActionError;
use crate::kvengine::ActionResult;
use crate::protocol::responses;
use crate::protocol::ActionGroup;

mod tags {
    //! This module is a collection of tags/strings used for evaluating queries
    //! and responses
    /// `PING` action tag
    pub const TAG_PING: &[u8] = b"PING";
    /// `ECHO` action tag
    pub const TAG_ECHO: &[u8] = b"ECHO";
    /// `GET` action tag
    pub const TAG_GET: &[u8] = b"GET";
    /// `SET` action tag
    pub const TAG_SET: &[u8] = b"SET";
    /// `EXISTS` action tag
    pub const TAG_EXISTS: &[u8] = b"EXISTS";
    /// `DEL` action tag
    pub const TAG_DEL: &[u8] = b"DEL";
    /// `INCR` action tag
    pub const TAG_INCR: &[u8] = b"INCR";
    /// `DECR` action tag
    pub const TAG_DECR: &[u8] = b"DECR";
    /// `LPUSH` action tag
    pub const TAG_LPUSH: &[u8] = b"LPUSH";
    /// `RPUSH` action tag
    pub const TAG_RPUSH: &[u8] = b"RPUSH";
    /// `LRANGE` action tag
    pub const TAG_LRANGE: &[u8] = b"LRANGE";
    /// `SAVE` action tag
    pub const TAG_SAVE: &[u8] = b"SAVE";
}

#[macro_export]
/// A match generator macro built specifically for the
/// `crate::queryengine::execute_simple` function
///
/// **NOTE:** This macro needs _paths_ for both sides of the $x => $y, to
/// produce something sensible
macro_rules! gen_match {
    ($pre:ident, $db:ident, $con:ident, $buf:ident, $($x:path => $y:path),*) => {
        match &$pre[..] {
            // First repeat over all the $x => $y patterns, passing in the variables
            // and adding .await calls and adding the `?`
            $(
                $x => $y($db, $con, $buf).await?,
            )*
            // Now add the final case where no action is matched
            _ => {
                return Err(ActionError::FatalError(
                    responses::groups::UNKNOWN_COMMAND_ERR,
                ));
            },
        }
    };
}

/// Execute a simple query
pub async fn execute_simple<C: BufferedSocketStream>(
    db: &CoreDB,
    con: &mut Connection<C>,
    buf: ActionGroup,
) -> ActionResult<()> {
    let first = match buf.get_first() {
        None => {
            return Err(ActionError::FatalError(
                responses::groups::INVALID_CLIENT_DATA_ERR,
            ))
        }
        Some(first) => first.clone(),
    };
    gen_match!(
        first,
        db,
        con,
        buf,
        tags::TAG_PING => kvengine::ping::ping,
        tags::TAG_ECHO => kvengine::echo::echo,
        tags::TAG_GET => kvengine::get::get,
        tags::TAG_SET => kvengine::set::set,
        tags::TAG_EXISTS => kvengine::exists::exists,
        tags::TAG_DEL => kvengine::del::del,
        tags::TAG_INCR => kvengine::incr::incr,
        tags::TAG_DECR => kvengine::incr::decr,
        tags::TAG_LPUSH => kvengine::lists::lpush,
        tags::TAG_RPUSH => kvengine::lists::rpush,
        tags::TAG_LRANGE => kvengine::lists::lrange,
        tags::TAG_SAVE => kvengine::save::save
    );
    Ok(())
}
