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

//! # The key/value engine
//!
//! Actions are like shell commands: you provide arguments, they return
//! output. This module contains a collection of the actions supported by
//! Spinel, one module per action

#[macro_use]
mod macros;
pub mod del;
pub mod echo;
pub mod exists;
pub mod get;
pub mod incr;
pub mod lists;
pub mod ping;
pub mod save;
pub mod set;

use crate::protocol::responses;
use std::io::Error as IoError;

/// A generic result for actions
pub type ActionResult<T> = Result<T, ActionError>;

/// Errors that can occur while running actions
#[derive(Debug)]
pub enum ActionError {
    /// A per-request error: the error frame is written back and the
    /// connection continues
    ActionError(&'static [u8]),
    /// A protocol-level error: the error frame is written back and the
    /// connection is closed
    FatalError(&'static [u8]),
    /// The client is gone or the socket is broken
    IoError(IoError),
}

impl PartialEq for ActionError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ActionError(a1), Self::ActionError(a2)) => a1 == a2,
            (Self::FatalError(f1), Self::FatalError(f2)) => f1 == f2,
            (Self::IoError(ioe1), Self::IoError(ioe2)) => ioe1.to_string() == ioe2.to_string(),
            _ => false,
        }
    }
}

impl From<IoError> for ActionError {
    fn from(e: IoError) -> Self {
        Self::IoError(e)
    }
}

/// Check an action's argument count, failing with the missing-argument
/// error (which closes the connection) if the count is off
pub fn ensure_length(len: usize, is_valid: fn(usize) -> bool) -> ActionResult<()> {
    if is_valid(len) {
        Ok(())
    } else {
        Err(ActionError::FatalError(
            responses::groups::INVALID_CLIENT_DATA_ERR,
        ))
    }
}
