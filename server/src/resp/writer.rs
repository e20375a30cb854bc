/*
 * Created on Sat Mar 20 2021
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

use crate::protocol::TERMINATOR;
use crate::resp::IsConnection;
use std::io::Error as IoError;

#[derive(Debug)]
/// A writer for an array of bulk strings. The length preamble is written
/// when the writer is created; elements are streamed out one by one instead
/// of being collected into an intermediate buffer
pub struct BulkArrayWriter<'a, T> {
    con: &'a mut T,
}

impl<'a, T> BulkArrayWriter<'a, T>
where
    T: IsConnection,
{
    /// Initialize a new bulk array writer. This will write out the `*` and
    /// the length of the array
    pub async fn new(con: &'a mut T, len: usize) -> Result<BulkArrayWriter<'a, T>, IoError> {
        {
            con.write_lowlevel(&[b'*']).await?;
            let size = len.to_string();
            con.write_lowlevel(size.as_bytes()).await?;
            con.write_lowlevel(TERMINATOR).await?;
        }
        Ok(Self { con })
    }
    /// Write one bulk string element
    pub async fn write_element(&mut self, bytes: impl AsRef<[u8]>) -> Result<(), IoError> {
        let bytes = bytes.as_ref();
        self.con.write_lowlevel(&[b'$']).await?;
        let size = bytes.len().to_string();
        self.con.write_lowlevel(size.as_bytes()).await?;
        self.con.write_lowlevel(TERMINATOR).await?;
        self.con.write_lowlevel(bytes).await?;
        self.con.write_lowlevel(TERMINATOR).await?;
        Ok(())
    }
}
