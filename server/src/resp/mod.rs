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

//! Utilities for generating responses, which are only used by the `server`
//!
use crate::coredb::Data;
use crate::protocol::TERMINATOR;
use crate::util::FutureResult;
use bytes::Bytes;
use std::io::Error as IoError;
use tokio::io::AsyncWriteExt;
pub mod writer;

type FutureIoResult<'s> = FutureResult<'s, Result<(), IoError>>;

/// # The `Writable` trait
/// All trait implementors are given access to an asynchronous stream to
/// which they must write a response.
///
/// Every `write()` call makes a call to the [`IsConnection`]'s
/// `write_lowlevel` function, which in turn writes something to the
/// underlying stream.
///
/// Do note that this write **doesn't guarantee immediate completion** as the
/// underlying stream might use buffering. So, the best idea would be to use
/// the `flush()` call on the stream.
pub trait Writable {
    /*
    HACK(@spinel): Since `async` is not supported in traits just yet, we will
    have to use explicit declarations for asynchronous functions
    */
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s>;
}

pub trait IsConnection: std::marker::Sync + std::marker::Send {
    fn write_lowlevel<'s>(&'s mut self, bytes: &'s [u8]) -> FutureIoResult<'s>;
}

impl<T> IsConnection for T
where
    T: AsyncWriteExt + Unpin + Send + Sync,
{
    fn write_lowlevel<'s>(&'s mut self, bytes: &'s [u8]) -> FutureIoResult<'s> {
        Box::pin(self.write_all(bytes))
    }
}

/// A `BytesWrapper` object wraps around a `Bytes` object that might have been
/// pulled from the [`crate::coredb`], and writes it off as a bulk string
///
/// This wrapper exists to prevent trait implementation conflicts when
/// an impl for `fmt::Display` may be implemented upstream
#[derive(Debug, PartialEq)]
pub struct BytesWrapper(pub Bytes);

impl BytesWrapper {
    pub fn finish_into_bytes(self) -> Bytes {
        self.0
    }
}

/// A `StringWrapper` is written off as a simple string. The payload must not
/// contain CR or LF
#[derive(Debug, PartialEq)]
pub struct StringWrapper(pub Data);

impl Writable for StringWrapper {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move {
            con.write_lowlevel(&[b'+']).await?;
            con.write_lowlevel(&self.0).await?;
            con.write_lowlevel(TERMINATOR).await?;
            Ok(())
        })
    }
}

impl Writable for Vec<u8> {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move { con.write_lowlevel(&self).await })
    }
}

impl<const N: usize> Writable for [u8; N] {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move { con.write_lowlevel(&self).await })
    }
}

impl Writable for &'static [u8] {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move { con.write_lowlevel(self).await })
    }
}

impl Writable for BytesWrapper {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move {
            // write off the payload as a length-prefixed bulk string, which
            // keeps the body binary-safe
            let bytes = self.finish_into_bytes();
            con.write_lowlevel(&[b'$']).await?;
            let size = bytes.len().to_string();
            con.write_lowlevel(size.as_bytes()).await?;
            con.write_lowlevel(TERMINATOR).await?;
            con.write_lowlevel(&bytes).await?;
            con.write_lowlevel(TERMINATOR).await?;
            Ok(())
        })
    }
}

impl Writable for usize {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move {
            con.write_lowlevel(b":").await?;
            let int = self.to_string();
            con.write_lowlevel(int.as_bytes()).await?;
            con.write_lowlevel(TERMINATOR).await?;
            Ok(())
        })
    }
}

impl Writable for i64 {
    fn write<'s>(self, con: &'s mut impl IsConnection) -> FutureIoResult<'s> {
        Box::pin(async move {
            con.write_lowlevel(b":").await?;
            let int = self.to_string();
            con.write_lowlevel(int.as_bytes()).await?;
            con.write_lowlevel(TERMINATOR).await?;
            Ok(())
        })
    }
}
