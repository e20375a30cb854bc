/*
 * Created on Sun Mar 14 2021
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

use core::future::Future;
use core::pin::Pin;

/// A pinned, boxed future
pub type FutureResult<'s, T> = Pin<Box<dyn Future<Output = T> + Send + 's>>;

/// This is a trait for practically unwrapping values that cannot fail, but
/// would otherwise require an `unwrap()` call and hence a run-time check
/// that we have already done ourselves
pub trait Unwrappable<T> {
    /// Unwrap a _nullable_ (almost) type to get its value while asserting that
    /// the value cannot ever be null
    ///
    /// ## Safety
    /// The caller has to guarantee that the value is never null
    unsafe fn unsafe_unwrap(self) -> T;
}

impl<T> Unwrappable<T> for Option<T> {
    unsafe fn unsafe_unwrap(self) -> T {
        match self {
            Some(t) => t,
            None => core::hint::unreachable_unchecked(),
        }
    }
}

impl<T, E> Unwrappable<T> for Result<T, E> {
    unsafe fn unsafe_unwrap(self) -> T {
        match self {
            Ok(t) => t,
            Err(_) => core::hint::unreachable_unchecked(),
        }
    }
}
