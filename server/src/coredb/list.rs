/*
 * Created on Tue Apr 06 2021
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

//! # The list value
//!
//! Lists are single-owner: a list belongs to exactly one map entry and its
//! elements belong to the list. Mutation only happens through the entry
//! while the store lock is held, so the list itself needs no locking

use super::Data;
use std::collections::VecDeque;

/// An ordered sequence of byte strings with O(1) insertion at both ends
#[derive(Debug, PartialEq, Clone, Default)]
pub struct List {
    elements: VecDeque<Data>,
}

impl List {
    pub fn new() -> Self {
        List {
            elements: VecDeque::new(),
        }
    }
    /// The number of elements reachable from the head
    pub fn len(&self) -> usize {
        self.elements.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
    /// Prepend the provided elements one at a time, so that the last element
    /// pushed ends up at the head (the input-reversal semantic of `LPUSH`)
    pub fn head_push(&mut self, elements: impl IntoIterator<Item = Data>) {
        elements
            .into_iter()
            .for_each(|element| self.elements.push_front(element));
    }
    /// Append the provided elements in order
    pub fn tail_push(&mut self, elements: impl IntoIterator<Item = Data>) {
        elements
            .into_iter()
            .for_each(|element| self.elements.push_back(element));
    }
    /// Iterate the elements in head-to-tail order
    pub fn iter(&self) -> impl Iterator<Item = &Data> {
        self.elements.iter()
    }
    /// Project the elements with 0-based positions in `[start, end]`, both
    /// clamped to the list bounds and `end` inclusive. A `start` past the
    /// last position yields nothing; so does a range that is empty after
    /// clamping. Negative indices are not reinterpreted
    pub fn range(&self, start: i64, end: i64) -> Vec<Data> {
        if self.elements.is_empty() {
            return Vec::new();
        }
        let last = (self.elements.len() - 1) as i64;
        if start > last {
            return Vec::new();
        }
        let start = start.max(0);
        let end = end.min(last);
        if end < start {
            return Vec::new();
        }
        self.elements
            .iter()
            .skip(start as usize)
            .take((end - start + 1) as usize)
            .cloned()
            .collect()
    }
}
