/*
 * Created on Mon Mar 15 2021
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

//! # The core database engine

use crate::diskstore;
use bytes::Bytes;
use chrono::Utc;
use libspinel::TResult;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
pub mod list;
use list::List;

/// A wrapper for `Bytes`
///
/// `Data` is used both as the map key and for every stored byte payload, so
/// keys and values stay binary-safe throughout
#[derive(Debug, PartialEq, Clone, Hash)]
pub struct Data {
    /// The blob of data
    blob: Bytes,
}

impl Data {
    /// Create a new blob from a string
    pub fn from_string(val: String) -> Self {
        Data {
            blob: Bytes::from(val.into_bytes()),
        }
    }
    /// Create a new blob from an existing `Bytes` instance
    pub const fn from_blob(blob: Bytes) -> Self {
        Data { blob }
    }
    /// Create a new blob by copying the provided slice
    pub fn copy_from_slice(slice: &[u8]) -> Self {
        Data {
            blob: Bytes::copy_from_slice(slice),
        }
    }
    /// Get the inner blob (raw `Bytes`)
    pub const fn get_blob(&self) -> &Bytes {
        &self.blob
    }
    /// Destruct self and return the inner blob
    pub fn into_inner(self) -> Bytes {
        self.blob
    }
    pub fn len(&self) -> usize {
        self.blob.len()
    }
}

impl Eq for Data {}

impl Deref for Data {
    type Target = [u8];
    fn deref(&self) -> &<Self>::Target {
        &self.blob
    }
}

impl Borrow<[u8]> for Data {
    fn borrow(&self) -> &[u8] {
        self.blob.borrow()
    }
}

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        &self.blob
    }
}

impl<T> From<T> for Data
where
    T: Into<Bytes>,
{
    fn from(dat: T) -> Self {
        Self { blob: dat.into() }
    }
}

/// The variant of value stored against a key
///
/// The tag is immutable for the lifetime of the key: the numeric and list
/// actions refuse to operate across variants, so changing it requires
/// deleting and re-creating the key
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    /// An opaque string of bytes
    Str(Data),
    /// An ordered list of byte strings
    List(List),
}

impl Value {
    /// The textual tag of this variant, as written by the snapshot engine
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }
}

/// A stored value along with its expiration instant
///
/// The expiration instant is a wall-clock time point in milliseconds since
/// the Unix epoch; 0 is the "never expires" sentinel
#[derive(Debug, PartialEq, Clone)]
pub struct Record {
    value: Value,
    expires_at: i64,
}

impl Record {
    pub const fn new(value: Value, expires_at: i64) -> Self {
        Record { value, expires_at }
    }
    pub const fn get_value(&self) -> &Value {
        &self.value
    }
    pub fn get_value_mut(&mut self) -> &mut Value {
        &mut self.value
    }
    pub const fn expires_at(&self) -> i64 {
        self.expires_at
    }
    /// Has this record passed its expiration instant?
    pub const fn has_expired(&self, now: i64) -> bool {
        self.expires_at != 0 && self.expires_at <= now
    }
}

/// The current wall-clock time in milliseconds since the Unix epoch
pub fn time_now() -> i64 {
    Utc::now().timestamp_millis()
}

/// The `Coretable` holds all the key-value pairs in a `HashMap`. Expiration
/// is lazy: an expired key is purged on the first access after its instant,
/// so every read-like operation takes `&mut self`
#[derive(Debug, Default)]
pub struct Coretable {
    coremap: HashMap<Data, Record>,
}

impl Coretable {
    pub fn new() -> Self {
        Coretable {
            coremap: HashMap::new(),
        }
    }
    pub fn from_raw(coremap: HashMap<Data, Record>) -> Self {
        Coretable { coremap }
    }
    /// Look a key up, purging it first if it has expired
    pub fn get(&mut self, key: &[u8]) -> Option<&Record> {
        self.purge_if_expired(key);
        self.coremap.get(key)
    }
    /// Look a key up for mutation, purging it first if it has expired
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Record> {
        self.purge_if_expired(key);
        self.coremap.get_mut(key)
    }
    /// Create or replace a mapping. Any previous record is discarded
    pub fn set(&mut self, key: Data, record: Record) {
        self.coremap.insert(key, record);
    }
    /// Remove a mapping, returning true if a live key was removed. An
    /// expired mapping is purged but observed as absent
    pub fn del(&mut self, key: &[u8]) -> bool {
        if self.purge_if_expired(key) {
            return false;
        }
        self.coremap.remove(key).is_some()
    }
    /// Check if a live mapping exists for the key
    pub fn exists(&mut self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
    /// If the key maps to an expired record, remove it. Returns true if a
    /// purge happened
    fn purge_if_expired(&mut self, key: &[u8]) -> bool {
        let now = time_now();
        if let Some(record) = self.coremap.get(key) {
            if record.has_expired(now) {
                self.coremap.remove(key);
                return true;
            }
        }
        false
    }
    /// The number of mappings, including expired ones that haven't been
    /// touched yet
    pub fn len(&self) -> usize {
        self.coremap.len()
    }
    /// Run `cb` over every mapping. This is only used by the snapshot
    /// engine, which holds the exclusive lock for the whole walk
    pub fn for_each(&self, mut cb: impl FnMut(&Data, &Record)) {
        self.coremap.iter().for_each(|(key, record)| cb(key, record));
    }
}

/// A shared _state_
#[derive(Debug)]
pub struct Shared {
    /// The coretable, behind the single coarse mutex that every store
    /// operation acquires exactly once
    table: Mutex<Coretable>,
    /// Where `SAVE` and the shutdown flush write the snapshot
    savefile: PathBuf,
}

/// This is a thread-safe database handle, which on cloning simply gives
/// another atomic reference to the `shared` object
#[derive(Debug, Clone)]
pub struct CoreDB {
    /// The shared object, which contains a `Shared` object wrapped in a
    /// thread-safe RC
    shared: Arc<Shared>,
}

impl CoreDB {
    /// Create a new `CoreDB` instance
    ///
    /// If a restore file was named on the boot command line, it **must**
    /// exist and parse; otherwise a previous save is restored if one is
    /// available, and an empty table is created if not
    pub fn new(restore_file: Option<PathBuf>, savefile: PathBuf) -> TResult<Self> {
        let coremap = match restore_file {
            Some(file) => match diskstore::get_saved(&file)? {
                Some(map) => {
                    log::info!("Restored data from the snapshot at '{}'", file.display());
                    Some(map)
                }
                None => {
                    return Err(
                        format!("The restore file '{}' could not be found", file.display()).into(),
                    )
                }
            },
            None => {
                let saved = diskstore::get_saved(&savefile)?;
                if saved.is_some() {
                    log::info!("Restored data from the previous save");
                }
                saved
            }
        };
        let db = match coremap {
            Some(coremap) => CoreDB {
                shared: Arc::new(Shared {
                    table: Mutex::new(Coretable::from_raw(coremap)),
                    savefile,
                }),
            },
            None => CoreDB::new_empty(savefile),
        };
        Ok(db)
    }
    /// Create an empty in-memory table
    pub fn new_empty(savefile: PathBuf) -> Self {
        CoreDB {
            shared: Arc::new(Shared {
                table: Mutex::new(Coretable::new()),
                savefile,
            }),
        }
    }
    /// Acquire the store lock. Callers must not attempt a nested
    /// acquisition: one guard covers one whole store touch
    pub fn acquire_table(&self) -> MutexGuard<'_, Coretable> {
        self.shared.table.lock()
    }
    /// Flush the contents of the in-memory table onto disk
    pub fn flush_db(&self) -> TResult<()> {
        let data = self.acquire_table();
        diskstore::write_to_disk(&self.shared.savefile, &data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mktable() -> Coretable {
        Coretable::new()
    }

    #[test]
    fn test_set_then_get() {
        let mut table = mktable();
        table.set(
            Data::from_string("foo".to_owned()),
            Record::new(Value::Str(Data::from_string("bar".to_owned())), 0),
        );
        let record = table.get(b"foo").unwrap();
        assert_eq!(
            *record.get_value(),
            Value::Str(Data::from_string("bar".to_owned()))
        );
        assert_eq!(record.expires_at(), 0);
    }

    #[test]
    fn test_expired_key_is_invisible_and_purged() {
        let mut table = mktable();
        table.set(
            Data::from_string("temp".to_owned()),
            Record::new(
                Value::Str(Data::from_string("x".to_owned())),
                time_now() - 10,
            ),
        );
        assert!(table.get(b"temp").is_none());
        // the mapping was removed on first touch
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_del_of_expired_key_reports_absent() {
        let mut table = mktable();
        table.set(
            Data::from_string("temp".to_owned()),
            Record::new(Value::Str(Data::from_string("x".to_owned())), 1),
        );
        assert!(!table.del(b"temp"));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_del_and_exists() {
        let mut table = mktable();
        table.set(
            Data::from_string("k".to_owned()),
            Record::new(Value::Str(Data::from_string("v".to_owned())), 0),
        );
        assert!(table.exists(b"k"));
        assert!(table.del(b"k"));
        assert!(!table.exists(b"k"));
        assert!(!table.del(b"k"));
    }

    #[test]
    fn test_replacing_a_key_discards_the_old_record() {
        let mut table = mktable();
        table.set(
            Data::from_string("k".to_owned()),
            Record::new(Value::Str(Data::from_string("old".to_owned())), 0),
        );
        table.set(
            Data::from_string("k".to_owned()),
            Record::new(Value::Str(Data::from_string("new".to_owned())), 0),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(
            *table.get(b"k").unwrap().get_value(),
            Value::Str(Data::from_string("new".to_owned()))
        );
    }
}
