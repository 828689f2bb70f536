// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! [Static Table] and [Dynamic Table] implementation of [HPACK].
//!
//! [Static Table]: https://httpwg.org/specs/rfc7541.html#static.table
//! [Dynamic Table]: https://httpwg.org/specs/rfc7541.html#dynamic.table
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! Both tables share one index address space:
//!
//! ```text
//!  <----------  Index Address Space ---------->
//!  <-- Static  Table -->  <-- Dynamic Table -->
//!  +---+-----------+---+  +---+-----------+---+
//!  | 1 |    ...    | s |  |s+1|    ...    |s+k|
//!  +---+-----------+---+  +---+-----------+---+
//!                         ^                   |
//!                         |                   V
//!                  Insertion Point      Dropping Point
//! ```

use std::collections::{HashMap, VecDeque};

use crate::error::{HpackError, ProtocolError};

/// Number of entries in the static table.
pub(crate) const STATIC_TABLE_SIZE: usize = 61;

/// The lowest index addressing the dynamic table.
pub(crate) const FIRST_DYNAMIC_INDEX: usize = STATIC_TABLE_SIZE + 1;

/// Result of searching a table for a `(name, value)` pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FindResult {
    /// Index of an entry whose name matched, 0 when nothing matched.
    pub name_index: usize,
    /// Whether the entry at `name_index` also matched the value.
    pub value_indexed: bool,
}

impl FindResult {
    /// Returns `true` if at least the name was found.
    pub fn is_found(&self) -> bool {
        self.name_index != 0
    }
}

/// `TableSearcher` is used to find specified content in static and dynamic
/// tables.
pub(crate) struct TableSearcher<'a> {
    dynamic: &'a DynamicTable,
}

impl<'a> TableSearcher<'a> {
    pub(crate) fn new(dynamic: &'a DynamicTable) -> Self {
        Self { dynamic }
    }

    /// Resolves an index of the combined address space to its
    /// `(name, value)` pair.
    pub(crate) fn search_header(&self, index: usize) -> Option<(&'a [u8], &'a [u8])> {
        if index <= STATIC_TABLE_SIZE {
            StaticTable::entry(index)
        } else {
            self.dynamic.get_entry(index)
        }
    }

    /// Resolves an index of the combined address space to its name.
    pub(crate) fn search_header_name(&self, index: usize) -> Option<&'a [u8]> {
        self.search_header(index).map(|(name, _)| name)
    }

    /// Searches both tables for a `(name, value)` pair. Static table matches
    /// take priority over dynamic ones.
    pub(crate) fn find(&self, name: &[u8], value: &[u8]) -> FindResult {
        let st = StaticTable::find(name, value);
        if st.value_indexed {
            return st;
        }
        let dy = self.dynamic.find(name, value);
        if dy.value_indexed {
            return dy;
        }
        if st.is_found() {
            st
        } else {
            dy
        }
    }

    /// Resolves `name_index` to its name, then searches for `value` among
    /// entries carrying that name. On a value miss the caller's index is
    /// kept as the name match.
    pub(crate) fn find_indexed(&self, name_index: usize, value: &[u8]) -> Option<FindResult> {
        if name_index <= STATIC_TABLE_SIZE {
            let st = StaticTable::find_indexed(name_index, value)?;
            if st.value_indexed {
                return Some(st);
            }
            let (name, _) = StaticTable::entry(name_index)?;
            let dy = self.dynamic.find(name, value);
            if dy.value_indexed {
                return Some(dy);
            }
            Some(st)
        } else {
            let (name, _) = self.dynamic.get_entry(name_index)?;
            let dy = self.dynamic.find(name, value);
            if dy.value_indexed {
                return Some(dy);
            }
            Some(FindResult {
                name_index,
                value_indexed: false,
            })
        }
    }
}

/// One dynamic table entry. `insert` is the value of the table's insert
/// counter when the entry was added; the entry's current index is derived
/// from it, so indices never need rewriting on eviction.
#[derive(Debug)]
struct Entry {
    name: Vec<u8>,
    value: Vec<u8>,
    insert: u64,
}

impl Entry {
    // RFC7541-4.1: The additional 32 octets account for an estimated
    // overhead associated with an entry.
    fn size(&self) -> usize {
        self.name.len() + self.value.len() + 32
    }
}

/// The [Dynamic Table] implementation of [HPACK].
///
/// [Dynamic Table]: https://httpwg.org/specs/rfc7541.html#dynamic.table
/// [HPACK]: https://httpwg.org/specs/rfc7541.html
///
/// # Introduction
/// The dynamic table consists of a list of header fields maintained in
/// first-in, first-out order. The first and newest entry of a dynamic table
/// is at the lowest index, and the oldest entry of a dynamic table is at the
/// highest index.
///
/// The dynamic table is initially empty. Entries are added as each header
/// block is processed, and evicted from the oldest end once the configured
/// size is exceeded. It can contain duplicate entries, which are not an
/// error.
///
/// The chosen `max_size` must stay lower than or equal to
/// `protocol_max_size`, the limit determined by the protocol using HPACK
/// (`SETTINGS_HEADER_TABLE_SIZE` in HTTP/2).
#[derive(Debug)]
pub struct DynamicTable {
    // newest entries sit at the back, the eviction point is the front
    entries: VecDeque<Entry>,
    // name -> insert counters of the live entries carrying it, oldest first
    by_name: HashMap<Vec<u8>, Vec<u64>>,
    curr_size: usize,
    max_size: usize,
    protocol_max_size: usize,
    insert_count: u64,
}

impl DynamicTable {
    /// Creates a `DynamicTable` based on the size limit. The protocol
    /// ceiling starts out equal to `max_size`.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            by_name: HashMap::new(),
            curr_size: 0,
            max_size,
            protocol_max_size: max_size,
            insert_count: 0,
        }
    }

    /// Sum of the sizes of all live entries.
    pub fn current_size(&self) -> usize {
        self.curr_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The hard ceiling `max_size` may be updated to.
    pub fn protocol_max_size(&self) -> usize {
        self.protocol_max_size
    }

    /// Number of live entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Index of the newest addressable entry; 61 when the table is empty.
    pub fn current_max_index(&self) -> usize {
        STATIC_TABLE_SIZE + self.entries.len()
    }

    /// Appends a `(name, value)` entry, evicting from the oldest end until
    /// it fits. Returns the index of the added pair, or 0 if the entry is
    /// larger than `max_size`, in which case the table is cleared and the
    /// entry is not stored.
    pub fn add_entry(&mut self, name: &[u8], value: &[u8]) -> usize {
        let size = name.len() + value.len() + 32;
        if size > self.max_size {
            self.reset();
            return 0;
        }
        self.evict_to(self.max_size - size);
        self.insert_count += 1;
        self.entries.push_back(Entry {
            name: name.to_vec(),
            value: value.to_vec(),
            insert: self.insert_count,
        });
        self.by_name
            .entry(name.to_vec())
            .or_default()
            .push(self.insert_count);
        self.curr_size += size;
        FIRST_DYNAMIC_INDEX
    }

    /// Updates `max_size`, evicting entries until the current size fits.
    ///
    /// RFC7541-6.3: "The new maximum size MUST be lower than or equal to the
    /// limit determined by the protocol using HPACK. A value that exceeds
    /// this limit MUST be treated as a decoding error."
    pub fn update_size(&mut self, new_max_size: usize) -> Result<(), HpackError> {
        if new_max_size > self.protocol_max_size {
            return Err(ProtocolError::SizeUpdateOverLimit.into());
        }
        self.evict_to(new_max_size);
        self.max_size = new_max_size;
        Ok(())
    }

    /// Updates the protocol ceiling. When the ceiling drops below the
    /// current `max_size`, the table is shrunk to the new limit.
    pub fn set_protocol_max_size(&mut self, limit: usize) {
        self.protocol_max_size = limit;
        if limit < self.max_size {
            self.evict_to(limit);
            self.max_size = limit;
        }
    }

    /// Destroys every entry. `max_size` and the protocol ceiling are kept.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.curr_size = 0;
    }

    /// Gets the `(name, value)` pair at an index of the combined address
    /// space, for `62 <= index <= current_max_index()`.
    pub fn get_entry(&self, index: usize) -> Option<(&[u8], &[u8])> {
        let offset = index.checked_sub(FIRST_DYNAMIC_INDEX)?;
        let entry = self.entries.get(self.entries.len().checked_sub(1 + offset)?)?;
        Some((&entry.name, &entry.value))
    }

    /// Searches the dynamic entries for a `(name, value)` pair, returning
    /// indices of the combined address space. A name match is upgraded to a
    /// value match when one exists; the newest matching entry wins.
    pub fn find(&self, name: &[u8], value: &[u8]) -> FindResult {
        let mut result = FindResult::default();
        let counters = match self.by_name.get(name) {
            Some(counters) => counters,
            None => return result,
        };
        for &insert in counters.iter().rev() {
            if !result.is_found() {
                result.name_index = self.index_of(insert);
            }
            if self.entry_at(insert).value.as_slice() == value {
                result.name_index = self.index_of(insert);
                result.value_indexed = true;
                break;
            }
        }
        result
    }

    /// Index an entry inserted at counter value `insert` currently has.
    fn index_of(&self, insert: u64) -> usize {
        FIRST_DYNAMIC_INDEX + (self.insert_count - insert) as usize
    }

    fn entry_at(&self, insert: u64) -> &Entry {
        let offset = (self.insert_count - insert) as usize;
        &self.entries[self.entries.len() - 1 - offset]
    }

    /// Evicts oldest entries until the current size fits into `bytes`.
    fn evict_to(&mut self, bytes: usize) {
        while self.curr_size > bytes && !self.entries.is_empty() {
            let entry = self.entries.pop_front().unwrap();
            self.curr_size -= entry.size();
            if let Some(counters) = self.by_name.get_mut(&entry.name) {
                // the evicted entry is the globally oldest, so its counter
                // is the first of its bucket
                counters.remove(0);
                if counters.is_empty() {
                    self.by_name.remove(&entry.name);
                }
            }
        }
    }
}

/// The [Static Table] implementation of [HPACK].
///
/// [Static Table]: https://httpwg.org/specs/rfc7541.html#static.table
/// [HPACK]: https://httpwg.org/specs/rfc7541.html
///
/// # Introduction
/// The static table consists of a predefined, immutable list of 61 header
/// fields, indices 1 through 61. Entries with the same name are contiguous,
/// and the entries carrying a canonical value come first in their group.
pub(crate) struct StaticTable;

impl StaticTable {
    /// Index of the `:status` name.
    pub(crate) const STATUS: usize = 8;

    const ENTRIES: [(&'static [u8], &'static [u8]); STATIC_TABLE_SIZE] = [
        (b":authority", b""),
        (b":method", b"GET"),
        (b":method", b"POST"),
        (b":path", b"/"),
        (b":path", b"/index.html"),
        (b":scheme", b"http"),
        (b":scheme", b"https"),
        (b":status", b"200"),
        (b":status", b"204"),
        (b":status", b"206"),
        (b":status", b"304"),
        (b":status", b"400"),
        (b":status", b"404"),
        (b":status", b"500"),
        (b"accept-charset", b""),
        (b"accept-encoding", b"gzip, deflate"),
        (b"accept-language", b""),
        (b"accept-ranges", b""),
        (b"accept", b""),
        (b"access-control-allow-origin", b""),
        (b"age", b""),
        (b"allow", b""),
        (b"authorization", b""),
        (b"cache-control", b""),
        (b"content-disposition", b""),
        (b"content-encoding", b""),
        (b"content-language", b""),
        (b"content-length", b""),
        (b"content-location", b""),
        (b"content-range", b""),
        (b"content-type", b""),
        (b"cookie", b""),
        (b"date", b""),
        (b"etag", b""),
        (b"expect", b""),
        (b"expires", b""),
        (b"from", b""),
        (b"host", b""),
        (b"if-match", b""),
        (b"if-modified-since", b""),
        (b"if-none-match", b""),
        (b"if-range", b""),
        (b"if-unmodified-since", b""),
        (b"last-modified", b""),
        (b"link", b""),
        (b"location", b""),
        (b"max-forwards", b""),
        (b"proxy-authenticate", b""),
        (b"proxy-authorization", b""),
        (b"range", b""),
        (b"referer", b""),
        (b"refresh", b""),
        (b"retry-after", b""),
        (b"server", b""),
        (b"set-cookie", b""),
        (b"strict-transport-security", b""),
        (b"transfer-encoding", b""),
        (b"user-agent", b""),
        (b"vary", b""),
        (b"via", b""),
        (b"www-authenticate", b""),
    ];

    /// Gets the `(name, value)` pair by the given index; the value is empty
    /// when the entry has no canonical value.
    pub(crate) fn entry(index: usize) -> Option<(&'static [u8], &'static [u8])> {
        match index {
            1..=STATIC_TABLE_SIZE => Some(Self::ENTRIES[index - 1]),
            _ => None,
        }
    }

    /// Gets the first (lowest) index whose entry has a matching name,
    /// 0 when the name is not in the table.
    pub(crate) fn find_name(name: &[u8]) -> usize {
        match name {
            b":authority" => 1,
            b":method" => 2,
            b":path" => 4,
            b":scheme" => 6,
            b":status" => 8,
            b"accept-charset" => 15,
            b"accept-encoding" => 16,
            b"accept-language" => 17,
            b"accept-ranges" => 18,
            b"accept" => 19,
            b"access-control-allow-origin" => 20,
            b"age" => 21,
            b"allow" => 22,
            b"authorization" => 23,
            b"cache-control" => 24,
            b"content-disposition" => 25,
            b"content-encoding" => 26,
            b"content-language" => 27,
            b"content-length" => 28,
            b"content-location" => 29,
            b"content-range" => 30,
            b"content-type" => 31,
            b"cookie" => 32,
            b"date" => 33,
            b"etag" => 34,
            b"expect" => 35,
            b"expires" => 36,
            b"from" => 37,
            b"host" => 38,
            b"if-match" => 39,
            b"if-modified-since" => 40,
            b"if-none-match" => 41,
            b"if-range" => 42,
            b"if-unmodified-since" => 43,
            b"last-modified" => 44,
            b"link" => 45,
            b"location" => 46,
            b"max-forwards" => 47,
            b"proxy-authenticate" => 48,
            b"proxy-authorization" => 49,
            b"range" => 50,
            b"referer" => 51,
            b"refresh" => 52,
            b"retry-after" => 53,
            b"server" => 54,
            b"set-cookie" => 55,
            b"strict-transport-security" => 56,
            b"transfer-encoding" => 57,
            b"user-agent" => 58,
            b"vary" => 59,
            b"via" => 60,
            b"www-authenticate" => 61,
            _ => 0,
        }
    }

    /// Searches for a `(name, value)` pair. Entries with the same name are
    /// contiguous and their value-carrying members come first, so the scan
    /// walks the group until the name changes or the value slot is empty.
    pub(crate) fn find(name: &[u8], value: &[u8]) -> FindResult {
        let first = Self::find_name(name);
        let mut result = FindResult {
            name_index: first,
            value_indexed: false,
        };
        if first == 0 {
            return result;
        }
        let mut index = first;
        while let Some((n, v)) = Self::entry(index) {
            if n != name || v.is_empty() {
                break;
            }
            if v == value {
                result.name_index = index;
                result.value_indexed = true;
                break;
            }
            index += 1;
        }
        result
    }

    /// Reverse lookup over the canonical values of the table.
    pub(crate) fn find_by_value(value: &[u8]) -> usize {
        match value {
            b"GET" => 2,
            b"POST" => 3,
            b"/" => 4,
            b"/index.html" => 5,
            b"http" => 6,
            b"https" => 7,
            b"200" => 8,
            b"204" => 9,
            b"206" => 10,
            b"304" => 11,
            b"400" => 12,
            b"404" => 13,
            b"500" => 14,
            b"gzip, deflate" => 16,
            _ => 0,
        }
    }

    /// Searches for `value` among entries sharing the name of `name_index`.
    /// On a value miss the caller's index is kept as the name match, so
    /// index 5 (`:path /index.html`) with an unknown path stays 5.
    pub(crate) fn find_indexed(name_index: usize, value: &[u8]) -> Option<FindResult> {
        let (name, _) = Self::entry(name_index)?;
        let by_value = Self::find_by_value(value);
        if by_value != 0 {
            if let Some((n, _)) = Self::entry(by_value) {
                if n == name {
                    return Some(FindResult {
                        name_index: by_value,
                        value_indexed: true,
                    });
                }
            }
        }
        Some(FindResult {
            name_index,
            value_indexed: false,
        })
    }

    /// Status code of the seven fully indexed `:status` entries.
    pub(crate) fn status_code(index: usize) -> Option<u16> {
        match index {
            8 => Some(200),
            9 => Some(204),
            10 => Some(206),
            11 => Some(304),
            12 => Some(400),
            13 => Some(404),
            14 => Some(500),
            _ => None,
        }
    }

    /// Index of the seven common `:status` codes.
    pub(crate) fn status_index(code: u16) -> Option<usize> {
        match code {
            200 => Some(8),
            204 => Some(9),
            206 => Some(10),
            304 => Some(11),
            400 => Some(12),
            404 => Some(13),
            500 => Some(14),
            _ => None,
        }
    }
}


#[cfg(test)]
mod ut_dynamic_table {
    use super::{DynamicTable, FIRST_DYNAMIC_INDEX, STATIC_TABLE_SIZE};
    use crate::error::{HpackError, ProtocolError};

    /// UT test cases for `DynamicTable::with_max_size`.
    ///
    /// # Brief
    /// 1. Calls `DynamicTable::with_max_size` to create a `DynamicTable`.
    /// 2. Checks the results.
    #[test]
    fn ut_dynamic_table_with_max_size() {
        let table = DynamicTable::with_max_size(4096);
        assert_eq!(table.entry_count(), 0);
        assert_eq!(table.current_size(), 0);
        assert_eq!(table.max_size(), 4096);
        assert_eq!(table.protocol_max_size(), 4096);
        assert_eq!(table.current_max_index(), STATIC_TABLE_SIZE);
    }

    /// UT test cases for `DynamicTable::add_entry` and
    /// `DynamicTable::get_entry`.
    ///
    /// # Brief
    /// 1. Adds entries and reads them back by index.
    /// 2. Checks index stability while older entries age.
    #[test]
    fn ut_dynamic_table_add_entry() {
        let mut table = DynamicTable::with_max_size(4096);
        assert!(table.get_entry(FIRST_DYNAMIC_INDEX).is_none());

        assert_eq!(table.add_entry(b":authority", b"www.example.com"), 62);
        assert_eq!(table.current_size(), 57);
        assert_eq!(
            table.get_entry(62),
            Some((b":authority".as_slice(), b"www.example.com".as_slice()))
        );

        assert_eq!(table.add_entry(b"cache-control", b"no-cache"), 62);
        assert_eq!(table.current_size(), 110);
        assert_eq!(
            table.get_entry(62),
            Some((b"cache-control".as_slice(), b"no-cache".as_slice()))
        );
        // the first entry moved one step towards the dropping point
        assert_eq!(
            table.get_entry(63),
            Some((b":authority".as_slice(), b"www.example.com".as_slice()))
        );
        assert_eq!(table.current_max_index(), 63);
        assert!(table.get_entry(64).is_none());
    }

    /// UT test cases for eviction.
    ///
    /// # Brief
    /// 1. Fills a small table until entries get evicted.
    /// 2. Checks the eviction order and the size accounting.
    #[test]
    fn ut_dynamic_table_eviction() {
        // each entry below is 42 octets, so only two fit
        let mut table = DynamicTable::with_max_size(90);
        table.add_entry(b"name1", b"value");
        table.add_entry(b"name2", b"value");
        assert_eq!(table.current_size(), 84);

        table.add_entry(b"name3", b"value");
        assert_eq!(table.current_size(), 84);
        assert_eq!(table.entry_count(), 2);
        assert_eq!(
            table.get_entry(62),
            Some((b"name3".as_slice(), b"value".as_slice()))
        );
        assert_eq!(
            table.get_entry(63),
            Some((b"name2".as_slice(), b"value".as_slice()))
        );
        // name1 was dropped together with its name bucket
        assert!(!table.find(b"name1", b"value").is_found());
    }

    /// UT test cases for oversize entries.
    ///
    /// # Brief
    /// 1. Adds an entry larger than the whole table.
    /// 2. Checks that the table clears and the entry is not stored.
    #[test]
    fn ut_dynamic_table_oversize_entry() {
        let mut table = DynamicTable::with_max_size(64);
        table.add_entry(b"name", b"value");
        assert!(table.current_size() > 0);

        let long_value = [b'a'; 64];
        assert_eq!(table.add_entry(b"big", &long_value), 0);
        assert_eq!(table.current_size(), 0);
        assert_eq!(table.entry_count(), 0);
    }

    /// UT test cases for `DynamicTable::update_size`.
    ///
    /// # Brief
    /// 1. Shrinks the table below its content size.
    /// 2. Tries to grow it past the protocol ceiling.
    /// 3. Checks the results.
    #[test]
    fn ut_dynamic_table_update_size() {
        let mut table = DynamicTable::with_max_size(4096);
        table.add_entry(b":authority", b"www.example.com");
        table.add_entry(b"cache-control", b"no-cache");
        assert_eq!(table.current_size(), 110);

        table.update_size(60).unwrap();
        assert_eq!(table.max_size(), 60);
        assert_eq!(table.entry_count(), 1);
        assert_eq!(
            table.get_entry(62),
            Some((b"cache-control".as_slice(), b"no-cache".as_slice()))
        );

        assert_eq!(
            table.update_size(8192),
            Err(HpackError::Protocol(ProtocolError::SizeUpdateOverLimit))
        );
        assert_eq!(table.max_size(), 60);

        table.update_size(0).unwrap();
        assert_eq!(table.current_size(), 0);
        assert_eq!(table.entry_count(), 0);
    }

    /// UT test cases for `DynamicTable::set_protocol_max_size`.
    ///
    /// # Brief
    /// 1. Raises the ceiling, then drops it below the current max size.
    /// 2. Checks that the table shrinks with the ceiling.
    #[test]
    fn ut_dynamic_table_set_protocol_max_size() {
        let mut table = DynamicTable::with_max_size(4096);
        table.set_protocol_max_size(8192);
        table.update_size(8192).unwrap();
        assert_eq!(table.max_size(), 8192);

        table.add_entry(b":authority", b"www.example.com");
        table.set_protocol_max_size(40);
        assert_eq!(table.max_size(), 40);
        assert_eq!(table.current_size(), 0);
    }

    /// UT test cases for `DynamicTable::find`.
    ///
    /// # Brief
    /// 1. Adds duplicate and same-name entries.
    /// 2. Checks that the newest match wins and name matches upgrade to
    ///    value matches.
    #[test]
    fn ut_dynamic_table_find() {
        let mut table = DynamicTable::with_max_size(4096);
        table.add_entry(b"cache-control", b"no-cache");
        table.add_entry(b"cache-control", b"private");
        table.add_entry(b"date", b"Mon, 21 Oct 2013 20:13:21 GMT");

        let result = table.find(b"cache-control", b"no-cache");
        assert_eq!(result.name_index, 64);
        assert!(result.value_indexed);

        let result = table.find(b"cache-control", b"private");
        assert_eq!(result.name_index, 63);
        assert!(result.value_indexed);

        let result = table.find(b"cache-control", b"no-store");
        assert_eq!(result.name_index, 63);
        assert!(!result.value_indexed);

        assert!(!table.find(b"age", b"0").is_found());

        // duplicates are allowed, the newest copy is preferred
        table.add_entry(b"cache-control", b"private");
        let result = table.find(b"cache-control", b"private");
        assert_eq!(result.name_index, 62);
        assert!(result.value_indexed);
    }
}
