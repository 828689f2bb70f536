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

//! Encoder implementation of [HPACK].
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! An encoded header field can be represented either as an index or as a
//! literal. An [indexed representation] defines a header field as a
//! reference to an entry in either the static table or the dynamic table. A
//! [literal representation] defines a header field by specifying its name,
//! either literally or as a table reference, and its value literally. A
//! literal representation may additionally insert the header field as a new
//! entry into the dynamic table (incremental indexing).
//!
//! [indexed representation]: https://www.rfc-editor.org/rfc/rfc7541.html#section-6.1
//! [literal representation]: https://www.rfc-editor.org/rfc/rfc7541.html#section-6.2

use crate::error::{HpackError, ProtocolError};
use crate::integer::encode_integer;
use crate::strings::encode_string;
use crate::table::{DynamicTable, StaticTable, TableSearcher};

// First-byte markers of the five representation forms.
const INDEXED: u8 = 0x80;
const WITH_INDEXING: u8 = 0x40;
const SIZE_UPDATE: u8 = 0x20;
const NEVER_INDEXED: u8 = 0x10;
const WITHOUT_INDEXING: u8 = 0x00;

/// Index prefix mask belonging to a representation marker.
const fn prefix_mask(pre: u8) -> u8 {
    match pre {
        INDEXED => 0x7f,
        WITH_INDEXING => 0x3f,
        SIZE_UPDATE => 0x1f,
        _ => 0x0f,
    }
}

/// Name part of a literal representation: an index of the combined address
/// space, or the name octets themselves.
#[derive(Debug, Clone, Copy)]
pub enum Name<'a> {
    Index(usize),
    Literal(&'a [u8]),
}

/// Encoder implementation of [HPACK].
///
/// [HPACK]: https://httpwg.org/specs/rfc7541.html
///
/// The encoder owns the sender-side dynamic table and keeps it synchronized
/// with the peer as a side effect of encoding. Output is appended to a
/// caller-provided `Vec<u8>`; the encoder never rewinds it.
pub struct HpackEncoder {
    table: DynamicTable,
    use_cache: bool,
    use_huffman: bool,
}

impl HpackEncoder {
    /// Creates a `HpackEncoder` with the given max dynamic table size.
    /// `use_cache` selects incremental indexing for literals so repeated
    /// headers compress to an index; `use_huffman` selects Huffman coding
    /// for string literals.
    pub fn new(max_size: usize, use_cache: bool, use_huffman: bool) -> Self {
        Self {
            table: DynamicTable::with_max_size(max_size),
            use_cache,
            use_huffman,
        }
    }

    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DynamicTable {
        &mut self.table
    }

    /// Encodes one header, choosing the smallest representation:
    ///
    /// 1. A static `(name, value)` match is sent fully indexed.
    /// 2. A dynamic `(name, value)` match is sent fully indexed.
    /// 3. A name match in either table (static preferred) is sent as a
    ///    literal with an indexed name, with incremental indexing when the
    ///    cache is enabled.
    /// 4. Otherwise a literal with a new name is sent, same cache choice.
    pub fn encode(&mut self, name: &[u8], value: &[u8], dst: &mut Vec<u8>) {
        let result = TableSearcher::new(&self.table).find(name, value);
        if result.value_indexed {
            emit_indexed(result.name_index, dst);
            return;
        }
        if result.is_found() {
            if self.use_cache {
                emit_literal_indexed(
                    WITH_INDEXING,
                    result.name_index,
                    value,
                    self.use_huffman,
                    dst,
                );
                self.table.add_entry(name, value);
            } else {
                emit_literal_indexed(
                    WITHOUT_INDEXING,
                    result.name_index,
                    value,
                    self.use_huffman,
                    dst,
                );
            }
            return;
        }
        if self.use_cache {
            emit_literal_new_name(WITH_INDEXING, name, value, self.use_huffman, dst);
            self.table.add_entry(name, value);
        } else {
            emit_literal_new_name(WITHOUT_INDEXING, name, value, self.use_huffman, dst);
        }
    }

    /// Like [`HpackEncoder::encode`], but the header name is given as an
    /// index of the combined address space.
    pub fn encode_indexed_name(
        &mut self,
        name_index: usize,
        value: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        let result = TableSearcher::new(&self.table)
            .find_indexed(name_index, value)
            .ok_or(ProtocolError::InvalidIndex)?;
        if result.value_indexed {
            emit_indexed(result.name_index, dst);
            return Ok(());
        }
        if self.use_cache {
            let name = self.resolve_name(name_index)?;
            emit_literal_indexed(WITH_INDEXING, result.name_index, value, self.use_huffman, dst);
            self.table.add_entry(&name, value);
        } else {
            emit_literal_indexed(
                WITHOUT_INDEXING,
                result.name_index,
                value,
                self.use_huffman,
                dst,
            );
        }
        Ok(())
    }

    /// Encodes every header of an ordered sequence.
    pub fn encode_headers_block<I, N, V>(&mut self, headers: I, dst: &mut Vec<u8>)
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        for (name, value) in headers {
            self.encode(name.as_ref(), value.as_ref(), dst);
        }
    }

    /// Encodes a header whose name and value are both table entries.
    /// `header_index` must be a valid index of the combined address space.
    pub fn encode_header_fully_indexed(
        &self,
        header_index: usize,
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        if header_index == 0 || header_index > self.table.current_max_index() {
            return Err(ProtocolError::InvalidIndex.into());
        }
        emit_indexed(header_index, dst);
        Ok(())
    }

    /// Encodes a literal with incremental indexing and inserts the header
    /// into the dynamic table.
    ///
    /// Calling this again for the same header will not use the new cache
    /// entry; it inserts another copy and evicts older entries instead. Use
    /// [`HpackEncoder::encode_with_cache`] for repeated headers.
    pub fn encode_header_and_cache(
        &mut self,
        name: Name<'_>,
        value: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        match name {
            Name::Index(index) => {
                let name = self.resolve_name(index)?;
                emit_literal_indexed(WITH_INDEXING, index, value, self.use_huffman, dst);
                self.table.add_entry(&name, value);
            }
            Name::Literal(name) => {
                emit_literal_new_name(WITH_INDEXING, name, value, self.use_huffman, dst);
                self.table.add_entry(name, value);
            }
        }
        Ok(())
    }

    /// Encodes a header like [`HpackEncoder::encode_header_and_cache`], but
    /// reuses the cache it creates, so repeated calls compress to a single
    /// index.
    ///
    /// Searches the dynamic table only; for headers of the static table
    /// [`HpackEncoder::encode_header_fully_indexed`] is the better choice.
    pub fn encode_with_cache(
        &mut self,
        name: Name<'_>,
        value: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        let result = match name {
            Name::Literal(name) => self.table.find(name, value),
            Name::Index(index) => {
                let name = self.resolve_name(index)?;
                self.table.find(&name, value)
            }
        };
        if result.value_indexed {
            emit_indexed(result.name_index, dst);
            return Ok(());
        }
        self.encode_header_and_cache(name, value, dst)
    }

    /// Encodes a literal that does not alter the dynamic table.
    pub fn encode_header_without_indexing(
        &self,
        name: Name<'_>,
        value: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        self.emit_literal(WITHOUT_INDEXING, name, value, dst)
    }

    /// Encodes a literal that does not alter the dynamic table and must be
    /// re-encoded literally by every intermediary, protecting sensitive
    /// values from compression probing.
    pub fn encode_header_never_indexing(
        &self,
        name: Name<'_>,
        value: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        self.emit_literal(NEVER_INDEXED, name, value, dst)
    }

    /// Applies a new dynamic table size and emits the size update
    /// instruction. Fails without writing when `new_max_size` exceeds the
    /// protocol ceiling.
    ///
    /// RFC7541-6.3: the update must occur at the beginning of the first
    /// header block following the change.
    pub fn encode_dynamic_table_size_update(
        &mut self,
        new_max_size: usize,
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        self.table.update_size(new_max_size)?;
        encode_integer(new_max_size, prefix_mask(SIZE_UPDATE), SIZE_UPDATE, dst);
        Ok(())
    }

    /// Encodes the `:status` pseudo header of a response. The seven common
    /// codes map to static table entries; any other code is cached, since a
    /// server is likely to send it again.
    pub fn encode_status(&mut self, code: u16, dst: &mut Vec<u8>) {
        if let Some(index) = StaticTable::status_index(code) {
            emit_indexed(index, dst);
            return;
        }
        let value = code.to_string();
        let result = self.table.find(b":status", value.as_bytes());
        if result.value_indexed {
            emit_indexed(result.name_index, dst);
            return;
        }
        emit_literal_indexed(
            WITH_INDEXING,
            StaticTable::STATUS,
            value.as_bytes(),
            self.use_huffman,
            dst,
        );
        self.table.add_entry(b":status", value.as_bytes());
    }

    fn emit_literal(
        &self,
        pre: u8,
        name: Name<'_>,
        value: &[u8],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        match name {
            Name::Index(index) => {
                if index == 0 || index > self.table.current_max_index() {
                    return Err(ProtocolError::InvalidIndex.into());
                }
                emit_literal_indexed(pre, index, value, self.use_huffman, dst);
            }
            Name::Literal(name) => {
                emit_literal_new_name(pre, name, value, self.use_huffman, dst);
            }
        }
        Ok(())
    }

    /// Resolves an index to an owned copy of its name. The copy is needed
    /// wherever an insertion follows, which may evict the entry behind the
    /// index.
    fn resolve_name(&self, index: usize) -> Result<Vec<u8>, HpackError> {
        TableSearcher::new(&self.table)
            .search_header_name(index)
            .map(|name| name.to_vec())
            .ok_or(HpackError::Protocol(ProtocolError::InvalidIndex))
    }
}

impl Default for HpackEncoder {
    fn default() -> Self {
        // 4096 is the default SETTINGS_HEADER_TABLE_SIZE in HTTP/2
        Self::new(4096, false, false)
    }
}

fn emit_indexed(index: usize, dst: &mut Vec<u8>) {
    encode_integer(index, prefix_mask(INDEXED), INDEXED, dst);
}

fn emit_literal_indexed(pre: u8, name_index: usize, value: &[u8], huffman: bool, dst: &mut Vec<u8>) {
    encode_integer(name_index, prefix_mask(pre), pre, dst);
    encode_string(value, huffman, dst);
}

fn emit_literal_new_name(pre: u8, name: &[u8], value: &[u8], huffman: bool, dst: &mut Vec<u8>) {
    dst.push(pre);
    encode_string(name, huffman, dst);
    encode_string(value, huffman, dst);
}
