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

//! Decoder implementation of [HPACK].
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! The decoder walks a header block one field representation at a time,
//! dispatching on the high bits of the first byte in descending
//! specificity: `1…` (indexed), `01…` (incremental indexing), `001…`
//! (dynamic table size update), `0001…` (never indexed), `0000…` (without
//! indexing). The dynamic table is updated as a side effect, keeping it
//! synchronized with the peer's encoder.

use crate::error::{HpackError, ProtocolError};
use crate::integer::decode_integer;
use crate::strings::{decode_string, DecodedString};
use crate::table::{DynamicTable, StaticTable, TableSearcher, STATIC_TABLE_SIZE};

/// One decoded header field. Borrows the input span, the decoder's scratch
/// buffers, or the dynamic table; decoding the next field on the same
/// decoder releases it.
#[derive(Debug, PartialEq, Eq)]
pub struct HeaderView<'a> {
    pub name: &'a [u8],
    pub value: &'a [u8],
}

/// Decoder implementation of [HPACK].
///
/// [HPACK]: https://httpwg.org/specs/rfc7541.html
pub struct HpackDecoder {
    table: DynamicTable,
    name: DecodedString,
    value: DecodedString,
    mid_block: bool,
}

impl HpackDecoder {
    /// Creates a `HpackDecoder` with the given max dynamic table size.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            table: DynamicTable::with_max_size(max_size),
            name: DecodedString::new(),
            value: DecodedString::new(),
            mid_block: false,
        }
    }

    pub fn table(&self) -> &DynamicTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DynamicTable {
        &mut self.table
    }

    /// Marks the end of the current header block. A dynamic table size
    /// update is only accepted before the first header of a block;
    /// [`HpackDecoder::decode_headers_block`] frames blocks by itself, but
    /// callers driving [`HpackDecoder::decode_header`] directly re-arm the
    /// rule with this.
    pub fn finish_header_block(&mut self) {
        self.mid_block = false;
    }

    /// Decodes exactly one field representation starting at `buf[*pos]`,
    /// advancing the cursor past it. Returns `None` for a dynamic table
    /// size update, which carries no header.
    pub fn decode_header<'a>(
        &'a mut self,
        buf: &'a [u8],
        pos: &mut usize,
    ) -> Result<Option<HeaderView<'a>>, HpackError> {
        let Self {
            table,
            name,
            value,
            mid_block,
        } = self;

        if *pos >= buf.len() {
            return Err(HpackError::Incomplete { required: 1 });
        }
        let first = buf[*pos];

        if first & 0b1000_0000 != 0 {
            // Indexed Header Field
            let index = decode_integer(buf, pos, 0x7f)?;
            let searcher = TableSearcher::new(table);
            let (n, v) = searcher
                .search_header(index)
                .ok_or(ProtocolError::InvalidIndex)?;
            // In the dynamic table an empty value is a legitimate cached
            // header; in the static table it marks a name-only entry, which
            // cannot be referenced fully indexed.
            if index <= STATIC_TABLE_SIZE && v.is_empty() {
                return Err(ProtocolError::InvalidIndex.into());
            }
            *mid_block = true;
            return Ok(Some(HeaderView { name: n, value: v }));
        }

        if first & 0b0100_0000 != 0 {
            // Literal Header Field with Incremental Indexing
            let index = decode_integer(buf, pos, 0x3f)?;
            let n = if index == 0 {
                decode_string(buf, pos, name)?
            } else {
                // the insertion below may evict the entry behind `index`,
                // so the resolved name is copied to scratch first
                let resolved = TableSearcher::new(table)
                    .search_header_name(index)
                    .ok_or(ProtocolError::InvalidIndex)?;
                name.store(resolved)
            };
            let v = decode_string(buf, pos, value)?;
            table.add_entry(n, v);
            *mid_block = true;
            return Ok(Some(HeaderView { name: n, value: v }));
        }

        if first & 0b0010_0000 != 0 {
            // Dynamic Table Size Update
            let new_max_size = decode_integer(buf, pos, 0x1f)?;
            if *mid_block {
                return Err(ProtocolError::MisplacedSizeUpdate.into());
            }
            table.update_size(new_max_size)?;
            return Ok(None);
        }

        // Literal Header Field Never Indexed (0001) or without Indexing
        // (0000); neither alters the dynamic table.
        let index = decode_integer(buf, pos, 0x0f)?;
        let n = if index == 0 {
            decode_string(buf, pos, name)?
        } else {
            TableSearcher::new(table)
                .search_header_name(index)
                .ok_or(ProtocolError::InvalidIndex)?
        };
        let v = decode_string(buf, pos, value)?;
        *mid_block = true;
        Ok(Some(HeaderView { name: n, value: v }))
    }

    /// Decodes one complete header block, invoking `visitor(name, value)`
    /// for every header in order.
    pub fn decode_headers_block<V>(&mut self, buf: &[u8], mut visitor: V) -> Result<(), HpackError>
    where
        V: FnMut(&[u8], &[u8]),
    {
        self.mid_block = false;
        let mut pos = 0;
        while pos < buf.len() {
            if let Some(header) = self.decode_header(buf, &mut pos)? {
                visitor(header.name, header.value);
            }
        }
        self.mid_block = false;
        Ok(())
    }

    /// Decodes one complete header block for its dynamic table effects
    /// only, discarding the headers.
    pub fn ignore_headers_block(&mut self, buf: &[u8]) -> Result<(), HpackError> {
        self.decode_headers_block(buf, |_, _| {})
    }

    /// Decodes the `:status` pseudo header of a response, which is its
    /// first header field. The seven common codes are resolved without
    /// touching the header machinery; size updates before the field are
    /// applied as usual.
    pub fn decode_response_status(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
    ) -> Result<u16, HpackError> {
        if *pos >= buf.len() {
            return Err(HpackError::Incomplete { required: 1 });
        }
        if buf[*pos] & 0b1000_0000 != 0 {
            let saved = *pos;
            let index = decode_integer(buf, pos, 0x7f)?;
            if let Some(code) = StaticTable::status_code(index) {
                return Ok(code);
            }
            *pos = saved;
        }
        loop {
            if let Some(header) = self.decode_header(buf, pos)? {
                if header.name != b":status" {
                    return Err(ProtocolError::InvalidStatus.into());
                }
                return parse_status(header.value);
            }
        }
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        // 4096 is the default SETTINGS_HEADER_TABLE_SIZE in HTTP/2
        Self::with_max_size(4096)
    }
}

fn parse_status(value: &[u8]) -> Result<u16, HpackError> {
    if value.len() != 3 || !value.iter().all(u8::is_ascii_digit) {
        return Err(ProtocolError::InvalidStatus.into());
    }
    Ok(value
        .iter()
        .fold(0u16, |code, byte| code * 10 + u16::from(byte - b'0')))
}
