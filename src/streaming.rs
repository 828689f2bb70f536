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

//! Streaming decoder of [HPACK] header blocks.
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! A header block arriving from the network is rarely delivered in one
//! piece. [`StreamingDecoder`] accepts it in arbitrary chunks: whenever a
//! chunk ends in the middle of a field representation, the unparsed tail is
//! retained and decoding restarts from the beginning of that representation
//! once more bytes arrive. The restart is safe because the wrapped decoder
//! only touches the dynamic table after a representation has parsed
//! completely.

use core::mem::take;

use crate::decoder::HpackDecoder;
use crate::error::HpackError;

/// Decoder adapter that accepts a header block in arbitrary chunks.
pub struct StreamingDecoder {
    decoder: HpackDecoder,
    pending: Vec<u8>,
}

impl StreamingDecoder {
    /// Creates a `StreamingDecoder` with the given max dynamic table size.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            decoder: HpackDecoder::with_max_size(max_size),
            pending: Vec::new(),
        }
    }

    pub fn decoder(&self) -> &HpackDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut HpackDecoder {
        &mut self.decoder
    }

    /// Size of the unparsed tail held from earlier chunks.
    pub fn pending_data_size(&self) -> usize {
        self.pending.len()
    }

    /// Drops the held tail and re-arms the block-start rule.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.decoder.finish_header_block();
    }

    /// Appends `chunk` to any held tail and decodes headers greedily,
    /// invoking `visitor(name, value)` for each one. Returns a hint of how
    /// many bytes the current representation still needs, or 0 once the
    /// input is fully drained. With `last_chunk` set, input ending
    /// mid-representation is an error and a drained input finishes the
    /// header block.
    pub fn feed<V>(
        &mut self,
        chunk: &[u8],
        last_chunk: bool,
        visitor: &mut V,
    ) -> Result<usize, HpackError>
    where
        V: FnMut(&[u8], &[u8]),
    {
        let mut held = take(&mut self.pending);
        let buf: &[u8] = if held.is_empty() {
            chunk
        } else {
            held.extend_from_slice(chunk);
            &held
        };

        let mut pos = 0;
        loop {
            if pos >= buf.len() {
                if last_chunk {
                    self.decoder.finish_header_block();
                }
                return Ok(0);
            }
            let start = pos;
            match self.decoder.decode_header(buf, &mut pos) {
                Ok(Some(header)) => visitor(header.name, header.value),
                Ok(None) => {}
                Err(HpackError::Incomplete { required }) => {
                    if last_chunk {
                        return Err(HpackError::Incomplete { required });
                    }
                    self.pending = buf[start..].to_vec();
                    return Ok(required);
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for StreamingDecoder {
    fn default() -> Self {
        // 4096 is the default SETTINGS_HEADER_TABLE_SIZE in HTTP/2
        Self::with_max_size(4096)
    }
}
