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

//! [String Literal Representation] implementation of [HPACK].
//!
//! [String Literal Representation]: https://httpwg.org/specs/rfc7541.html#string.literal.representation
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! # Binary Format
//! ```text
//!   0   1   2   3   4   5   6   7
//! +---+---+---+---+---+---+---+---+
//! | H |    String Length (7+)     |
//! +---+---------------------------+
//! |  String Data (Length octets)  |
//! +-------------------------------+
//! ```
//! `H = 1` indicates that the octets are Huffman encoded; the length is the
//! octet count on the wire.

use crate::error::HpackError;
use crate::huffman::{huffman_decode, huffman_encode, huffman_encoded_len};
use crate::integer::{decode_integer, encode_integer};

/// Encodes `src` as a string literal, Huffman coded when `huffman` is set.
pub(crate) fn encode_string(src: &[u8], huffman: bool, dst: &mut Vec<u8>) {
    if huffman {
        encode_integer(huffman_encoded_len(src), 0x7f, 0x80, dst);
        huffman_encode(src, dst);
    } else {
        encode_integer(src.len(), 0x7f, 0x00, dst);
        dst.extend_from_slice(src);
    }
}

/// Scratch buffer a decoder presents decoded octets from. Raw literals alias
/// the input span and never touch it; Huffman literals are decoded into it.
/// The allocation is kept across decodes and its capacity is rounded up to a
/// power of two.
pub(crate) struct DecodedString {
    vec: Vec<u8>,
}

impl DecodedString {
    /// Creates a new, empty `DecodedString`.
    pub(crate) fn new() -> Self {
        Self { vec: Vec::new() }
    }

    /// Decodes a Huffman literal into the scratch buffer.
    pub(crate) fn decode_huffman(&mut self, src: &[u8]) -> Result<&[u8], HpackError> {
        self.vec.clear();
        // The shortest code is 5 bits, so the decoded string cannot exceed
        // 8/5 of the encoded length.
        let worst = src.len() * 8 / 5;
        if self.vec.capacity() < worst {
            self.vec.reserve_exact(worst.next_power_of_two());
        }
        huffman_decode(src, &mut self.vec)?;
        Ok(&self.vec)
    }

    /// Copies `src` into the scratch buffer, returning the stored octets.
    pub(crate) fn store(&mut self, src: &[u8]) -> &[u8] {
        self.vec.clear();
        self.vec.extend_from_slice(src);
        &self.vec
    }

    pub(crate) fn bytes_allocated(&self) -> usize {
        self.vec.capacity()
    }
}

/// Decodes a string literal starting at `buf[*pos]`, advancing the cursor
/// past it. Raw literals are returned as a subslice of `buf` without
/// copying; Huffman literals are decoded into `scratch`.
pub(crate) fn decode_string<'a>(
    buf: &'a [u8],
    pos: &mut usize,
    scratch: &'a mut DecodedString,
) -> Result<&'a [u8], HpackError> {
    if *pos >= buf.len() {
        return Err(HpackError::Incomplete { required: 1 });
    }
    let huffman = (buf[*pos] & 0x80) == 0x80;
    let len = decode_integer(buf, pos, 0x7f)?;
    let remaining = buf.len() - *pos;
    if len > remaining {
        return Err(HpackError::Incomplete {
            required: len - remaining,
        });
    }
    let octets = &buf[*pos..*pos + len];
    *pos += len;
    if huffman {
        scratch.decode_huffman(octets)
    } else {
        Ok(octets)
    }
}
