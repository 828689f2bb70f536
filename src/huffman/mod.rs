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

//! [Huffman coding] implementation of [HPACK].
//!
//! [Huffman coding]: https://en.wikipedia.org/wiki/Huffman_coding
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! # Huffman code in HTTP/2
//! There is a table of Huffman code in `RFC7541`. This [Huffman code] was
//! generated from statistics obtained on a large sample of HTTP headers. It
//! is a canonical Huffman code with some tweaking to ensure that no symbol
//! has a unique code length.
//!
//! Each string literal carries its encoded octet length on the wire, so the
//! encoder computes the bit length of the output up front and the decoder
//! walks the bits of exactly that many octets.
//!
//! [Huffman code]: https://www.rfc-editor.org/rfc/rfc7541.html#ref-HUFFMAN

mod consts;

use core::cmp::Ordering;

use consts::{HUFFMAN_DECODE, HUFFMAN_ENCODE};

use crate::error::{HpackError, ProtocolError};

/// Returns the number of octets `src` occupies once Huffman encoded, with
/// the final partial octet padded.
pub(crate) fn huffman_encoded_len(src: &[u8]) -> usize {
    let bits: usize = src
        .iter()
        .map(|byte| HUFFMAN_ENCODE[*byte as usize].0 as usize)
        .sum();
    (bits + 7) / 8
}

/// Converts a string to a Huffman code, and then puts it into the specified
/// `Vec<u8>`.
pub(crate) fn huffman_encode(src: &[u8], dst: &mut Vec<u8>) {
    // `state` holds up to 64 bits of encoded output, filled from the high
    // end. `unfilled` is the number of bits not yet occupied. Whenever a
    // symbol does not fit, the full 64 bits are flushed and the symbol's
    // remaining low bits are carried over into the next `state`.
    let mut state = 0u64;
    let mut unfilled = 64;

    for byte in src.iter() {
        let (nbits, code) = HUFFMAN_ENCODE[*byte as usize];
        match unfilled.cmp(&nbits) {
            Ordering::Greater => {
                state |= code << (unfilled - nbits);
                unfilled -= nbits;
            }
            Ordering::Equal => {
                state |= code;
                dst.extend_from_slice(&state.to_be_bytes());
                state = 0;
                unfilled = 64;
            }
            // Rotating the code right by its overhang makes its high part
            // land in the low bits of `state` and its low part land in the
            // high bits of the next `state`.
            Ordering::Less => {
                let rotate = code.rotate_right((nbits - unfilled) as u32);
                let mask = u64::MAX >> (64 - unfilled);
                state |= rotate & mask;
                dst.extend_from_slice(&state.to_be_bytes());
                state = rotate & !mask;
                unfilled = 64 - (nbits - unfilled);
            }
        }
    }

    // The last partial octet is padded with the most significant bits of the
    // EOS symbol, which are all ones.
    if unfilled != 64 {
        state |= u64::MAX >> (64 - unfilled);
        let len = (8 - (unfilled >> 3)) as usize;
        dst.extend_from_slice(&state.to_be_bytes()[..len]);
    }
}

/// Looks a code up in the canonical table. Codes of equal bit count are
/// consecutive, so a symbol is its offset from the first code of its length.
pub(crate) fn table_find(bits: u32, bit_count: u8) -> Option<u16> {
    for &(count, first, symbols) in HUFFMAN_DECODE.iter() {
        match count.cmp(&bit_count) {
            Ordering::Less => {}
            Ordering::Equal => {
                return symbols.get(bits.wrapping_sub(first) as usize).copied();
            }
            Ordering::Greater => return None,
        }
    }
    None
}

/// Converts a Huffman code into a literal string, and then puts it into the
/// specified `Vec<u8>`.
///
/// Bits are consumed MSB-first into a candidate code, starting at the 5-bit
/// minimum code length and extending by one bit per failed lookup. The
/// explicit EOS symbol terminates the string; everything after it inside the
/// same literal is padding. A trailing fragment must be a strict prefix of
/// EOS, shorter than 8 bits.
pub(crate) fn huffman_decode(src: &[u8], dst: &mut Vec<u8>) -> Result<(), HpackError> {
    let mut bits = 0u32;
    let mut bit_count = 0u8;

    for byte in src.iter() {
        for shift in (0..8).rev() {
            bits = (bits << 1) | u32::from((byte >> shift) & 1);
            bit_count += 1;
            if bit_count < 5 {
                continue;
            }
            match table_find(bits, bit_count) {
                Some(256) => return Ok(()),
                Some(sym) => {
                    dst.push(sym as u8);
                    bits = 0;
                    bit_count = 0;
                }
                // The code space is complete at 30 bits, so a miss there
                // means the lookup table and the input disagree.
                None if bit_count == 30 => {
                    return Err(ProtocolError::InvalidHuffmanCode.into());
                }
                None => {}
            }
        }
    }

    if bit_count != 0 && (bit_count >= 8 || bits != (1 << bit_count) - 1) {
        return Err(ProtocolError::InvalidPadding.into());
    }
    Ok(())
}
