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

//! [Integer Representation] implementation of [HPACK].
//!
//! [Integer Representation]: https://httpwg.org/specs/rfc7541.html#integer.representation
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! An integer fills the low `N` prefix bits of its first octet; the high
//! `8 - N` bits carry the representation marker chosen by the caller. A
//! value too large for the prefix continues in septets, least significant
//! first, with the high bit of each octet flagging another one to come:
//!
//! ```text
//!   0   1   2   3   4   5   6   7
//! +---+---+---+---+---+---+---+---+
//! | marker  |    Value (N bits)   |
//! +---+---+---+-------------------+
//! | 1 |    Value continued (7)    |
//! +---+---------------------------+
//! | 0 |    Value continued (7)    |
//! +---+---------------------------+
//! ```

use crate::error::{HpackError, ProtocolError};

/// Appends `i` to `dst` in the prefix given by `mask`, merging the prefix
/// bits into `pre`, the representation marker byte.
pub(crate) fn encode_integer(i: usize, mask: u8, pre: u8, dst: &mut Vec<u8>) {
    if i < mask as usize {
        dst.push(pre | i as u8);
        return;
    }
    dst.push(pre | mask);
    let mut rest = i - mask as usize;
    while rest >= 128 {
        dst.push(0x80 | (rest & 0x7f) as u8);
        rest >>= 7;
    }
    dst.push(rest as u8);
}

/// Decodes a prefix integer starting at `buf[*pos]`, advancing the cursor
/// past it. The marker bits outside `mask` are ignored.
pub(crate) fn decode_integer(buf: &[u8], pos: &mut usize, mask: u8) -> Result<usize, HpackError> {
    if *pos >= buf.len() {
        return Err(HpackError::Incomplete { required: 1 });
    }
    let prefix = buf[*pos] & mask;
    *pos += 1;
    if prefix < mask {
        return Ok(prefix as usize);
    }

    // a saturated prefix continues with septets weighted by 2^shift
    let mut value = mask as usize;
    let mut shift = 0u32;
    loop {
        if *pos >= buf.len() {
            return Err(HpackError::Incomplete { required: 1 });
        }
        let byte = buf[*pos];
        *pos += 1;
        if shift >= usize::BITS {
            return Err(ProtocolError::IntegerOverflow.into());
        }
        let step = ((byte & 0x7f) as usize)
            .checked_mul(1 << shift)
            .ok_or(HpackError::Protocol(ProtocolError::IntegerOverflow))?;
        value = value
            .checked_add(step)
            .ok_or(HpackError::Protocol(ProtocolError::IntegerOverflow))?;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

#[cfg(test)]
mod ut_integer {
    use super::{decode_integer, encode_integer};
    use crate::error::{HpackError, ProtocolError};

    /// UT test cases for `encode_integer`.
    ///
    /// # Brief
    /// 1. Encodes the RFC7541 C.1 examples.
    /// 2. Checks the emitted bytes, including preserved marker bits.
    #[test]
    fn ut_integer_encode() {
        fn encoded(i: usize, mask: u8, pre: u8) -> Vec<u8> {
            let mut dst = Vec::new();
            encode_integer(i, mask, pre, &mut dst);
            dst
        }

        // C.1.1. Example 1: Encoding 10 Using a 5-Bit Prefix
        assert_eq!(encoded(10, 0x1f, 0x00), [0x0a]);

        // C.1.2. Example 2: Encoding 1337 Using a 5-Bit Prefix
        assert_eq!(encoded(1337, 0x1f, 0x00), [0x1f, 0x9a, 0x0a]);

        // C.1.3. Example 3: Encoding 42 Starting at an Octet Boundary
        assert_eq!(encoded(42, 0xff, 0x00), [0x2a]);

        // a set marker survives both the short and the continued form
        assert_eq!(encoded(30, 0x1f, 0x20), [0x3e]);
        assert_eq!(encoded(31, 0x1f, 0x20), [0x3f, 0x00]);
    }

    /// UT test cases for `decode_integer`.
    ///
    /// # Brief
    /// 1. Decodes the RFC7541 C.1 examples and bytes carrying marker bits.
    /// 2. Checks the values and the cursor positions.
    #[test]
    fn ut_integer_decode() {
        fn decoded(bytes: &[u8], mask: u8) -> (usize, usize) {
            let mut pos = 0;
            let value = decode_integer(bytes, &mut pos, mask).unwrap();
            (value, pos)
        }

        // C.1.1. Example 1: Decoding 10 Using a 5-Bit Prefix
        assert_eq!(decoded(&[0x0a], 0x1f), (10, 1));

        // C.1.2. Example 2: Decoding 1337 Using a 5-Bit Prefix
        assert_eq!(decoded(&[0x1f, 0x9a, 0x0a], 0x1f), (1337, 3));

        // C.1.3. Example 3: Decoding 42 Starting at an Octet Boundary
        assert_eq!(decoded(&[0x2a], 0xff), (42, 1));

        // marker bits outside the mask are ignored
        assert_eq!(decoded(&[0xbe], 0x7f), (62, 1));
        assert_eq!(decoded(&[0x3f, 0x71], 0x1f), (144, 2));

        // a non-minimal encoding still decodes
        assert_eq!(decoded(&[0x1f, 0x80, 0x00], 0x1f), (31, 3));
    }

    /// UT test cases for `encode_integer` and `decode_integer`.
    ///
    /// # Brief
    /// 1. Encodes an integer with every prefix length, checking the encoded
    ///    length against the worst case.
    /// 2. Decodes the result and checks it equals the input with the cursor
    ///    at the end.
    #[test]
    fn ut_integer_round_trip() {
        fn round_trip(i: usize, prefix: u32, expected_len: usize) {
            let mask = ((1u16 << prefix) - 1) as u8;
            let mut dst = Vec::new();
            encode_integer(i, mask, 0x00, &mut dst);
            assert_eq!(dst.len(), expected_len);
            let mut pos = 0;
            assert_eq!(decode_integer(&dst, &mut pos, mask), Ok(i));
            assert_eq!(pos, dst.len());
        }

        round_trip(0, 5, 1);
        round_trip(1, 5, 1);
        round_trip(10, 5, 1);
        round_trip(31, 5, 2);
        round_trip(32, 5, 2);
        round_trip(127, 5, 2);
        round_trip(128, 5, 2);
        round_trip(255, 8, 2);
        round_trip(256, 8, 2);
        round_trip(1337, 5, 3);
        round_trip(16383, 5, 3);
        round_trip(100000, 5, 4);
        round_trip(1048576, 5, 4);
        round_trip(u32::MAX as usize, 5, 6);
    }

    /// UT test cases for `decode_integer` error handling.
    ///
    /// # Brief
    /// 1. Decodes a continuation sequence that overflows the accumulator.
    /// 2. Decodes inputs that end in the middle of an integer.
    /// 3. Checks the returned errors.
    #[test]
    fn ut_integer_decode_invalid() {
        let mut overlong = vec![0x1f];
        overlong.extend_from_slice(&[0xff; 10]);
        let mut pos = 0;
        assert_eq!(
            decode_integer(&overlong, &mut pos, 0x1f),
            Err(HpackError::Protocol(ProtocolError::IntegerOverflow))
        );

        let mut pos = 0;
        assert_eq!(
            decode_integer(&[], &mut pos, 0x1f),
            Err(HpackError::Incomplete { required: 1 })
        );

        // 1337 with a 5-bit prefix is 0x1f 0x9a 0x0a, cut after two bytes
        let mut pos = 0;
        assert_eq!(
            decode_integer(&[0x1f, 0x9a], &mut pos, 0x1f),
            Err(HpackError::Incomplete { required: 1 })
        );
    }

    /// UT test cases for `decode_integer` with proptest.
    ///
    /// # Brief
    /// 1. Generates arbitrary integers and prefix lengths.
    /// 2. Checks that decoding an encoded integer restores it.
    #[test]
    fn ut_integer_round_trip_random() {
        use proptest::prelude::*;

        proptest!(ProptestConfig::with_cases(512), |(i in any::<u32>(), prefix in 1u32..=8)| {
            let mask = ((1u16 << prefix) - 1) as u8;
            let mut dst = Vec::new();
            encode_integer(i as usize, mask, 0x00, &mut dst);
            let mut pos = 0;
            prop_assert_eq!(decode_integer(&dst, &mut pos, mask), Ok(i as usize));
            prop_assert_eq!(pos, dst.len());
        });
    }
}
