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

//! Errors that may occur in this crate.
//!
//! [`HpackError`] is the single error type of the codec. It separates fatal
//! [RFC 7541] violations from input that merely ended in the middle of a
//! field representation, which a [`StreamingDecoder`] can recover from by
//! feeding more bytes.
//!
//! [RFC 7541]: https://httpwg.org/specs/rfc7541.html
//! [`StreamingDecoder`]: crate::StreamingDecoder

use core::fmt::{Debug, Display, Formatter};
use std::error::Error;

/// Errors that may occur while encoding or decoding a header block.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum HpackError {
    /// A violation of RFC 7541. Fatal for the enclosing header block; the
    /// dynamic table is left in a defined state but the block must be
    /// abandoned.
    Protocol(ProtocolError),

    /// Input ended in the middle of a field representation. `required` is a
    /// best-effort hint of how many more bytes are needed, at least 1.
    /// Recoverable through the streaming decoder.
    Incomplete { required: usize },
}

/// The RFC 7541 violations detected by the codec.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ProtocolError {
    /// An integer representation does not fit the accumulator.
    IntegerOverflow,

    /// Index 0 in an indexed context, an index past the combined address
    /// space, or a fully indexed reference to a static entry that has no
    /// canonical value.
    InvalidIndex,

    /// A dynamic table size update above the limit determined by the
    /// protocol using HPACK.
    SizeUpdateOverLimit,

    /// A dynamic table size update after the first header of a block.
    MisplacedSizeUpdate,

    /// An ill-formed Huffman code in a string literal.
    InvalidHuffmanCode,

    /// Huffman padding of 8 bits or more, or padding not formed from the
    /// EOS prefix.
    InvalidPadding,

    /// A `:status` value that is not a three-digit decimal number.
    InvalidStatus,
}

impl From<ProtocolError> for HpackError {
    fn from(error: ProtocolError) -> Self {
        HpackError::Protocol(error)
    }
}

impl Display for HpackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for HpackError {}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for ProtocolError {}

#[cfg(test)]
mod ut_error {
    use super::{HpackError, ProtocolError};

    /// UT test cases for `HpackError`.
    ///
    /// # Brief
    /// 1. Converts a `ProtocolError` into an `HpackError`.
    /// 2. Checks the `Display` and equality behavior of both kinds.
    #[test]
    fn ut_error_conversion() {
        let error: HpackError = ProtocolError::IntegerOverflow.into();
        assert_eq!(error, HpackError::Protocol(ProtocolError::IntegerOverflow));
        assert_eq!(format!("{error}"), "Protocol(IntegerOverflow)");

        let error = HpackError::Incomplete { required: 4 };
        assert_eq!(format!("{error}"), "Incomplete { required: 4 }");
    }
}
