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

//! [HPACK] implementation for the [HTTP/2 protocol].
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//! [HTTP/2 protocol]: https://httpwg.org/specs/rfc9113.html
//!
//! # Introduction
//! In [HTTP/1.1], header fields are not compressed. As web pages have grown
//! to require dozens to hundreds of requests, the redundant header fields in
//! these requests unnecessarily consume bandwidth, measurably increasing
//! latency.
//!
//! HPACK compresses an ordered sequence of `(name, value)` header fields into
//! a compact header block and reverses the process on the peer. It exploits
//! three mechanisms: a fixed static table of common headers, a
//! peer-synchronized dynamic table acting as a sliding-window cache, and an
//! optional Huffman coding of literal octets. The format is intentionally
//! simple and inflexible, which reduces the risk of interoperability or
//! security issues due to implementation error.
//!
//! This crate provides the full codec:
//! - [`HpackEncoder`], which selects the smallest wire representation per
//!   header and maintains the sender-side dynamic table.
//! - [`HpackDecoder`], which walks a header block and reconstructs headers,
//!   maintaining the receiver-side dynamic table.
//! - [`StreamingDecoder`], which accepts a header block in arbitrary chunks
//!   and reports how many bytes it still needs.
//!
//! HPACK consumes and produces opaque header-block byte spans; HTTP/2
//! framing is out of scope.
//!
//! [HTTP/1.1]: https://www.rfc-editor.org/rfc/rfc9112.html

mod decoder;
mod encoder;
mod error;
mod huffman;
mod integer;
mod streaming;
mod strings;
mod table;

#[cfg(test)]
pub(crate) mod test_util;

pub use decoder::{HeaderView, HpackDecoder};
pub use encoder::{HpackEncoder, Name};
pub use error::{HpackError, ProtocolError};
pub use streaming::StreamingDecoder;
pub use table::{DynamicTable, FindResult};
