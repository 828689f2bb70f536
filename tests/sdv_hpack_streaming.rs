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

mod common;

use common::{collect_block, decode_hex};
use ylong_hpack::{HpackDecoder, HpackError, StreamingDecoder};

/// Feeds `bytes` as one header block split into `chunk_size` pieces and
/// returns the visitor output.
fn feed_chunked(
    decoder: &mut StreamingDecoder,
    bytes: &[u8],
    chunk_size: usize,
) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut headers = Vec::new();
    let mut visitor = |n: &[u8], v: &[u8]| headers.push((n.to_vec(), v.to_vec()));
    let mut chunks = bytes.chunks(chunk_size).peekable();
    while let Some(chunk) = chunks.next() {
        let last_chunk = chunks.peek().is_none();
        decoder.feed(chunk, last_chunk, &mut visitor).unwrap();
    }
    headers
}

/// SDV test cases for chunked decoding of the C.5 response sequence.
///
/// # Brief
/// 1. Feeds the three response blocks in chunks of every size from 1 to
///    the block length.
/// 2. Checks the visitor output and table state against a single-shot
///    decoder.
#[test]
fn sdv_streaming_equals_single_shot() {
    let blocks = [
        decode_hex(
            "4803333032580770726976617465611d\
            4d6f6e2c203231204f63742032303133\
            2032303a31333a323120474d546e1768\
            747470733a2f2f7777772e6578616d70\
            6c652e636f6d",
        ),
        decode_hex("4803333037c1c0bf"),
        decode_hex(
            "88c1611d4d6f6e2c203231204f637420\
            323031332032303a31333a323220474d\
            54c05a04677a69707738666f6f3d4153\
            444a4b48514b425a584f5157454f5049\
            5541585157454f49553b206d61782d61\
            67653d333630303b2076657273696f6e\
            3d31",
        ),
    ];

    for chunk_size in 1..=8 {
        let mut streaming = StreamingDecoder::with_max_size(256);
        let mut single = HpackDecoder::with_max_size(256);
        for block in blocks.iter() {
            let streamed = feed_chunked(&mut streaming, block, chunk_size);
            let eager = collect_block(&mut single, block);
            assert_eq!(streamed, eager);
            assert_eq!(streaming.pending_data_size(), 0);
            assert_eq!(
                streaming.decoder().table().current_size(),
                single.table().current_size()
            );
        }
        assert_eq!(streaming.decoder().table().current_size(), 215);
    }
}

/// SDV test cases for chunk boundaries inside Huffman literals.
///
/// # Brief
/// 1. Feeds the C.6.1 response split inside its Huffman strings.
/// 2. Checks the decoded headers.
#[test]
fn sdv_streaming_huffman_chunks() {
    let bytes = decode_hex(
        "488264025885aec3771a4b6196d07abe\
        941054d444a8200595040b8166e082a6\
        2d1bff6e919d29ad171863c78f0b97c8\
        e9ae82ae43d3",
    );
    let expected: Vec<(Vec<u8>, Vec<u8>)> = vec![
        (b":status".to_vec(), b"302".to_vec()),
        (b"cache-control".to_vec(), b"private".to_vec()),
        (b"date".to_vec(), b"Mon, 21 Oct 2013 20:13:21 GMT".to_vec()),
        (b"location".to_vec(), b"https://www.example.com".to_vec()),
    ];

    for chunk_size in [1, 3, 7, 16] {
        let mut streaming = StreamingDecoder::with_max_size(256);
        assert_eq!(feed_chunked(&mut streaming, &bytes, chunk_size), expected);
        assert_eq!(streaming.decoder().table().current_size(), 222);
    }
}

/// SDV test cases for the bytes-needed contract across feeds.
///
/// # Brief
/// 1. Feeds a block in two pieces and follows the returned hints.
/// 2. Checks that a protocol error inside a later chunk is still raised.
#[test]
fn sdv_streaming_required_hint() {
    // C.3.1 cut inside the ":authority" value
    let bytes = decode_hex("828684410f7777772e6578616d706c652e636f6d");
    let mut streaming = StreamingDecoder::with_max_size(4096);
    let mut headers = Vec::new();
    let mut visitor = |n: &[u8], v: &[u8]| headers.push((n.to_vec(), v.to_vec()));

    let required = streaming.feed(&bytes[..8], false, &mut visitor).unwrap();
    // the value needs 15 octets, 3 arrived with the first chunk
    assert_eq!(required, 12);
    assert_eq!(streaming.pending_data_size(), 5);
    assert_eq!(streaming.feed(&bytes[8..], true, &mut visitor), Ok(0));
    assert_eq!(headers.len(), 4);

    // an index past the combined address space fails even mid-stream
    let mut streaming = StreamingDecoder::with_max_size(4096);
    let mut visitor = |_: &[u8], _: &[u8]| {};
    streaming.feed(&[0x82], false, &mut visitor).unwrap();
    assert_eq!(
        streaming.feed(&[0xbe], false, &mut visitor),
        Err(HpackError::Protocol(ylong_hpack::ProtocolError::InvalidIndex))
    );
}
