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

//! Helpers shared by the integration tests.

/// Converts a hex string into bytes, panicking on malformed input.
pub fn decode_hex(str: &str) -> Vec<u8> {
    assert!(str.len() % 2 == 0, "hex string with odd length");
    let mut vec = Vec::new();
    let mut remained = str;
    while !remained.is_empty() {
        let (left, right) = remained.split_at(2);
        vec.push(u8::from_str_radix(left, 16).expect("hex string with invalid digit"));
        remained = right;
    }
    vec
}

/// Decodes a whole header block into owned `(name, value)` pairs.
pub fn collect_block(
    decoder: &mut ylong_hpack::HpackDecoder,
    bytes: &[u8],
) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut headers = Vec::new();
    decoder
        .decode_headers_block(bytes, |n, v| headers.push((n.to_vec(), v.to_vec())))
        .unwrap();
    headers
}
