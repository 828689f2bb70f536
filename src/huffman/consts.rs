//! Symbol tables for the static Huffman code defined in RFC 7541 Appendix B.

/// Code used to represent each symbol, `(bit count, code)`. The code occupies
/// the low bits. Index 256 is the EOS symbol.
pub(crate) const HUFFMAN_ENCODE: [(u8, u64); 257] = [
    (13, 0x1ff8), // 0
    (23, 0x7fffd8), // 1
    (28, 0xfffffe2), // 2
    (28, 0xfffffe3), // 3
    (28, 0xfffffe4), // 4
    (28, 0xfffffe5), // 5
    (28, 0xfffffe6), // 6
    (28, 0xfffffe7), // 7
    (28, 0xfffffe8), // 8
    (24, 0xffffea), // 9
    (30, 0x3ffffffc), // 10
    (28, 0xfffffe9), // 11
    (28, 0xfffffea), // 12
    (30, 0x3ffffffd), // 13
    (28, 0xfffffeb), // 14
    (28, 0xfffffec), // 15
    (28, 0xfffffed), // 16
    (28, 0xfffffee), // 17
    (28, 0xfffffef), // 18
    (28, 0xffffff0), // 19
    (28, 0xffffff1), // 20
    (28, 0xffffff2), // 21
    (30, 0x3ffffffe), // 22
    (28, 0xffffff3), // 23
    (28, 0xffffff4), // 24
    (28, 0xffffff5), // 25
    (28, 0xffffff6), // 26
    (28, 0xffffff7), // 27
    (28, 0xffffff8), // 28
    (28, 0xffffff9), // 29
    (28, 0xffffffa), // 30
    (28, 0xffffffb), // 31
    (6, 0x14), // 32 ' '
    (10, 0x3f8), // 33 '!'
    (10, 0x3f9), // 34 '"'
    (12, 0xffa), // 35 '#'
    (13, 0x1ff9), // 36 '$'
    (6, 0x15), // 37 '%'
    (8, 0xf8), // 38 '&'
    (11, 0x7fa), // 39 (quote)
    (10, 0x3fa), // 40 '('
    (10, 0x3fb), // 41 ')'
    (8, 0xf9), // 42 '*'
    (11, 0x7fb), // 43 '+'
    (8, 0xfa), // 44 ','
    (6, 0x16), // 45 '-'
    (6, 0x17), // 46 '.'
    (6, 0x18), // 47 '/'
    (5, 0x0), // 48 '0'
    (5, 0x1), // 49 '1'
    (5, 0x2), // 50 '2'
    (6, 0x19), // 51 '3'
    (6, 0x1a), // 52 '4'
    (6, 0x1b), // 53 '5'
    (6, 0x1c), // 54 '6'
    (6, 0x1d), // 55 '7'
    (6, 0x1e), // 56 '8'
    (6, 0x1f), // 57 '9'
    (7, 0x5c), // 58 ':'
    (8, 0xfb), // 59 ';'
    (15, 0x7ffc), // 60 '<'
    (6, 0x20), // 61 '='
    (12, 0xffb), // 62 '>'
    (10, 0x3fc), // 63 '?'
    (13, 0x1ffa), // 64 '@'
    (6, 0x21), // 65 'A'
    (7, 0x5d), // 66 'B'
    (7, 0x5e), // 67 'C'
    (7, 0x5f), // 68 'D'
    (7, 0x60), // 69 'E'
    (7, 0x61), // 70 'F'
    (7, 0x62), // 71 'G'
    (7, 0x63), // 72 'H'
    (7, 0x64), // 73 'I'
    (7, 0x65), // 74 'J'
    (7, 0x66), // 75 'K'
    (7, 0x67), // 76 'L'
    (7, 0x68), // 77 'M'
    (7, 0x69), // 78 'N'
    (7, 0x6a), // 79 'O'
    (7, 0x6b), // 80 'P'
    (7, 0x6c), // 81 'Q'
    (7, 0x6d), // 82 'R'
    (7, 0x6e), // 83 'S'
    (7, 0x6f), // 84 'T'
    (7, 0x70), // 85 'U'
    (7, 0x71), // 86 'V'
    (7, 0x72), // 87 'W'
    (8, 0xfc), // 88 'X'
    (7, 0x73), // 89 'Y'
    (8, 0xfd), // 90 'Z'
    (13, 0x1ffb), // 91 '['
    (19, 0x7fff0), // 92 '\\'
    (13, 0x1ffc), // 93 ']'
    (14, 0x3ffc), // 94 '^'
    (6, 0x22), // 95 '_'
    (15, 0x7ffd), // 96 '`'
    (5, 0x3), // 97 'a'
    (6, 0x23), // 98 'b'
    (5, 0x4), // 99 'c'
    (6, 0x24), // 100 'd'
    (5, 0x5), // 101 'e'
    (6, 0x25), // 102 'f'
    (6, 0x26), // 103 'g'
    (6, 0x27), // 104 'h'
    (5, 0x6), // 105 'i'
    (7, 0x74), // 106 'j'
    (7, 0x75), // 107 'k'
    (6, 0x28), // 108 'l'
    (6, 0x29), // 109 'm'
    (6, 0x2a), // 110 'n'
    (5, 0x7), // 111 'o'
    (6, 0x2b), // 112 'p'
    (7, 0x76), // 113 'q'
    (6, 0x2c), // 114 'r'
    (5, 0x8), // 115 's'
    (5, 0x9), // 116 't'
    (6, 0x2d), // 117 'u'
    (7, 0x77), // 118 'v'
    (7, 0x78), // 119 'w'
    (7, 0x79), // 120 'x'
    (7, 0x7a), // 121 'y'
    (7, 0x7b), // 122 'z'
    (15, 0x7ffe), // 123 '{'
    (11, 0x7fc), // 124 '|'
    (14, 0x3ffd), // 125 '}'
    (13, 0x1ffd), // 126 '~'
    (28, 0xffffffc), // 127
    (20, 0xfffe6), // 128
    (22, 0x3fffd2), // 129
    (20, 0xfffe7), // 130
    (20, 0xfffe8), // 131
    (22, 0x3fffd3), // 132
    (22, 0x3fffd4), // 133
    (22, 0x3fffd5), // 134
    (23, 0x7fffd9), // 135
    (22, 0x3fffd6), // 136
    (23, 0x7fffda), // 137
    (23, 0x7fffdb), // 138
    (23, 0x7fffdc), // 139
    (23, 0x7fffdd), // 140
    (23, 0x7fffde), // 141
    (24, 0xffffeb), // 142
    (23, 0x7fffdf), // 143
    (24, 0xffffec), // 144
    (24, 0xffffed), // 145
    (22, 0x3fffd7), // 146
    (23, 0x7fffe0), // 147
    (24, 0xffffee), // 148
    (23, 0x7fffe1), // 149
    (23, 0x7fffe2), // 150
    (23, 0x7fffe3), // 151
    (23, 0x7fffe4), // 152
    (21, 0x1fffdc), // 153
    (22, 0x3fffd8), // 154
    (23, 0x7fffe5), // 155
    (22, 0x3fffd9), // 156
    (23, 0x7fffe6), // 157
    (23, 0x7fffe7), // 158
    (24, 0xffffef), // 159
    (22, 0x3fffda), // 160
    (21, 0x1fffdd), // 161
    (20, 0xfffe9), // 162
    (22, 0x3fffdb), // 163
    (22, 0x3fffdc), // 164
    (23, 0x7fffe8), // 165
    (23, 0x7fffe9), // 166
    (21, 0x1fffde), // 167
    (23, 0x7fffea), // 168
    (22, 0x3fffdd), // 169
    (22, 0x3fffde), // 170
    (24, 0xfffff0), // 171
    (21, 0x1fffdf), // 172
    (22, 0x3fffdf), // 173
    (23, 0x7fffeb), // 174
    (23, 0x7fffec), // 175
    (21, 0x1fffe0), // 176
    (21, 0x1fffe1), // 177
    (22, 0x3fffe0), // 178
    (21, 0x1fffe2), // 179
    (23, 0x7fffed), // 180
    (22, 0x3fffe1), // 181
    (23, 0x7fffee), // 182
    (23, 0x7fffef), // 183
    (20, 0xfffea), // 184
    (22, 0x3fffe2), // 185
    (22, 0x3fffe3), // 186
    (22, 0x3fffe4), // 187
    (23, 0x7ffff0), // 188
    (22, 0x3fffe5), // 189
    (22, 0x3fffe6), // 190
    (23, 0x7ffff1), // 191
    (26, 0x3ffffe0), // 192
    (26, 0x3ffffe1), // 193
    (20, 0xfffeb), // 194
    (19, 0x7fff1), // 195
    (22, 0x3fffe7), // 196
    (23, 0x7ffff2), // 197
    (22, 0x3fffe8), // 198
    (25, 0x1ffffec), // 199
    (26, 0x3ffffe2), // 200
    (26, 0x3ffffe3), // 201
    (26, 0x3ffffe4), // 202
    (27, 0x7ffffde), // 203
    (27, 0x7ffffdf), // 204
    (26, 0x3ffffe5), // 205
    (24, 0xfffff1), // 206
    (25, 0x1ffffed), // 207
    (19, 0x7fff2), // 208
    (21, 0x1fffe3), // 209
    (26, 0x3ffffe6), // 210
    (27, 0x7ffffe0), // 211
    (27, 0x7ffffe1), // 212
    (26, 0x3ffffe7), // 213
    (27, 0x7ffffe2), // 214
    (24, 0xfffff2), // 215
    (21, 0x1fffe4), // 216
    (21, 0x1fffe5), // 217
    (26, 0x3ffffe8), // 218
    (26, 0x3ffffe9), // 219
    (28, 0xffffffd), // 220
    (27, 0x7ffffe3), // 221
    (27, 0x7ffffe4), // 222
    (27, 0x7ffffe5), // 223
    (20, 0xfffec), // 224
    (24, 0xfffff3), // 225
    (20, 0xfffed), // 226
    (21, 0x1fffe6), // 227
    (22, 0x3fffe9), // 228
    (21, 0x1fffe7), // 229
    (21, 0x1fffe8), // 230
    (23, 0x7ffff3), // 231
    (22, 0x3fffea), // 232
    (22, 0x3fffeb), // 233
    (25, 0x1ffffee), // 234
    (25, 0x1ffffef), // 235
    (24, 0xfffff4), // 236
    (24, 0xfffff5), // 237
    (26, 0x3ffffea), // 238
    (23, 0x7ffff4), // 239
    (26, 0x3ffffeb), // 240
    (27, 0x7ffffe6), // 241
    (26, 0x3ffffec), // 242
    (26, 0x3ffffed), // 243
    (27, 0x7ffffe7), // 244
    (27, 0x7ffffe8), // 245
    (27, 0x7ffffe9), // 246
    (27, 0x7ffffea), // 247
    (27, 0x7ffffeb), // 248
    (28, 0xffffffe), // 249
    (27, 0x7ffffec), // 250
    (27, 0x7ffffed), // 251
    (27, 0x7ffffee), // 252
    (27, 0x7ffffef), // 253
    (27, 0x7fffff0), // 254
    (26, 0x3ffffee), // 255
    (30, 0x3fffffff), // EOS
];

/// Codes grouped by bit count, `(bit count, first code, symbols)`. The code is
/// canonical, so codes of equal length are consecutive and a symbol is found by
/// offset from the first code of its length.
pub(crate) const HUFFMAN_DECODE: [(u8, u32, &[u16]); 21] = [
    (5, 0x0, &[48, 49, 50, 97, 99, 101, 105, 111, 115, 116]),
    (6, 0x14, &[32, 37, 45, 46, 47, 51, 52, 53, 54, 55, 56, 57, 61, 65, 95, 98, 100, 102, 103, 104, 108, 109, 110, 112, 114, 117]),
    (7, 0x5c, &[58, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83, 84, 85, 86, 87, 89, 106, 107, 113, 118, 119, 120, 121, 122]),
    (8, 0xf8, &[38, 42, 44, 59, 88, 90]),
    (10, 0x3f8, &[33, 34, 40, 41, 63]),
    (11, 0x7fa, &[39, 43, 124]),
    (12, 0xffa, &[35, 62]),
    (13, 0x1ff8, &[0, 36, 64, 91, 93, 126]),
    (14, 0x3ffc, &[94, 125]),
    (15, 0x7ffc, &[60, 96, 123]),
    (19, 0x7fff0, &[92, 195, 208]),
    (20, 0xfffe6, &[128, 130, 131, 162, 184, 194, 224, 226]),
    (21, 0x1fffdc, &[153, 161, 167, 172, 176, 177, 179, 209, 216, 217, 227, 229, 230]),
    (22, 0x3fffd2, &[129, 132, 133, 134, 136, 146, 154, 156, 160, 163, 164, 169, 170, 173, 178, 181, 185, 186, 187, 189, 190, 196, 198, 228, 232, 233]),
    (23, 0x7fffd8, &[1, 135, 137, 138, 139, 140, 141, 143, 147, 149, 150, 151, 152, 155, 157, 158, 165, 166, 168, 174, 175, 180, 182, 183, 188, 191, 197, 231, 239]),
    (24, 0xffffea, &[9, 142, 144, 145, 148, 159, 171, 206, 215, 225, 236, 237]),
    (25, 0x1ffffec, &[199, 207, 234, 235]),
    (26, 0x3ffffe0, &[192, 193, 200, 201, 202, 205, 210, 213, 218, 219, 238, 240, 242, 243, 255]),
    (27, 0x7ffffde, &[203, 204, 211, 212, 214, 221, 222, 223, 241, 244, 245, 246, 247, 248, 250, 251, 252, 253, 254]),
    (28, 0xfffffe2, &[2, 3, 4, 5, 6, 7, 8, 11, 12, 14, 15, 16, 17, 18, 19, 20, 21, 23, 24, 25, 26, 27, 28, 29, 30, 31, 127, 220, 249]),
    (30, 0x3ffffffc, &[10, 13, 22, 256]),
];
