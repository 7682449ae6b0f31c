//! 128-bit block scan targeting SSE4.2 + PCLMULQDQ ("westmere").
//!
//! A 64-byte block is loaded as four 16-byte chunks; per-byte compares are
//! collapsed into one u64 mask via `movemask`. Blanks are matched in a single
//! pass with a nibble shuffle table: `shuffle(table, input) == input` holds
//! exactly for the bytes placed in the table.

use core::arch::x86_64::*;

use super::Block;

/// Nibble-indexed table matching space, tab and carriage return. Slots that
/// must never match hold 0x80: a shuffle index with the high bit set yields
/// zero, and zero never equals a byte with the high bit set.
const BLANK: [u8; 16] = [
    0x20, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, //
    0x80, 0x09, 0x80, 0x80, 0x80, 0x0d, 0x80, 0x80,
];

#[target_feature(enable = "sse4.2,pclmulqdq,popcnt")]
pub(crate) unsafe fn scan_block(ptr: *const u8) -> Block {
    unsafe {
        let chunks = [
            _mm_loadu_si128(ptr as *const __m128i),
            _mm_loadu_si128(ptr.add(16) as *const __m128i),
            _mm_loadu_si128(ptr.add(32) as *const __m128i),
            _mm_loadu_si128(ptr.add(48) as *const __m128i),
        ];
        Block {
            backslash: find(&chunks, b'\\'),
            quote: find(&chunks, b'"'),
            semicolon: find(&chunks, b';'),
            newline: find(&chunks, b'\n'),
            blank: find_any(&chunks, &BLANK),
            open: find(&chunks, b'('),
            close: find(&chunks, b')'),
        }
    }
}

#[target_feature(enable = "sse4.2")]
unsafe fn find(chunks: &[__m128i; 4], key: u8) -> u64 {
    unsafe {
        let k = _mm_set1_epi8(key as i8);
        let m0 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[0], k)) as u16 as u64;
        let m1 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[1], k)) as u16 as u64;
        let m2 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[2], k)) as u16 as u64;
        let m3 = _mm_movemask_epi8(_mm_cmpeq_epi8(chunks[3], k)) as u16 as u64;
        m0 | (m1 << 16) | (m2 << 32) | (m3 << 48)
    }
}

#[target_feature(enable = "sse4.2")]
unsafe fn find_any(chunks: &[__m128i; 4], table: &[u8; 16]) -> u64 {
    unsafe {
        let t = _mm_loadu_si128(table.as_ptr() as *const __m128i);
        let mut mask = 0u64;
        for (i, &chunk) in chunks.iter().enumerate() {
            let hit = _mm_cmpeq_epi8(_mm_shuffle_epi8(t, chunk), chunk);
            mask |= (_mm_movemask_epi8(hit) as u16 as u64) << (16 * i);
        }
        mask
    }
}

/// Prefix XOR as a carry-less multiply by all-ones.
#[target_feature(enable = "pclmulqdq")]
pub(crate) unsafe fn prefix_xor(mask: u64) -> u64 {
    unsafe {
        let all_ones = _mm_set1_epi8(-1);
        let m = _mm_set_epi64x(0, mask as i64);
        _mm_cvtsi128_si64(_mm_clmulepi64_si128(m, all_ones, 0)) as u64
    }
}
