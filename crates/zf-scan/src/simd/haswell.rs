//! 256-bit block scan targeting AVX2 ("haswell").
//!
//! Same contract as the westmere backend with two 32-byte chunks per block.
//! `_mm256_shuffle_epi8` operates per 128-bit lane, so the blank table is
//! simply the 16-byte nibble table repeated.

use core::arch::x86_64::*;

use super::Block;

const BLANK: [u8; 32] = [
    0x20, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, //
    0x80, 0x09, 0x80, 0x80, 0x80, 0x0d, 0x80, 0x80, //
    0x20, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, //
    0x80, 0x09, 0x80, 0x80, 0x80, 0x0d, 0x80, 0x80,
];

#[target_feature(enable = "avx2,pclmulqdq")]
pub(crate) unsafe fn scan_block(ptr: *const u8) -> Block {
    unsafe {
        let chunks = [
            _mm256_loadu_si256(ptr as *const __m256i),
            _mm256_loadu_si256(ptr.add(32) as *const __m256i),
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

#[target_feature(enable = "avx2")]
unsafe fn find(chunks: &[__m256i; 2], key: u8) -> u64 {
    unsafe {
        let k = _mm256_set1_epi8(key as i8);
        let m0 = _mm256_movemask_epi8(_mm256_cmpeq_epi8(chunks[0], k)) as u32 as u64;
        let m1 = _mm256_movemask_epi8(_mm256_cmpeq_epi8(chunks[1], k)) as u32 as u64;
        m0 | (m1 << 32)
    }
}

#[target_feature(enable = "avx2")]
unsafe fn find_any(chunks: &[__m256i; 2], table: &[u8; 32]) -> u64 {
    unsafe {
        let t = _mm256_loadu_si256(table.as_ptr() as *const __m256i);
        let h0 = _mm256_cmpeq_epi8(_mm256_shuffle_epi8(t, chunks[0]), chunks[0]);
        let h1 = _mm256_cmpeq_epi8(_mm256_shuffle_epi8(t, chunks[1]), chunks[1]);
        let m0 = _mm256_movemask_epi8(h0) as u32 as u64;
        let m1 = _mm256_movemask_epi8(h1) as u32 as u64;
        m0 | (m1 << 32)
    }
}
