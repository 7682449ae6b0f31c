//! Character-string and free-text encoding.
//!
//! The hot path copies a full 32-byte block unconditionally — the window pad
//! on the input side and the RDATA slack on the output side make that safe —
//! and only slows down at backslashes, found with a SWAR mask. Escapes are
//! `\DDD` (three decimal digits, ≤ 255) and `\c` (literal next byte).

use super::{EncodeError, Rdata};
use crate::record::MAX_RDATA;

const LO: u64 = 0x0101_0101_0101_0101;
const HI7: u64 = 0x7f7f_7f7f_7f7f_7f7f;
const GATHER: u64 = 0x0102_0408_1020_4080;

/// Backslash positions in a 32-byte block, bit i = byte i.
#[inline]
fn backslash_mask(block: &[u8]) -> u32 {
    let mut mask = 0u32;
    for i in 0..4 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&block[i * 8..i * 8 + 8]);
        let x = u64::from_le_bytes(raw) ^ LO.wrapping_mul(b'\\' as u64);
        let hit = !(((x & HI7).wrapping_add(HI7)) | x | HI7);
        mask |= ((((hit >> 7).wrapping_mul(GATHER)) >> 56) as u32) << (8 * i);
    }
    mask
}

/// Copy `data[start..start + len]` into the RDATA buffer, decoding escapes.
/// `data` must extend 64 bytes past the token (the window pad guarantees
/// this); `limit` caps the output. Returns the number of bytes written.
pub(crate) fn copy(
    data: &[u8],
    start: usize,
    len: usize,
    rdata: &mut Rdata,
    limit: usize,
) -> Result<usize, EncodeError> {
    let mut t = start;
    let end = start + len;
    let mut out = rdata.len();
    let begun = out;

    while t < end {
        if out > limit {
            return Err(EncodeError::OutOfMemory);
        }
        let n = (end - t).min(32);
        let block: &[u8] = &data[t..t + 32];
        rdata.raw()[out..out + 32].copy_from_slice(block);
        let mask = backslash_mask(block) & (((1u64 << n) - 1) as u32);
        if mask == 0 {
            t += n;
            out += n;
            continue;
        }
        let skip = mask.trailing_zeros() as usize;
        t += skip;
        out += skip;
        // decode one escape, then rescan from just past it
        if end - t < 2 {
            return Err(EncodeError::Syntax);
        }
        let d0 = data[t + 1].wrapping_sub(b'0');
        if d0 > 9 {
            rdata.raw()[out] = data[t + 1];
            t += 2;
        } else {
            if end - t < 4 {
                return Err(EncodeError::Syntax);
            }
            let d1 = data[t + 2].wrapping_sub(b'0');
            let d2 = data[t + 3].wrapping_sub(b'0');
            let value = d0 as u32 * 100 + d1 as u32 * 10 + d2 as u32;
            if d1 > 9 || d2 > 9 || value > 255 {
                return Err(EncodeError::Syntax);
            }
            rdata.raw()[out] = value as u8;
            t += 4;
        }
        out += 1;
    }

    if out > limit {
        return Err(EncodeError::OutOfMemory);
    }
    rdata.set_len(out);
    Ok(out - begun)
}

/// One character-string: a length octet followed by at most 255 bytes.
pub(crate) fn string(
    data: &[u8],
    start: usize,
    len: usize,
    rdata: &mut Rdata,
) -> Result<(), EncodeError> {
    let prefix = rdata.len();
    if prefix + 1 > MAX_RDATA {
        return Err(EncodeError::OutOfMemory);
    }
    rdata.set_len(prefix + 1);
    let limit = (prefix + 1 + 255).min(MAX_RDATA);
    let written = match copy(data, start, len, rdata, limit) {
        Ok(n) => n,
        Err(EncodeError::OutOfMemory) => return Err(EncodeError::Syntax), // > 255 bytes
        Err(e) => return Err(e),
    };
    rdata.raw()[prefix] = written as u8;
    Ok(())
}

/// Free text, no length prefix, bounded only by the RDATA limit.
pub(crate) fn remainder(
    data: &[u8],
    start: usize,
    len: usize,
    rdata: &mut Rdata,
) -> Result<(), EncodeError> {
    copy(data, start, len, rdata, MAX_RDATA).map(|_| ())
}
