//! EUI-48 and EUI-64 addresses (RFC 7043): fixed `xx-xx-…-xx` shapes.
//!
//! Two hex pairs are decoded per step through a pair of 32-bit lookup
//! tables; an out-of-alphabet byte pushes the combined value over 0xff. The
//! dash positions are verified in the same pass.

use super::{EncodeError, Rdata};

/// High-nibble decode table: value << 4 for hex digits, 0x100 otherwise.
static D0: [u32; 256] = build_d0();
/// Low-nibble decode table: value for hex digits, 0x100 otherwise.
static D1: [u32; 256] = build_d1();

const fn hex_value(b: u8) -> u32 {
    match b {
        b'0'..=b'9' => (b - b'0') as u32,
        b'a'..=b'f' => (b - b'a' + 10) as u32,
        b'A'..=b'F' => (b - b'A' + 10) as u32,
        _ => 0x100,
    }
}

const fn build_d0() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut b = 0usize;
    while b < 256 {
        let v = hex_value(b as u8);
        table[b] = if v > 0xff { 0x100 } else { v << 4 };
        b += 1;
    }
    table
}

const fn build_d1() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut b = 0usize;
    while b < 256 {
        table[b] = hex_value(b as u8);
        b += 1;
    }
    table
}

/// Decode two `xx-` groups at `s[0..6]`; the byte at `s[2]` must be a dash
/// and the byte at `s[5]` must be a dash unless this is the final group.
#[inline]
fn pair(s: &[u8], out: &mut [u8], last: bool) -> bool {
    let v1 = D0[s[0] as usize] | D1[s[1] as usize];
    let v2 = D0[s[3] as usize] | D1[s[4] as usize];
    if v1 > 0xff || v2 > 0xff || s[2] != b'-' {
        return false;
    }
    if !last && s[5] != b'-' {
        return false;
    }
    out[0] = v1 as u8;
    out[1] = v2 as u8;
    true
}

pub(crate) fn parse_eui48(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let mut wire = [0u8; 6];
    if token.len() == 17
        && pair(&token[0..], &mut wire[0..], false)
        && pair(&token[6..], &mut wire[2..], false)
        && pair(&token[12..17], &mut wire[4..], true)
    {
        return rdata.write(&wire);
    }
    Err(EncodeError::Syntax)
}

pub(crate) fn parse_eui64(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let mut wire = [0u8; 8];
    if token.len() == 23
        && pair(&token[0..], &mut wire[0..], false)
        && pair(&token[6..], &mut wire[2..], false)
        && pair(&token[12..], &mut wire[4..], false)
        && pair(&token[18..23], &mut wire[6..], true)
    {
        return rdata.write(&wire);
    }
    Err(EncodeError::Syntax)
}
