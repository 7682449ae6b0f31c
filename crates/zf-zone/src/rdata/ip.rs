//! IPv4/IPv6 address fields, plus the NSAP and ILNP64 oddities.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::{EncodeError, Rdata};

pub(crate) fn parse_ip4(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let addr = ip4(token)?;
    rdata.write(&addr.octets())
}

pub(crate) fn parse_ip6(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let addr = ip6(token)?;
    rdata.write(&addr.octets())
}

pub(crate) fn ip4(token: &[u8]) -> Result<Ipv4Addr, EncodeError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(EncodeError::Semantic)
}

pub(crate) fn ip6(token: &[u8]) -> Result<Ipv6Addr, EncodeError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(EncodeError::Semantic)
}

/// NSAP address (RFC 1706): `0x` followed by hex, dots ignored.
pub(crate) fn parse_nsap(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    if token.len() < 3 || token[0] != b'0' || !matches!(token[1], b'x' | b'X') {
        return Err(EncodeError::Syntax);
    }
    let mut nibble: Option<u8> = None;
    for &b in &token[2..] {
        if b == b'.' {
            continue;
        }
        let v = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(EncodeError::Syntax),
        };
        match nibble.take() {
            Some(high) => rdata.write_u8(high << 4 | v)?,
            None => nibble = Some(v),
        }
    }
    if nibble.is_some() {
        return Err(EncodeError::Syntax); // odd number of digits
    }
    Ok(())
}

/// 64-bit ILNP locator/identifier (RFC 6742): `xxxx:xxxx:xxxx:xxxx`, each
/// group 1–4 hex digits, no compression.
pub(crate) fn parse_ilnp64(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let mut groups = [0u16; 4];
    let mut count = 0;
    for part in token.split(|&b| b == b':') {
        if count == 4 || part.is_empty() || part.len() > 4 {
            return Err(EncodeError::Syntax);
        }
        let mut value = 0u16;
        for &b in part {
            let v = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(EncodeError::Syntax),
            };
            value = value << 4 | v as u16;
        }
        groups[count] = value;
        count += 1;
    }
    if count != 4 {
        return Err(EncodeError::Syntax);
    }
    for group in groups {
        rdata.write_u16(group)?;
    }
    Ok(())
}
