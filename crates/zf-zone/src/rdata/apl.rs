//! APL address prefix lists (RFC 3123).
//!
//! Items look like `[!]afi:address/prefix` with AFI 1 (IPv4) or 2 (IPv6).
//! The wire form per item is `afi(2) prefix(1) n(1) address(n)` where `n`
//! drops trailing zero octets and its top bit carries the negation flag.

use super::ip::{ip4, ip6};
use super::{decimal, EncodeError, Rdata};

pub(crate) fn encode_item(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let (negated, rest) = match token.split_first() {
        Some((b'!', rest)) => (true, rest),
        _ => (false, token),
    };
    let colon = rest.iter().position(|&b| b == b':').ok_or(EncodeError::Syntax)?;
    let slash = rest.iter().position(|&b| b == b'/').ok_or(EncodeError::Syntax)?;
    if slash < colon {
        return Err(EncodeError::Syntax);
    }
    let afi = decimal(&rest[..colon], 65_535)? as u16;
    let address = &rest[colon + 1..slash];
    let prefix_text = &rest[slash + 1..];

    let (octets, max_prefix): (Vec<u8>, u64) = match afi {
        1 => (ip4(address)?.octets().to_vec(), 32),
        2 => (ip6(address)?.octets().to_vec(), 128),
        _ => return Err(EncodeError::Semantic),
    };
    let prefix = decimal(prefix_text, max_prefix)? as u8;

    let trimmed = octets.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    rdata.write_u16(afi)?;
    rdata.write_u8(prefix)?;
    rdata.write_u8(trimmed as u8 | if negated { 0x80 } else { 0 })?;
    rdata.write(&octets[..trimmed])
}
