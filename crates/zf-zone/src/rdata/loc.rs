//! LOC presentation format (RFC 1876).
//!
//! `d1 [m1 [s1]] {N|S} d2 [m2 [s2]] {E|W} alt[m] [siz[m] [hp[m] [vp[m]]]]`.
//! Latitude/longitude become 2^31-centred thousandths of an arcsecond;
//! altitude is centimetres above a 100 000 m deep datum; size and the
//! precisions are centimetres in base-10 exponent/mantissa form.

use super::{EncodeError, Rdata};

const VERSION: u8 = 0;
const DEFAULT_SIZE: u8 = 0x12; // 1 m
const DEFAULT_HP: u8 = 0x16; // 10 000 m
const DEFAULT_VP: u8 = 0x13; // 10 m
const EQUATOR: u32 = 1 << 31;
const DATUM: u32 = 10_000_000; // 100 000 m in cm

/// The collected tokens of one LOC record.
pub(crate) fn encode(tokens: &[Vec<u8>], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let mut cursor = 0usize;

    let lat = angle(tokens, &mut cursor, 90, b'N', b'S')?;
    let lon = angle(tokens, &mut cursor, 180, b'E', b'W')?;
    let alt = altitude(tokens.get(cursor).ok_or(EncodeError::Syntax)?)?;
    cursor += 1;

    let mut extras = [DEFAULT_SIZE, DEFAULT_HP, DEFAULT_VP];
    for slot in extras.iter_mut() {
        let Some(token) = tokens.get(cursor) else {
            break;
        };
        *slot = precision(token)?;
        cursor += 1;
    }
    if cursor != tokens.len() {
        return Err(EncodeError::Syntax);
    }

    rdata.write(&[VERSION, extras[0], extras[1], extras[2]])?;
    rdata.write_u32(lat)?;
    rdata.write_u32(lon)?;
    rdata.write_u32(alt)
}

/// Degrees, optional minutes, optional decimal seconds, then a hemisphere
/// letter. Positive towards N/E.
fn angle(
    tokens: &[Vec<u8>],
    cursor: &mut usize,
    max_degrees: u64,
    positive: u8,
    negative: u8,
) -> Result<u32, EncodeError> {
    let degrees = number(tokens, cursor)?;
    if degrees > max_degrees {
        return Err(EncodeError::Semantic);
    }
    let mut msec = degrees * 3_600_000;

    if peek_is_number(tokens, *cursor) {
        let minutes = number(tokens, cursor)?;
        if minutes > 59 {
            return Err(EncodeError::Semantic);
        }
        msec += minutes * 60_000;

        if peek_is_number(tokens, *cursor) {
            let seconds = decimal_msec(tokens, cursor)?;
            if seconds > 59_999 {
                return Err(EncodeError::Semantic);
            }
            msec += seconds;
        }
    }

    if msec > max_degrees * 3_600_000 {
        return Err(EncodeError::Semantic);
    }
    let hemi = tokens.get(*cursor).ok_or(EncodeError::Syntax)?;
    *cursor += 1;
    let sign = match hemi.as_slice() {
        [b] if b.to_ascii_uppercase() == positive => 1i64,
        [b] if b.to_ascii_uppercase() == negative => -1i64,
        _ => return Err(EncodeError::Syntax),
    };
    let centred = EQUATOR as i64 + sign * msec as i64;
    Ok(centred as u32)
}

fn peek_is_number(tokens: &[Vec<u8>], cursor: usize) -> bool {
    tokens
        .get(cursor)
        .and_then(|t| t.first())
        .is_some_and(|b| b.is_ascii_digit())
}

fn number(tokens: &[Vec<u8>], cursor: &mut usize) -> Result<u64, EncodeError> {
    let token = tokens.get(*cursor).ok_or(EncodeError::Syntax)?;
    *cursor += 1;
    super::decimal(token, u64::from(u32::MAX))
}

/// Seconds with up to three decimals, in milliseconds.
fn decimal_msec(tokens: &[Vec<u8>], cursor: &mut usize) -> Result<u64, EncodeError> {
    let token = tokens.get(*cursor).ok_or(EncodeError::Syntax)?;
    *cursor += 1;
    parse_scaled(token, 3, false)
}

/// Altitude in metres, optional sign, up to two decimals, optional `m`.
fn altitude(token: &[u8]) -> Result<u32, EncodeError> {
    let (negative, digits) = match token.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, token),
    };
    let cm = parse_scaled(digits, 2, true)?;
    let alt = if negative {
        i64::from(DATUM) - cm as i64
    } else {
        i64::from(DATUM) + cm as i64
    };
    if alt < 0 || alt > i64::from(u32::MAX) {
        return Err(EncodeError::Semantic);
    }
    Ok(alt as u32)
}

/// Size/precision in metres, up to two decimals, optional `m`, encoded as
/// mantissa (high nibble) times ten to the exponent (low nibble), in
/// centimetres. Truncates like the classic `precsize_aton`.
fn precision(token: &[u8]) -> Result<u8, EncodeError> {
    let cm = parse_scaled(token, 2, true)?;
    if cm > 9_000_000_000 {
        return Err(EncodeError::Semantic);
    }
    let mut mantissa = cm;
    let mut exponent = 0u8;
    while mantissa >= 10 {
        mantissa /= 10;
        exponent += 1;
    }
    Ok((mantissa as u8) << 4 | exponent)
}

/// Digits with up to `scale` decimals, returning the value multiplied by
/// 10^scale; accepts a trailing `m` when `metres` is set.
fn parse_scaled(token: &[u8], scale: u32, metres: bool) -> Result<u64, EncodeError> {
    let token = match token.split_last() {
        Some((b'm' | b'M', rest)) if metres => rest,
        _ => token,
    };
    if token.is_empty() {
        return Err(EncodeError::Syntax);
    }
    let mut whole = 0u64;
    let mut fraction = 0u64;
    let mut fraction_digits = 0u32;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for &b in token {
        if b == b'.' {
            if seen_dot {
                return Err(EncodeError::Syntax);
            }
            seen_dot = true;
            continue;
        }
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return Err(EncodeError::Syntax);
        }
        seen_digit = true;
        if seen_dot {
            if fraction_digits == scale {
                return Err(EncodeError::Syntax);
            }
            fraction = fraction * 10 + d as u64;
            fraction_digits += 1;
        } else {
            whole = whole.checked_mul(10).ok_or(EncodeError::Semantic)? + d as u64;
        }
    }
    if !seen_digit {
        return Err(EncodeError::Syntax);
    }
    let fraction = fraction * 10u64.pow(scale - fraction_digits);
    whole
        .checked_mul(10u64.pow(scale))
        .and_then(|v| v.checked_add(fraction))
        .ok_or(EncodeError::Semantic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_tokens(tokens: &[&str]) -> Result<Vec<u8>, EncodeError> {
        let owned: Vec<Vec<u8>> = tokens.iter().map(|t| t.as_bytes().to_vec()).collect();
        let mut rdata = Rdata::new();
        encode(&owned, &mut rdata)?;
        Ok(rdata.as_slice().to_vec())
    }

    #[test]
    fn full_form() {
        // 42 21 54 N 71 06 18 W -24m 30m
        let wire =
            encode_tokens(&["42", "21", "54", "N", "71", "06", "18", "W", "-24m", "30m"]).unwrap();
        let lat = 2u32.pow(31) + (42 * 3600 + 21 * 60 + 54) * 1000;
        let lon = 2u32.pow(31) - (71 * 3600 + 6 * 60 + 18) * 1000;
        let alt: i32 = 10_000_000 - 2400;
        let mut expected = vec![0x00, 0x33, 0x16, 0x13];
        expected.extend_from_slice(&lat.to_be_bytes());
        expected.extend_from_slice(&lon.to_be_bytes());
        expected.extend_from_slice(&alt.to_be_bytes());
        assert_eq!(wire, expected);
    }

    #[test]
    fn minimal_form_uses_defaults() {
        let wire = encode_tokens(&["31", "S", "100", "E", "10m"]).unwrap();
        assert_eq!(&wire[..4], &[0x00, 0x12, 0x16, 0x13]);
        let lat = 2u32.pow(31) - 31 * 3_600_000;
        assert_eq!(&wire[4..8], &lat.to_be_bytes());
    }

    #[test]
    fn fractional_seconds_and_altitude() {
        let wire = encode_tokens(&["0", "0", "1.5", "N", "0", "E", "0.05m"]).unwrap();
        let lat = 2u32.pow(31) + 1500;
        assert_eq!(&wire[4..8], &lat.to_be_bytes());
        let alt: i32 = 10_000_000 + 5;
        assert_eq!(&wire[12..16], &alt.to_be_bytes());
    }

    #[test]
    fn range_errors() {
        assert!(encode_tokens(&["91", "N", "0", "E", "0m"]).is_err());
        assert!(encode_tokens(&["0", "60", "0", "N", "0", "E", "0m"]).is_err());
        assert!(encode_tokens(&["0", "N", "181", "E", "0m"]).is_err());
        assert!(encode_tokens(&["0", "X", "0", "E", "0m"]).is_err());
        assert!(encode_tokens(&["0", "N", "0", "E"]).is_err()); // no altitude
        assert!(encode_tokens(&["0", "N", "0", "E", "0m", "1m", "1m", "1m", "1m"]).is_err());
    }

    #[test]
    fn precision_encoding() {
        assert_eq!(precision(b"30m").unwrap(), 0x33); // 3e3 cm
        assert_eq!(precision(b"1m").unwrap(), 0x12);
        assert_eq!(precision(b"10000m").unwrap(), 0x16);
        assert_eq!(precision(b"0.05m").unwrap(), 0x50); // 5 cm
        assert_eq!(precision(b"0m").unwrap(), 0x00);
    }
}
