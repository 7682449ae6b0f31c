//! `YYYYMMDDHHmmSS` timestamps to epoch seconds (RRSIG/SIG validity).
//!
//! Fourteen digits, year 1970–2106 so the result fits an unsigned 32-bit
//! wire field. Day arithmetic follows the classic calendar formula: days
//! from whole years plus leap days, days to the start of the month, one
//! extra past February in a leap year.

use super::{EncodeError, Rdata};

/// Cumulative days before month m (1-based), non-leap.
static DAYS_TO_MONTH: [u32; 13] =
    [0, 0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

static DAYS_IN_MONTH: [u32; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn leap_days(from: u32, to: u32) -> u32 {
    let f = from - 1;
    let t = to - 1;
    (t / 4 - f / 4) - (t / 100 - f / 100) + (t / 400 - f / 400)
}

pub(crate) fn parse(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    if token.len() != 14 {
        return Err(EncodeError::Syntax);
    }
    let mut d = [0u32; 14];
    for (i, &b) in token.iter().enumerate() {
        let digit = b.wrapping_sub(b'0');
        if digit > 9 {
            return Err(EncodeError::Syntax);
        }
        d[i] = digit as u32;
    }

    let year = d[0] * 1000 + d[1] * 100 + d[2] * 10 + d[3];
    let month = d[4] * 10 + d[5];
    let day = d[6] * 10 + d[7];
    let hour = d[8] * 10 + d[9];
    let minute = d[10] * 10 + d[11];
    let second = d[12] * 10 + d[13];

    if !(1970..=2106).contains(&year) {
        return Err(EncodeError::Semantic);
    }
    if !(1..=12).contains(&month) {
        return Err(EncodeError::Semantic);
    }
    let leap = is_leap_year(year);
    let month_days = DAYS_IN_MONTH[month as usize] + u32::from(leap && month == 2);
    if day == 0 || day > month_days {
        return Err(EncodeError::Semantic);
    }
    if hour > 23 || minute > 59 || second > 59 {
        return Err(EncodeError::Semantic);
    }

    let mut days = 365u64 * u64::from(year - 1970) + u64::from(leap_days(1970, year));
    days += u64::from(DAYS_TO_MONTH[month as usize]);
    days += u64::from(leap && month > 2);
    days += u64::from(day - 1);

    let seconds = ((days * 24 + u64::from(hour)) * 60 + u64::from(minute)) * 60
        + u64::from(second);
    rdata.write_u32(seconds as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(token: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut rdata = Rdata::new();
        parse(token, &mut rdata)?;
        Ok(rdata.as_slice().to_vec())
    }

    #[test]
    fn epoch_is_zero() {
        assert_eq!(encode(b"19700101000000").unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn i32_rollover_boundary() {
        assert_eq!(encode(b"20380119031407").unwrap(), 0x7fff_ffffu32.to_be_bytes());
        assert_eq!(encode(b"20380119031408").unwrap(), 0x8000_0000u32.to_be_bytes());
    }

    #[test]
    fn known_timestamp() {
        // 2023-03-15 12:30:45 UTC
        assert_eq!(encode(b"20230315123045").unwrap(), 1_678_883_445u32.to_be_bytes());
    }

    #[test]
    fn leap_year_handling() {
        assert!(encode(b"20240229000000").is_ok());
        assert_eq!(encode(b"20230229000000").unwrap_err(), EncodeError::Semantic);
        assert!(encode(b"20000229000000").is_ok()); // 2000 is a leap year
        assert_eq!(encode(b"21000229000000").unwrap_err(), EncodeError::Semantic);
    }

    #[test]
    fn range_checks() {
        assert_eq!(encode(b"19691231235959").unwrap_err(), EncodeError::Semantic);
        assert_eq!(encode(b"21070101000000").unwrap_err(), EncodeError::Semantic);
        assert_eq!(encode(b"20230013000000").unwrap_err(), EncodeError::Semantic);
        assert_eq!(encode(b"20230132000000").unwrap_err(), EncodeError::Semantic);
        assert_eq!(encode(b"20230101240000").unwrap_err(), EncodeError::Semantic);
        assert_eq!(encode(b"20230101006000").unwrap_err(), EncodeError::Semantic);
    }

    #[test]
    fn shape_checks() {
        assert_eq!(encode(b"2023031512304").unwrap_err(), EncodeError::Syntax);
        assert_eq!(encode(b"202303151230456").unwrap_err(), EncodeError::Syntax);
        assert_eq!(encode(b"2023031512304x").unwrap_err(), EncodeError::Syntax);
    }
}
