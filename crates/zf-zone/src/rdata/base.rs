//! Base16, base32hex and base64 decoders.
//!
//! All three are streaming state machines over alphabet-indexed bytes, so a
//! blob may span several contiguous token pieces inside a `( … )` group.
//! Base64 pads with `=` (accepted only once the state has two or three
//! sextets of a quad), base32hex pads with `-` and counts the pad run down,
//! base16 just wants an even number of nibbles.

use super::{EncodeError, Rdata};
use crate::record::MAX_RDATA;

const BAD: u8 = 0xff;

static B16: [u8; 256] = {
    let mut t = [BAD; 256];
    let mut b = 0usize;
    while b < 256 {
        t[b] = match b as u8 {
            c @ b'0'..=b'9' => c - b'0',
            c @ b'a'..=b'f' => c - b'a' + 10,
            c @ b'A'..=b'F' => c - b'A' + 10,
            _ => BAD,
        };
        b += 1;
    }
    t
};

static B32HEX: [u8; 256] = {
    let mut t = [BAD; 256];
    let mut b = 0usize;
    while b < 256 {
        t[b] = match b as u8 {
            c @ b'0'..=b'9' => c - b'0',
            c @ b'a'..=b'v' => c - b'a' + 10,
            c @ b'A'..=b'V' => c - b'A' + 10,
            _ => BAD,
        };
        b += 1;
    }
    t
};

static B64: [u8; 256] = {
    let mut t = [BAD; 256];
    let mut b = 0usize;
    while b < 256 {
        t[b] = match b as u8 {
            c @ b'A'..=b'Z' => c - b'A',
            c @ b'a'..=b'z' => c - b'a' + 26,
            c @ b'0'..=b'9' => c - b'0' + 52,
            b'+' => 62,
            b'/' => 63,
            _ => BAD,
        };
        b += 1;
    }
    t
};

#[derive(Debug, Default)]
pub(crate) struct Base16 {
    high: Option<u8>,
}

impl Base16 {
    pub(crate) fn feed(&mut self, piece: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
        for &b in piece {
            let v = B16[b as usize];
            if v == BAD {
                return Err(EncodeError::Syntax);
            }
            match self.high.take() {
                Some(high) => rdata.write_u8(high << 4 | v)?,
                None => self.high = Some(v),
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> Result<(), EncodeError> {
        if self.high.is_some() {
            return Err(EncodeError::Syntax);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Base64 {
    state: u32,
    acc: u8,
}

impl Base64 {
    pub(crate) fn feed(&mut self, piece: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
        for &b in piece {
            if b == b'=' {
                self.state = match self.state {
                    2 => 4,      // one byte of info, expect a second pad
                    3 | 4 => 5,  // done padding
                    _ => return Err(EncodeError::Syntax),
                };
                continue;
            }
            let v = B64[b as usize];
            if v == BAD || self.state > 3 {
                return Err(EncodeError::Syntax);
            }
            match self.state {
                0 => {
                    self.acc = v << 2;
                    self.state = 1;
                }
                1 => {
                    rdata.write_u8(self.acc | v >> 4)?;
                    self.acc = (v & 0x0f) << 4;
                    self.state = 2;
                }
                2 => {
                    rdata.write_u8(self.acc | v >> 2)?;
                    self.acc = (v & 0x03) << 6;
                    self.state = 3;
                }
                _ => {
                    rdata.write_u8(self.acc | v)?;
                    self.state = 0;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> Result<(), EncodeError> {
        if self.state != 0 && self.state != 5 {
            return Err(EncodeError::Syntax);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Base32 {
    state: u32,
    acc: u8,
}

impl Base32 {
    pub(crate) fn feed(&mut self, piece: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
        for &b in piece {
            if b == b'-' {
                self.state = match self.state {
                    2 => 13, // six pad characters in total
                    4 => 11, // four
                    5 => 10, // three
                    7 => 8,  // one
                    s @ 9..=13 => s - 1,
                    _ => return Err(EncodeError::Syntax),
                };
                continue;
            }
            let v = B32HEX[b as usize];
            if v == BAD || self.state > 7 {
                return Err(EncodeError::Syntax);
            }
            match self.state {
                0 => {
                    self.acc = v << 3;
                    self.state = 1;
                }
                1 => {
                    rdata.write_u8(self.acc | v >> 2)?;
                    self.acc = (v & 0x03) << 6;
                    self.state = 2;
                }
                2 => {
                    self.acc |= v << 1;
                    self.state = 3;
                }
                3 => {
                    rdata.write_u8(self.acc | v >> 4)?;
                    self.acc = (v & 0x0f) << 4;
                    self.state = 4;
                }
                4 => {
                    rdata.write_u8(self.acc | v >> 1)?;
                    self.acc = (v & 0x01) << 7;
                    self.state = 5;
                }
                5 => {
                    self.acc |= v << 2;
                    self.state = 6;
                }
                6 => {
                    rdata.write_u8(self.acc | v >> 3)?;
                    self.acc = (v & 0x07) << 5;
                    self.state = 7;
                }
                _ => {
                    rdata.write_u8(self.acc | v)?;
                    self.state = 0;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> Result<(), EncodeError> {
        if self.state != 0 && self.state != 8 {
            return Err(EncodeError::Syntax);
        }
        Ok(())
    }
}

/// Base32hex with a one-octet length prefix (NSEC3 next hashed owner).
pub(crate) fn base32_prefixed(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    let prefix = rdata.len();
    if prefix + 1 > MAX_RDATA {
        return Err(EncodeError::OutOfMemory);
    }
    rdata.set_len(prefix + 1);
    let mut decoder = Base32::default();
    decoder.feed(token, rdata)?;
    decoder.finish()?;
    let written = rdata.len() - prefix - 1;
    if written > 255 {
        return Err(EncodeError::Semantic);
    }
    rdata.raw()[prefix] = written as u8;
    Ok(())
}

/// NSEC3 salt: `-` for empty, hex with a one-octet length prefix otherwise.
pub(crate) fn salt(token: &[u8], rdata: &mut Rdata) -> Result<(), EncodeError> {
    if token == b"-" {
        return rdata.write_u8(0);
    }
    let prefix = rdata.len();
    if prefix + 1 > MAX_RDATA {
        return Err(EncodeError::OutOfMemory);
    }
    rdata.set_len(prefix + 1);
    let mut decoder = Base16::default();
    decoder.feed(token, rdata)?;
    decoder.finish()?;
    let written = rdata.len() - prefix - 1;
    if written > 255 {
        return Err(EncodeError::Semantic);
    }
    rdata.raw()[prefix] = written as u8;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(pieces: &[&[u8]]) -> Result<Vec<u8>, EncodeError> {
        let mut rdata = Rdata::new();
        let mut decoder = Base64::default();
        for piece in pieces {
            decoder.feed(piece, &mut rdata)?;
        }
        decoder.finish()?;
        Ok(rdata.as_slice().to_vec())
    }

    #[test]
    fn base64_vectors() {
        assert_eq!(b64(&[b""]).unwrap(), b"");
        assert_eq!(b64(&[b"Zg=="]).unwrap(), b"f");
        assert_eq!(b64(&[b"Zm8="]).unwrap(), b"fo");
        assert_eq!(b64(&[b"Zm9v"]).unwrap(), b"foo");
        assert_eq!(b64(&[b"Zm9vYg=="]).unwrap(), b"foob");
        assert_eq!(b64(&[b"Zm9vYmE="]).unwrap(), b"fooba");
        assert_eq!(b64(&[b"Zm9vYmFy"]).unwrap(), b"foobar");
    }

    #[test]
    fn base64_spans_pieces() {
        assert_eq!(b64(&[b"Zm9v", b"YmFy"]).unwrap(), b"foobar");
        assert_eq!(b64(&[b"Zm9vYmF", b"y"]).unwrap(), b"foobar");
        assert_eq!(b64(&[b"Zm9vYg=", b"="]).unwrap(), b"foob");
    }

    #[test]
    fn base64_rejects_malformed_padding() {
        assert!(b64(&[b"Zg="]).is_err()); // half a pad
        assert!(b64(&[b"Z==="]).is_err());
        assert!(b64(&[b"=AAA"]).is_err());
        assert!(b64(&[b"Zg==Zg"]).is_err()); // data after pad
        assert!(b64(&[b"Zg"]).is_err()); // missing pad entirely
    }

    #[test]
    fn base64_identity_on_random_blobs() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        const ALPHABET: &[u8; 64] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
        for _ in 0..64 {
            let len = rng.random_range(0..512);
            let blob: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            // reference encode
            let mut text = Vec::new();
            for chunk in blob.chunks(3) {
                let b = [chunk[0], *chunk.get(1).unwrap_or(&0), *chunk.get(2).unwrap_or(&0)];
                let quad = [
                    b[0] >> 2,
                    (b[0] & 0x03) << 4 | b[1] >> 4,
                    (b[1] & 0x0f) << 2 | b[2] >> 6,
                    b[2] & 0x3f,
                ];
                let keep = chunk.len() + 1;
                for (i, &sextet) in quad.iter().enumerate() {
                    text.push(if i < keep { ALPHABET[sextet as usize] } else { b'=' });
                }
            }
            assert_eq!(b64(&[&text]).unwrap(), blob);
        }
    }

    fn b32(token: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut rdata = Rdata::new();
        let mut decoder = Base32::default();
        decoder.feed(token, &mut rdata)?;
        decoder.finish()?;
        Ok(rdata.as_slice().to_vec())
    }

    #[test]
    fn base32hex_vectors() {
        // RFC 4648 test vectors, '-' for pad
        assert_eq!(b32(b"").unwrap(), b"");
        assert_eq!(b32(b"CO------").unwrap(), b"f");
        assert_eq!(b32(b"CPNG----").unwrap(), b"fo");
        assert_eq!(b32(b"CPNMU---").unwrap(), b"foo");
        assert_eq!(b32(b"CPNMUOG-").unwrap(), b"foob");
        assert_eq!(b32(b"CPNMUOJ1").unwrap(), b"fooba");
        assert_eq!(b32(b"CPNMUOJ1E8------").unwrap(), b"foobar");
        assert_eq!(b32(b"cpnmuoj1").unwrap(), b"fooba");
    }

    #[test]
    fn base32hex_unpadded_partial_is_rejected() {
        assert!(b32(b"CO").is_err());
        assert!(b32(b"CO-----").is_err()); // five pads, needs six
        assert!(b32(b"CO-------").is_err()); // seven pads
    }

    #[test]
    fn base16_decodes() {
        let mut rdata = Rdata::new();
        let mut decoder = Base16::default();
        decoder.feed(b"2BB183AF", &mut rdata).unwrap();
        decoder.feed(b"5f22", &mut rdata).unwrap();
        decoder.finish().unwrap();
        assert_eq!(rdata.as_slice(), &[0x2b, 0xb1, 0x83, 0xaf, 0x5f, 0x22]);

        let mut decoder = Base16::default();
        assert!(decoder.feed(b"0g", &mut Rdata::new()).is_err());
    }

    #[test]
    fn salt_forms() {
        let mut rdata = Rdata::new();
        salt(b"-", &mut rdata).unwrap();
        assert_eq!(rdata.as_slice(), &[0]);

        let mut rdata = Rdata::new();
        salt(b"aabbccdd", &mut rdata).unwrap();
        assert_eq!(rdata.as_slice(), &[4, 0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn base32_prefixed_writes_length() {
        let mut rdata = Rdata::new();
        base32_prefixed(b"CPNMUOJ1", &mut rdata).unwrap();
        assert_eq!(rdata.as_slice(), b"\x05fooba");
    }
}
