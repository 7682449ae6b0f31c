//! SVCB/HTTPS service parameters (RFC 9460).
//!
//! Parameters arrive as `key`, `key=value` or `key=` followed by a quoted
//! value token. They are buffered, sorted by key code, checked for
//! duplicates and for the `mandatory` self-consistency rules, then emitted
//! as `key(2) len(2) value(len)`.

use super::base::Base64;
use super::ip::{ip4, ip6};
use super::{decimal, EncodeError, Rdata};
use crate::mnemonic::prefixed_number;
use crate::name::unescape;

const KEY_MANDATORY: u16 = 0;
const KEY_ALPN: u16 = 1;
const KEY_NO_DEFAULT_ALPN: u16 = 2;
const KEY_PORT: u16 = 3;
const KEY_IPV4HINT: u16 = 4;
const KEY_ECH: u16 = 5;
const KEY_IPV6HINT: u16 = 6;
const KEY_DOHPATH: u16 = 7;

fn key_code(name: &[u8]) -> Result<u16, EncodeError> {
    match name.to_ascii_lowercase().as_slice() {
        b"mandatory" => Ok(KEY_MANDATORY),
        b"alpn" => Ok(KEY_ALPN),
        b"no-default-alpn" => Ok(KEY_NO_DEFAULT_ALPN),
        b"port" => Ok(KEY_PORT),
        b"ipv4hint" => Ok(KEY_IPV4HINT),
        b"ech" => Ok(KEY_ECH),
        b"ipv6hint" => Ok(KEY_IPV6HINT),
        b"dohpath" => Ok(KEY_DOHPATH),
        other => prefixed_number(b"key", other).ok_or(EncodeError::Syntax),
    }
}

/// Decode escapes in a value, without list splitting.
fn decode(raw: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' {
            let (byte, used) = unescape(&raw[i..]).map_err(|_| EncodeError::Syntax)?;
            out.push(byte);
            i += used;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Split on unescaped commas, decoding escapes inside the items. A comma
/// produced by an escape is literal data.
fn decode_list(raw: &[u8]) -> Result<Vec<Vec<u8>>, EncodeError> {
    let mut items = vec![Vec::new()];
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b',' => {
                items.push(Vec::new());
                i += 1;
            }
            b'\\' => {
                let (byte, used) = unescape(&raw[i..]).map_err(|_| EncodeError::Syntax)?;
                items.last_mut().expect("non-empty").push(byte);
                i += used;
            }
            byte => {
                items.last_mut().expect("non-empty").push(byte);
                i += 1;
            }
        }
    }
    Ok(items)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Fed {
    Done,
    /// `key=` with nothing after the equals sign: the value is the next
    /// (usually quoted) token.
    NeedValue,
}

#[derive(Debug, Default)]
pub(crate) struct ParamSet {
    params: Vec<(u16, Vec<u8>)>,
    pending: Option<u16>,
}

impl ParamSet {
    pub(crate) fn begin(&mut self) {
        self.params.clear();
        self.pending = None;
    }

    pub(crate) fn add_token(&mut self, token: &[u8]) -> Result<Fed, EncodeError> {
        debug_assert!(self.pending.is_none());
        match token.iter().position(|&b| b == b'=') {
            None => {
                let key = key_code(token)?;
                self.push(key, None)?;
                Ok(Fed::Done)
            }
            Some(eq) => {
                let key = key_code(&token[..eq])?;
                if eq + 1 == token.len() {
                    self.pending = Some(key);
                    Ok(Fed::NeedValue)
                } else {
                    self.push(key, Some(&token[eq + 1..]))?;
                    Ok(Fed::Done)
                }
            }
        }
    }

    pub(crate) fn add_value(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        let key = self.pending.take().ok_or(EncodeError::Syntax)?;
        self.push(key, Some(value))
    }

    fn push(&mut self, key: u16, value: Option<&[u8]>) -> Result<(), EncodeError> {
        let wire = match key {
            KEY_MANDATORY => {
                let raw = value.ok_or(EncodeError::Syntax)?;
                let mut keys = Vec::new();
                for item in decode_list(raw)? {
                    let code = key_code(&item)?;
                    if code == KEY_MANDATORY {
                        return Err(EncodeError::Semantic);
                    }
                    keys.push(code);
                }
                if keys.is_empty() {
                    return Err(EncodeError::Syntax);
                }
                keys.sort_unstable();
                if keys.windows(2).any(|w| w[0] == w[1]) {
                    return Err(EncodeError::Semantic);
                }
                keys.iter().flat_map(|k| k.to_be_bytes()).collect()
            }
            KEY_ALPN => {
                let raw = value.ok_or(EncodeError::Syntax)?;
                let mut wire = Vec::new();
                for item in decode_list(raw)? {
                    if item.is_empty() || item.len() > 255 {
                        return Err(EncodeError::Syntax);
                    }
                    wire.push(item.len() as u8);
                    wire.extend_from_slice(&item);
                }
                wire
            }
            KEY_NO_DEFAULT_ALPN => {
                if value.is_some() {
                    return Err(EncodeError::Syntax);
                }
                Vec::new()
            }
            KEY_PORT => {
                let raw = value.ok_or(EncodeError::Syntax)?;
                let port = decimal(raw, 65_535)?;
                (port as u16).to_be_bytes().to_vec()
            }
            KEY_IPV4HINT => {
                let raw = value.ok_or(EncodeError::Syntax)?;
                let mut wire = Vec::new();
                for item in decode_list(raw)? {
                    wire.extend_from_slice(&ip4(&item)?.octets());
                }
                wire
            }
            KEY_IPV6HINT => {
                let raw = value.ok_or(EncodeError::Syntax)?;
                let mut wire = Vec::new();
                for item in decode_list(raw)? {
                    wire.extend_from_slice(&ip6(&item)?.octets());
                }
                wire
            }
            KEY_ECH => {
                let raw = value.ok_or(EncodeError::Syntax)?;
                let mut rdata = Rdata::new();
                let mut decoder = Base64::default();
                decoder.feed(raw, &mut rdata)?;
                decoder.finish()?;
                rdata.as_slice().to_vec()
            }
            _ => match value {
                Some(raw) => decode(raw)?,
                None => Vec::new(),
            },
        };
        if wire.len() > u16::MAX as usize {
            return Err(EncodeError::Semantic);
        }
        self.params.push((key, wire));
        Ok(())
    }

    pub(crate) fn finish(&mut self, rdata: &mut Rdata) -> Result<(), EncodeError> {
        if self.pending.is_some() {
            return Err(EncodeError::Syntax);
        }
        self.params.sort_by_key(|(key, _)| *key);
        if self.params.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(EncodeError::Semantic);
        }
        // every key listed in mandatory must actually be present
        if let Some((_, mandatory)) = self.params.iter().find(|(k, _)| *k == KEY_MANDATORY) {
            for pair in mandatory.chunks(2) {
                let key = u16::from_be_bytes([pair[0], pair[1]]);
                if !self.params.iter().any(|(k, _)| *k == key) {
                    return Err(EncodeError::Semantic);
                }
            }
        }
        for (key, value) in &self.params {
            rdata.write_u16(*key)?;
            rdata.write_u16(value.len() as u16)?;
            rdata.write(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(tokens: &[&[u8]]) -> Result<Vec<u8>, EncodeError> {
        let mut set = ParamSet::default();
        set.begin();
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            if set.add_token(token)? == Fed::NeedValue {
                let value = iter.next().expect("test supplies the value token");
                set.add_value(value)?;
            }
        }
        let mut rdata = Rdata::new();
        set.finish(&mut rdata)?;
        Ok(rdata.as_slice().to_vec())
    }

    #[test]
    fn alpn_and_port_sort_by_key() {
        let wire = encode(&[b"port=8443", b"alpn=h2,h3"]).unwrap();
        assert_eq!(
            wire,
            vec![
                0x00, 0x01, 0x00, 0x06, 0x02, b'h', b'2', 0x02, b'h', b'3', // alpn
                0x00, 0x03, 0x00, 0x02, 0x20, 0xfb, // port 8443
            ]
        );
    }

    #[test]
    fn quoted_value_follows_the_equals() {
        let wire = encode(&[b"alpn=", b"h2,h3"]).unwrap();
        assert_eq!(&wire[..4], &[0x00, 0x01, 0x00, 0x06]);
    }

    #[test]
    fn escaped_comma_is_literal() {
        let wire = encode(&[b"alpn=h\\044x"]).unwrap();
        // one item "h,x"
        assert_eq!(wire, vec![0x00, 0x01, 0x00, 0x04, 0x03, b'h', b',', b'x']);
    }

    #[test]
    fn no_default_alpn_refuses_a_value() {
        assert!(encode(&[b"no-default-alpn"]).is_ok());
        assert!(encode(&[b"no-default-alpn=x"]).is_err());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        assert_eq!(
            encode(&[b"port=1", b"port=2"]).unwrap_err(),
            EncodeError::Semantic
        );
        assert_eq!(
            encode(&[b"port=1", b"key3=x"]).unwrap_err(),
            EncodeError::Semantic
        );
    }

    #[test]
    fn mandatory_lists_present_keys() {
        let wire = encode(&[b"mandatory=alpn", b"alpn=h2"]).unwrap();
        assert_eq!(&wire[..6], &[0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
        assert_eq!(
            encode(&[b"mandatory=alpn"]).unwrap_err(),
            EncodeError::Semantic
        );
        assert_eq!(
            encode(&[b"mandatory=mandatory"]).unwrap_err(),
            EncodeError::Semantic
        );
    }

    #[test]
    fn hints_and_generic_keys() {
        let wire = encode(&[b"ipv4hint=192.0.2.1,192.0.2.2"]).unwrap();
        assert_eq!(
            wire,
            vec![0x00, 0x04, 0x00, 0x08, 192, 0, 2, 1, 192, 0, 2, 2]
        );
        let wire = encode(&[b"key65280=abc"]).unwrap();
        assert_eq!(wire, vec![0xff, 0x00, 0x00, 0x03, b'a', b'b', b'c']);
        assert!(encode(&[b"bogus=1"]).is_err());
    }

    #[test]
    fn ech_is_base64() {
        let wire = encode(&[b"ech=Zm9v"]).unwrap();
        assert_eq!(wire, vec![0x00, 0x05, 0x00, 0x03, b'f', b'o', b'o']);
        assert!(encode(&[b"ech=!!"]).is_err());
    }
}
