//! Static type descriptors: one field list per record type.
//!
//! The parser walks a record's descriptor and dispatches each field to its
//! encoder. Field kinds that consume a variable number of tokens (sequences,
//! bitmaps, parameter lists) are always the final field of their type. Field
//! names only serve error messages.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    /// Domain name, absolute or relative to the origin.
    Name,
    Int8,
    Int16,
    Int32,
    /// 32-bit value accepting `1h30m`-style durations.
    Ttl,
    /// `YYYYMMDDHHmmSS`, encoded as epoch seconds.
    Time,
    Ip4,
    Ip6,
    /// Record-type mnemonic or `TYPEnn`, encoded as u16.
    TypeCode,
    /// DNSSEC algorithm mnemonic or number, encoded as u8.
    Algorithm,
    /// Certificate-type mnemonic or number, encoded as u16.
    CertType,
    /// `tcp`, `udp` or a protocol number, encoded as u8.
    Protocol,
    /// CAA tag: 1–15 alphanumeric bytes, length-prefixed.
    CaaTag,
    /// One character-string, length-prefixed, at most 255 bytes.
    String,
    /// Optional trailing character-string.
    StringOpt,
    /// One or more character-strings.
    StringSeq,
    /// Raw text without a length prefix, one token, to end of record.
    Remainder,
    /// `-` (empty) or hex, length-prefixed; NSEC3 salt.
    Salt,
    /// Base32hex, length-prefixed; NSEC3 next hashed owner.
    Base32,
    /// Hex blob spanning the remaining tokens.
    Base16Seq,
    /// Base64 blob spanning the remaining tokens.
    Base64Seq,
    /// Like `Base64Seq` but may be absent.
    Base64Opt,
    /// NSEC windowed type bitmap.
    NsecBitmap,
    /// NXT single-window type bitmap (types 0–127).
    NxtBitmap,
    /// WKS service list, encoded as a port bitmap.
    WksServices,
    /// SVCB/HTTPS service parameters.
    SvcbParams,
    Eui48,
    Eui64,
    /// 64-bit ILNP locator/identifier, `xxxx:xxxx:xxxx:xxxx`.
    Ilnp64,
    /// NSAP address, `0x` followed by hex with optional dots.
    Nsap,
    /// APL address prefix list.
    Apl,
    /// LOC presentation format (RFC 1876).
    Loc,
    /// IPSECKEY gateway; its shape depends on the gateway-type field.
    IpsecGateway,
}

impl FieldKind {
    /// Kinds that drive the lexer themselves and end at the delimiter.
    pub(crate) fn is_greedy(self) -> bool {
        matches!(
            self,
            FieldKind::StringOpt
                | FieldKind::StringSeq
                | FieldKind::Base16Seq
                | FieldKind::Base64Seq
                | FieldKind::Base64Opt
                | FieldKind::NsecBitmap
                | FieldKind::NxtBitmap
                | FieldKind::WksServices
                | FieldKind::SvcbParams
                | FieldKind::Apl
                | FieldKind::Loc
        )
    }
}

#[derive(Debug)]
pub(crate) struct FieldInfo {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub(crate) struct TypeInfo {
    pub name: &'static str,
    pub code: u16,
    pub fields: &'static [FieldInfo],
}

const fn field(name: &'static str, kind: FieldKind) -> FieldInfo {
    FieldInfo { name, kind }
}

use FieldKind::*;

const RDATA_A: &[FieldInfo] = &[field("address", Ip4)];
const RDATA_NAME: &[FieldInfo] = &[field("host", Name)];
const RDATA_AAAA: &[FieldInfo] = &[field("address", Ip6)];
const RDATA_SOA: &[FieldInfo] = &[
    field("primary", Name),
    field("mailbox", Name),
    field("serial", Int32),
    field("refresh", Ttl),
    field("retry", Ttl),
    field("expire", Ttl),
    field("minimum", Ttl),
];
const RDATA_WKS: &[FieldInfo] = &[
    field("address", Ip4),
    field("protocol", Protocol),
    field("services", WksServices),
];
const RDATA_HINFO: &[FieldInfo] = &[field("cpu", String), field("os", String)];
const RDATA_MINFO: &[FieldInfo] = &[field("rmailbx", Name), field("emailbx", Name)];
const RDATA_MX: &[FieldInfo] = &[field("priority", Int16), field("hostname", Name)];
const RDATA_TXT: &[FieldInfo] = &[field("text", StringSeq)];
const RDATA_RP: &[FieldInfo] = &[field("mailbox", Name), field("text", Name)];
const RDATA_AFSDB: &[FieldInfo] = &[field("subtype", Int16), field("hostname", Name)];
const RDATA_X25: &[FieldInfo] = &[field("address", String)];
const RDATA_ISDN: &[FieldInfo] = &[field("address", String), field("subaddress", StringOpt)];
const RDATA_RT: &[FieldInfo] = &[field("preference", Int16), field("hostname", Name)];
const RDATA_NSAP: &[FieldInfo] = &[field("address", Nsap)];
const RDATA_KEY: &[FieldInfo] = &[
    field("flags", Int16),
    field("protocol", Int8),
    field("algorithm", Algorithm),
    field("public key", Base64Seq),
];
const RDATA_PX: &[FieldInfo] = &[
    field("preference", Int16),
    field("map822", Name),
    field("mapx400", Name),
];
const RDATA_LOC: &[FieldInfo] = &[field("location", Loc)];
const RDATA_NXT: &[FieldInfo] = &[field("next domain", Name), field("type bit map", NxtBitmap)];
const RDATA_SRV: &[FieldInfo] = &[
    field("priority", Int16),
    field("weight", Int16),
    field("port", Int16),
    field("target", Name),
];
const RDATA_NAPTR: &[FieldInfo] = &[
    field("order", Int16),
    field("preference", Int16),
    field("flags", String),
    field("services", String),
    field("regex", String),
    field("replacement", Name),
];
const RDATA_KX: &[FieldInfo] = &[field("preference", Int16), field("exchanger", Name)];
const RDATA_CERT: &[FieldInfo] = &[
    field("type", CertType),
    field("key tag", Int16),
    field("algorithm", Algorithm),
    field("certificate", Base64Seq),
];
const RDATA_APL: &[FieldInfo] = &[field("prefix list", Apl)];
const RDATA_DS: &[FieldInfo] = &[
    field("keytag", Int16),
    field("algorithm", Algorithm),
    field("digtype", Int8),
    field("digest", Base16Seq),
];
const RDATA_SSHFP: &[FieldInfo] = &[
    field("algorithm", Int8),
    field("ftype", Int8),
    field("fingerprint", Base16Seq),
];
const RDATA_IPSECKEY: &[FieldInfo] = &[
    field("precedence", Int8),
    field("gateway type", Int8),
    field("algorithm", Int8),
    field("gateway", IpsecGateway),
    field("public key", Base64Opt),
];
const RDATA_RRSIG: &[FieldInfo] = &[
    field("sigtype", TypeCode),
    field("algorithm", Algorithm),
    field("labels", Int8),
    field("origttl", Ttl),
    field("expiration", Time),
    field("inception", Time),
    field("key tag", Int16),
    field("signer", Name),
    field("signature", Base64Seq),
];
const RDATA_NSEC: &[FieldInfo] = &[field("next", Name), field("types", NsecBitmap)];
const RDATA_DNSKEY: &[FieldInfo] = &[
    field("flags", Int16),
    field("protocol", Int8),
    field("algorithm", Algorithm),
    field("key", Base64Seq),
];
const RDATA_DHCID: &[FieldInfo] = &[field("dhcid", Base64Seq)];
const RDATA_NSEC3: &[FieldInfo] = &[
    field("algorithm", Int8),
    field("flags", Int8),
    field("iterations", Int16),
    field("salt", Salt),
    field("next", Base32),
    field("types", NsecBitmap),
];
const RDATA_NSEC3PARAM: &[FieldInfo] = &[
    field("algorithm", Int8),
    field("flags", Int8),
    field("iterations", Int16),
    field("salt", Salt),
];
const RDATA_TLSA: &[FieldInfo] = &[
    field("usage", Int8),
    field("selector", Int8),
    field("matching type", Int8),
    field("certificate", Base16Seq),
];
const RDATA_OPENPGPKEY: &[FieldInfo] = &[field("key", Base64Seq)];
const RDATA_CSYNC: &[FieldInfo] = &[
    field("serial", Int32),
    field("flags", Int16),
    field("types", NsecBitmap),
];
const RDATA_SVCB: &[FieldInfo] = &[
    field("priority", Int16),
    field("target", Name),
    field("params", SvcbParams),
];
const RDATA_NID: &[FieldInfo] = &[field("preference", Int16), field("node id", Ilnp64)];
const RDATA_L32: &[FieldInfo] = &[field("preference", Int16), field("locator", Ip4)];
const RDATA_L64: &[FieldInfo] = &[field("preference", Int16), field("locator", Ilnp64)];
const RDATA_LP: &[FieldInfo] = &[field("preference", Int16), field("pointer", Name)];
const RDATA_EUI48: &[FieldInfo] = &[field("address", Eui48)];
const RDATA_EUI64: &[FieldInfo] = &[field("address", Eui64)];
const RDATA_URI: &[FieldInfo] = &[
    field("priority", Int16),
    field("weight", Int16),
    field("target", Remainder),
];
const RDATA_CAA: &[FieldInfo] = &[
    field("flags", Int8),
    field("tag", CaaTag),
    field("value", Remainder),
];

/// Every supported type, alphabetically by mnemonic. OPT is deliberately
/// absent: it cannot appear in a master file (`TYPE41` with generic RDATA
/// still parses).
pub(crate) const TYPES: &[TypeInfo] = &[
    TypeInfo { name: "A", code: 1, fields: RDATA_A },
    TypeInfo { name: "AAAA", code: 28, fields: RDATA_AAAA },
    TypeInfo { name: "AFSDB", code: 18, fields: RDATA_AFSDB },
    TypeInfo { name: "APL", code: 42, fields: RDATA_APL },
    TypeInfo { name: "AVC", code: 258, fields: RDATA_TXT },
    TypeInfo { name: "CAA", code: 257, fields: RDATA_CAA },
    TypeInfo { name: "CDNSKEY", code: 60, fields: RDATA_DNSKEY },
    TypeInfo { name: "CDS", code: 59, fields: RDATA_DS },
    TypeInfo { name: "CERT", code: 37, fields: RDATA_CERT },
    TypeInfo { name: "CNAME", code: 5, fields: RDATA_NAME },
    TypeInfo { name: "CSYNC", code: 62, fields: RDATA_CSYNC },
    TypeInfo { name: "DHCID", code: 49, fields: RDATA_DHCID },
    TypeInfo { name: "DLV", code: 32769, fields: RDATA_DS },
    TypeInfo { name: "DNAME", code: 39, fields: RDATA_NAME },
    TypeInfo { name: "DNSKEY", code: 48, fields: RDATA_DNSKEY },
    TypeInfo { name: "DS", code: 43, fields: RDATA_DS },
    TypeInfo { name: "EUI48", code: 108, fields: RDATA_EUI48 },
    TypeInfo { name: "EUI64", code: 109, fields: RDATA_EUI64 },
    TypeInfo { name: "HINFO", code: 13, fields: RDATA_HINFO },
    TypeInfo { name: "HTTPS", code: 65, fields: RDATA_SVCB },
    TypeInfo { name: "IPSECKEY", code: 45, fields: RDATA_IPSECKEY },
    TypeInfo { name: "ISDN", code: 20, fields: RDATA_ISDN },
    TypeInfo { name: "KEY", code: 25, fields: RDATA_KEY },
    TypeInfo { name: "KX", code: 36, fields: RDATA_KX },
    TypeInfo { name: "L32", code: 105, fields: RDATA_L32 },
    TypeInfo { name: "L64", code: 106, fields: RDATA_L64 },
    TypeInfo { name: "LOC", code: 29, fields: RDATA_LOC },
    TypeInfo { name: "LP", code: 107, fields: RDATA_LP },
    TypeInfo { name: "MB", code: 7, fields: RDATA_NAME },
    TypeInfo { name: "MD", code: 3, fields: RDATA_NAME },
    TypeInfo { name: "MF", code: 4, fields: RDATA_NAME },
    TypeInfo { name: "MG", code: 8, fields: RDATA_NAME },
    TypeInfo { name: "MINFO", code: 14, fields: RDATA_MINFO },
    TypeInfo { name: "MR", code: 9, fields: RDATA_NAME },
    TypeInfo { name: "MX", code: 15, fields: RDATA_MX },
    TypeInfo { name: "NAPTR", code: 35, fields: RDATA_NAPTR },
    TypeInfo { name: "NID", code: 104, fields: RDATA_NID },
    TypeInfo { name: "NS", code: 2, fields: RDATA_NAME },
    TypeInfo { name: "NSAP", code: 22, fields: RDATA_NSAP },
    TypeInfo { name: "NSEC", code: 47, fields: RDATA_NSEC },
    TypeInfo { name: "NSEC3", code: 50, fields: RDATA_NSEC3 },
    TypeInfo { name: "NSEC3PARAM", code: 51, fields: RDATA_NSEC3PARAM },
    TypeInfo { name: "NXT", code: 30, fields: RDATA_NXT },
    TypeInfo { name: "OPENPGPKEY", code: 61, fields: RDATA_OPENPGPKEY },
    TypeInfo { name: "PTR", code: 12, fields: RDATA_NAME },
    TypeInfo { name: "PX", code: 26, fields: RDATA_PX },
    TypeInfo { name: "RP", code: 17, fields: RDATA_RP },
    TypeInfo { name: "RRSIG", code: 46, fields: RDATA_RRSIG },
    TypeInfo { name: "RT", code: 21, fields: RDATA_RT },
    TypeInfo { name: "SIG", code: 24, fields: RDATA_RRSIG },
    TypeInfo { name: "SMIMEA", code: 53, fields: RDATA_TLSA },
    TypeInfo { name: "SOA", code: 6, fields: RDATA_SOA },
    TypeInfo { name: "SPF", code: 99, fields: RDATA_TXT },
    TypeInfo { name: "SRV", code: 33, fields: RDATA_SRV },
    TypeInfo { name: "SSHFP", code: 44, fields: RDATA_SSHFP },
    TypeInfo { name: "SVCB", code: 64, fields: RDATA_SVCB },
    TypeInfo { name: "TLSA", code: 52, fields: RDATA_TLSA },
    TypeInfo { name: "TXT", code: 16, fields: RDATA_TXT },
    TypeInfo { name: "URI", code: 256, fields: RDATA_URI },
    TypeInfo { name: "WKS", code: 11, fields: RDATA_WKS },
    TypeInfo { name: "X25", code: 19, fields: RDATA_X25 },
];

/// Descriptor lookup by numeric code, for `TYPEnn` naming a known type.
pub(crate) fn by_code(code: u16) -> Option<&'static TypeInfo> {
    TYPES.iter().find(|t| t.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_fields_are_always_last() {
        for ty in TYPES {
            for (i, field) in ty.fields.iter().enumerate() {
                if field.kind.is_greedy() {
                    assert_eq!(i + 1, ty.fields.len(), "{} has interior greedy field", ty.name);
                }
            }
        }
    }

    #[test]
    fn codes_are_unique() {
        for (i, a) in TYPES.iter().enumerate() {
            for b in &TYPES[i + 1..] {
                assert_ne!(a.code, b.code, "{} and {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn by_code_finds_types() {
        assert_eq!(by_code(1).unwrap().name, "A");
        assert_eq!(by_code(47).unwrap().name, "NSEC");
        assert_eq!(by_code(32769).unwrap().name, "DLV");
        assert!(by_code(41).is_none()); // OPT
    }
}
