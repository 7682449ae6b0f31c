//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Parser options. Deserializable so embedders can load them from a config
/// file; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Appended to relative names. Must be absolute (trailing dot).
    /// Required before the first relative name is seen.
    pub origin: Option<String>,
    /// Used when a record omits its TTL and no `$TTL` has appeared.
    pub default_ttl: Option<u32>,
    /// Numeric record class; 1 = IN.
    pub default_class: u16,
    /// Accept `TYPEnn`/`CLASSnn` mnemonics and the `\# len hex` generic
    /// RDATA form (RFC 3597).
    pub accept_unknown_rrtype: bool,
    /// Accept `1h30m`-style durations wherever a TTL is expected.
    pub pretty_ttl: bool,
    /// Honour `$INCLUDE`; when false it raises `NotPermitted`.
    pub allow_includes: bool,
    /// Maximum `$INCLUDE` nesting.
    pub include_depth: u32,
    /// Input window size in bytes; rounded up to a multiple of 64. Small
    /// values exercise the refill path, large values amortise scanning.
    pub window_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            origin: None,
            default_ttl: None,
            default_class: 1,
            accept_unknown_rrtype: true,
            pretty_ttl: true,
            allow_includes: true,
            include_depth: 10,
            window_size: 64 * 1024,
        }
    }
}
