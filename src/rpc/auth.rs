//! RPC Authentication and Authorization
//!
//! HTTP Basic credentials checked in constant time, and the `rpcallowip`
//! client filter applied to every accepted connection.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

/// Passwords shorter than this get a delay after each failed attempt
pub const WEAK_PASSWORD_LEN: usize = 20;

/// Configured `rpcuser:rpcpassword` pair
pub struct RpcCredentials {
    expected: Zeroizing<String>,
    password_len: usize,
}

impl RpcCredentials {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            expected: Zeroizing::new(format!("{}:{}", user, password)),
            password_len: password.len(),
        }
    }

    /// Check an `Authorization` header value.
    ///
    /// The value must start with exactly `Basic `; the rest is trimmed,
    /// base64-decoded and compared against `user:password` without
    /// short-circuiting on the first differing byte.
    pub fn authorized(&self, header: &str) -> bool {
        let Some(encoded) = header.strip_prefix("Basic ") else {
            debug!("Authorization header is not Basic");
            return false;
        };
        let decoded = match STANDARD.decode(encoded.trim()) {
            Ok(decoded) => Zeroizing::new(decoded),
            Err(_) => return false,
        };
        bool::from(decoded.as_slice().ct_eq(self.expected.as_bytes()))
    }

    /// Whether failed attempts should be slowed down
    pub fn is_weak(&self) -> bool {
        self.password_len < WEAK_PASSWORD_LEN
    }
}

impl std::fmt::Debug for RpcCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcCredentials").finish_non_exhaustive()
    }
}

/// `rpcallowip` patterns; loopback is always allowed
#[derive(Debug, Clone, Default)]
pub struct RpcAllowList {
    patterns: Vec<String>,
}

impl RpcAllowList {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// No patterns configured: the server only listens on loopback
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn client_allowed(&self, address: IpAddr) -> bool {
        let address = normalize(address);
        let loopback = match address {
            IpAddr::V4(v4) => v4.is_loopback(),
            IpAddr::V6(v6) => v6 == Ipv6Addr::LOCALHOST,
        };
        if loopback {
            return true;
        }

        let text = address.to_string();
        self.patterns
            .iter()
            .any(|pattern| wildcard_match(&text, pattern))
    }
}

/// Map IPv4-mapped (`::ffff:a.b.c.d`) and IPv4-compatible (`::a.b.c.d`)
/// addresses to plain IPv4. `::` and `::1` stay IPv6.
pub fn normalize(address: IpAddr) -> IpAddr {
    match address {
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return IpAddr::V4(v4);
            }
            let octets = v6.octets();
            let compatible = octets[..12].iter().all(|b| *b == 0)
                && !(octets[12] == 0 && octets[13] == 0 && octets[14] == 0 && octets[15] <= 1);
            if compatible {
                IpAddr::V4(Ipv4Addr::new(octets[12], octets[13], octets[14], octets[15]))
            } else {
                address
            }
        }
        IpAddr::V4(_) => address,
    }
}

/// Glob match where `*` matches any run of characters and `?` exactly one.
pub fn wildcard_match(text: &str, pattern: &str) -> bool {
    let text = text.as_bytes();
    let pattern = pattern.as_bytes();
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // Let the last star absorb one more character
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == b'*')
}
