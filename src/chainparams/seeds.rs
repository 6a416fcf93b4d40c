//! Seed peers for initial address discovery
//!
//! DNS seeds are resolved by the networking layer; fixed seeds are compiled-in
//! IPv6/port records used when DNS seeding yields nothing.

use rand::Rng;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};

const ONE_WEEK: u64 = 7 * 24 * 60 * 60;

/// Mainnet DNS seeds
pub const MAINNET_DNS_SEEDS: &[&str] = &["seed.willmathforcrypto.com"];

/// Compiled-in seed record: 16-byte IPv6 (IPv4 as `::ffff:a.b.c.d`) and port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSpec6 {
    pub addr: [u8; 16],
    pub port: u16,
}

// No fixed seeds ship: peers come from the DNS seeds and from address gossip.
// `convert_seed6` still handles records passed in from elsewhere.
pub const MAINNET_FIXED_SEEDS: &[SeedSpec6] = &[];
pub const TESTNET_FIXED_SEEDS: &[SeedSpec6] = &[];

/// A fixed seed converted to a socket address with a synthetic last-seen time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeed {
    pub addr: SocketAddr,
    pub last_seen: u64,
}

/// Convert seed records into addresses.
///
/// Each seed gets a random last-seen time between one and two weeks before
/// `now`, so the address manager prefers fresher addresses learned from peers.
pub fn convert_seed6(specs: &[SeedSpec6], now: u64) -> Vec<FixedSeed> {
    let mut rng = rand::thread_rng();
    specs
        .iter()
        .map(|spec| {
            let v6 = Ipv6Addr::from(spec.addr);
            let ip = match v6.to_ipv4_mapped() {
                Some(v4) => IpAddr::V4(v4),
                None => IpAddr::V6(v6),
            };
            let jitter = rng.gen_range(0..ONE_WEEK);
            FixedSeed {
                addr: SocketAddr::new(ip, spec.port),
                last_seen: now.saturating_sub(jitter).saturating_sub(ONE_WEEK),
            }
        })
        .collect()
}
