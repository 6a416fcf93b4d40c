//! Network profiles (chain parameters)
//!
//! Holds the consensus and network constants for the three CLAM networks and
//! tracks which one is active for the process. Profiles are plain records:
//! testnet is built from mainnet by an explicit override step, and regtest is
//! built from testnet the same way.
//!
//! Selection happens once during startup. The RPC server seals the registry
//! when it starts, after which the active profile can no longer change.

pub mod seeds;

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

pub use seeds::{FixedSeed, SeedSpec6};

/// Network identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkKind {
    Main,
    Test,
    Regression,
}

impl NetworkKind {
    pub const ALL: [NetworkKind; 3] = [NetworkKind::Main, NetworkKind::Test, NetworkKind::Regression];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Main => "main",
            NetworkKind::Test => "test",
            NetworkKind::Regression => "regtest",
        }
    }

    fn index(self) -> u8 {
        match self {
            NetworkKind::Main => 0,
            NetworkKind::Test => 1,
            NetworkKind::Regression => 2,
        }
    }

    fn from_index(index: u8) -> Self {
        match index {
            1 => NetworkKind::Test,
            2 => NetworkKind::Regression,
            _ => NetworkKind::Main,
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkKind {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Ok(NetworkKind::Main),
            "test" | "testnet" => Ok(NetworkKind::Test),
            "regtest" | "regression" => Ok(NetworkKind::Regression),
            _ => Err(ProfileError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Network profile selection errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Invalid combination of -regtest and -testnet.")]
    ConflictingNetworkFlags,
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
    #[error("network profile already in use; selection is closed once services start")]
    Sealed,
}

/// Base58 version bytes for the address encodings the node understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base58Prefixes {
    pub pubkey_address: u8,
    pub script_address: u8,
    pub secret_key: u8,
    /// Foreign private key formats accepted on import
    pub secret_key_btc: u8,
    pub secret_key_ltc: u8,
    pub secret_key_doge: u8,
    pub ext_public_key: [u8; 4],
    pub ext_secret_key: [u8; 4],
}

/// Genesis block header fields plus the derived header hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisDescriptor {
    pub version: i32,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    pub merkle_root: [u8; 32],
    /// Double-SHA256 of the serialized header, internal byte order
    pub hash: [u8; 32],
}

impl GenesisDescriptor {
    /// Build a headers-only genesis with an empty merkle root.
    pub fn new(time: u32, bits: u32, nonce: u32) -> Self {
        let mut genesis = Self {
            version: 1,
            time,
            bits,
            nonce,
            merkle_root: [0u8; 32],
            hash: [0u8; 32],
        };
        genesis.hash = genesis.compute_hash();
        genesis
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut header = Vec::with_capacity(80);
        header.extend_from_slice(&self.version.to_le_bytes());
        header.extend_from_slice(&[0u8; 32]);
        header.extend_from_slice(&self.merkle_root);
        header.extend_from_slice(&self.time.to_le_bytes());
        header.extend_from_slice(&self.bits.to_le_bytes());
        header.extend_from_slice(&self.nonce.to_le_bytes());

        let first = Sha256::digest(&header);
        Sha256::digest(first).into()
    }

    /// Hash as conventionally displayed (byte-reversed hex)
    pub fn hash_hex(&self) -> String {
        let mut reversed = self.hash;
        reversed.reverse();
        hex::encode(reversed)
    }
}

/// `~0 >> shift` as a big-endian 256-bit number
pub fn pow_limit_shifted(shift: u32) -> [u8; 32] {
    let mut out = [0xffu8; 32];
    let whole = (shift / 8) as usize;
    for byte in out.iter_mut().take(whole.min(32)) {
        *byte = 0;
    }
    if whole < 32 {
        out[whole] = 0xff >> (shift % 8);
    }
    out
}

/// Compact ("nBits") encoding of a big-endian 256-bit number
pub fn compact_from_be(value: &[u8; 32]) -> u32 {
    let first = match value.iter().position(|b| *b != 0) {
        Some(first) => first,
        None => return 0,
    };
    let mut size = (32 - first) as u32;
    let mut mantissa = 0u32;
    for k in 0..3 {
        mantissa <<= 8;
        if let Some(b) = value.get(first + k) {
            mantissa |= u32::from(*b);
        }
    }
    if mantissa & 0x0080_0000 != 0 {
        mantissa >>= 8;
        size += 1;
    }
    mantissa | (size << 24)
}

/// Consensus and network constants for one network
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub kind: NetworkKind,
    pub message_start: [u8; 4],
    /// Uncompressed alert key, hex
    pub alert_pubkey: &'static str,
    pub default_port: u16,
    pub rpc_port: u16,
    /// Proof-of-work ceiling, big-endian
    pub pow_limit: [u8; 32],
    pub base58: Base58Prefixes,
    pub genesis: GenesisDescriptor,
    pub dns_seeds: Vec<&'static str>,
    pub fixed_seeds: Vec<FixedSeed>,
    /// Subdirectory of the data directory; empty for mainnet
    pub data_dir: &'static str,
    pub require_rpc_password: bool,
}

const ALERT_PUBKEY: &str = "044a872af7f5530746e958ab0aae3ef949ed3ca536b5feeb3d84ce22814ae34e10bfdd1cd85937dd01c3097d45fe8be1ef97ab787b5363474c9f39dd76c6bd2263";

impl NetworkProfile {
    pub fn main() -> Self {
        let now = unix_now();
        let pow_limit = pow_limit_shifted(20);
        Self {
            kind: NetworkKind::Main,
            message_start: [0x02, 0x22, 0x35, 0x15],
            alert_pubkey: ALERT_PUBKEY,
            default_port: 31184,
            rpc_port: 30184,
            pow_limit,
            base58: Base58Prefixes {
                pubkey_address: 137,
                script_address: 13,
                secret_key: 133,
                secret_key_btc: 128,
                secret_key_ltc: 176,
                secret_key_doge: 158,
                ext_public_key: [0x04, 0x88, 0xB2, 0x1E],
                ext_secret_key: [0x04, 0x88, 0xAD, 0xE4],
            },
            genesis: GenesisDescriptor::new(1397512438, compact_from_be(&pow_limit), 2054231),
            dns_seeds: seeds::MAINNET_DNS_SEEDS.to_vec(),
            fixed_seeds: seeds::convert_seed6(seeds::MAINNET_FIXED_SEEDS, now),
            data_dir: "",
            require_rpc_password: true,
        }
    }

    pub fn testnet() -> Self {
        let mut profile = Self::main();
        profile.kind = NetworkKind::Test;
        profile.message_start = [0xc3, 0xf1, 0xc0, 0xdf];
        profile.pow_limit = pow_limit_shifted(16);
        profile.default_port = 35724;
        profile.rpc_port = 35725;
        profile.data_dir = "testnet";
        profile.genesis =
            GenesisDescriptor::new(1397512438, compact_from_be(&profile.pow_limit), 15165);
        profile.dns_seeds.clear();
        profile.fixed_seeds = seeds::convert_seed6(seeds::TESTNET_FIXED_SEEDS, unix_now());
        profile.base58.pubkey_address = 111;
        profile.base58.script_address = 196;
        profile.base58.secret_key = 239;
        profile.base58.ext_public_key = [0x04, 0x35, 0x87, 0xCF];
        profile.base58.ext_secret_key = [0x04, 0x35, 0x83, 0x94];
        profile
    }

    pub fn regtest() -> Self {
        let mut profile = Self::testnet();
        profile.kind = NetworkKind::Regression;
        profile.message_start = [0xf9, 0xbf, 0xb5, 0xda];
        profile.pow_limit = pow_limit_shifted(1);
        profile.genesis = GenesisDescriptor::new(1411111111, compact_from_be(&profile.pow_limit), 2);
        profile.default_port = 18445;
        profile.data_dir = "regtest";
        profile.dns_seeds.clear();
        profile.require_rpc_password = false;
        profile
    }

    pub fn for_kind(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Main => Self::main(),
            NetworkKind::Test => Self::testnet(),
            NetworkKind::Regression => Self::regtest(),
        }
    }

    /// Network-specific data directory below `base`
    pub fn data_dir_in(&self, base: &Path) -> PathBuf {
        if self.data_dir.is_empty() {
            base.to_path_buf()
        } else {
            base.join(self.data_dir)
        }
    }

    pub fn pow_limit_bits(&self) -> u32 {
        compact_from_be(&self.pow_limit)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// All network profiles plus the process-wide active selection
pub struct NetworkRegistry {
    profiles: [NetworkProfile; 3],
    active: AtomicU8,
    sealed: AtomicBool,
}

impl NetworkRegistry {
    /// Build every profile; mainnet starts out active.
    pub fn new() -> Self {
        Self {
            profiles: [
                NetworkProfile::main(),
                NetworkProfile::testnet(),
                NetworkProfile::regtest(),
            ],
            active: AtomicU8::new(NetworkKind::Main.index()),
            sealed: AtomicBool::new(false),
        }
    }

    pub fn profile(&self, kind: NetworkKind) -> &NetworkProfile {
        &self.profiles[kind.index() as usize]
    }

    pub fn active(&self) -> &NetworkProfile {
        self.profile(self.active_kind())
    }

    pub fn active_kind(&self) -> NetworkKind {
        NetworkKind::from_index(self.active.load(Ordering::Acquire))
    }

    /// Make `kind` the active profile. Fails once the registry is sealed.
    pub fn select(&self, kind: NetworkKind) -> Result<(), ProfileError> {
        if self.is_sealed() {
            return Err(ProfileError::Sealed);
        }
        self.active.store(kind.index(), Ordering::Release);
        debug!("Selected network profile: {}", kind);
        Ok(())
    }

    /// Apply the `-regtest` / `-testnet` startup flags.
    ///
    /// Requesting both is a configuration error; the active profile is left
    /// untouched and the caller is expected to abort startup.
    pub fn select_from_startup_flags(
        &self,
        regtest: bool,
        testnet: bool,
    ) -> Result<NetworkKind, ProfileError> {
        if regtest && testnet {
            return Err(ProfileError::ConflictingNetworkFlags);
        }
        let kind = if regtest {
            NetworkKind::Regression
        } else if testnet {
            NetworkKind::Test
        } else {
            NetworkKind::Main
        };
        self.select(kind)?;
        Ok(kind)
    }

    /// Freeze the selection. Idempotent.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            info!("Network profile sealed: {}", self.active_kind());
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
