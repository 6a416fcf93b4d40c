//! Node state shared with the RPC layer
//!
//! The RPC core only sees the rest of the node through the narrow traits in
//! this module. `NodeContext` bundles them with the two process-wide locks
//! (chain state, then wallet) and the shutdown signal.

use crate::chainparams::{NetworkProfile, NetworkRegistry};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::info;

/// Read-only view of the block chain and peer state
pub trait ChainView: Send + Sync {
    fn block_count(&self) -> u64;
    /// Tip hash, display hex
    fn best_block_hash(&self) -> String;
    /// Difficulty of the tip relative to the minimum
    fn difficulty(&self) -> f64;
    fn connection_count(&self) -> usize;
    /// Network-adjusted time offset in seconds
    fn time_offset(&self) -> i64 {
        0
    }
}

/// Wallet facts reported by `getinfo`
pub trait WalletInfo: Send + Sync {
    fn wallet_version(&self) -> u32;
    /// Spendable balance in base units
    fn balance(&self) -> i64;
    fn key_pool_size(&self) -> usize;
    /// Unix time the wallet relocks at; `None` when unencrypted
    fn unlocked_until(&self) -> Option<i64> {
        None
    }
}

/// Where a warning is going to be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Checked before every non safe-mode command
    Rpc,
    /// Human-facing summary (`getinfo.errors`)
    StatusBar,
}

pub trait WarningSource: Send + Sync {
    /// Current warning text, empty when there is none
    fn warnings(&self, kind: WarningKind) -> String;
}

/// Settable warning text, shared by both warning kinds
#[derive(Default)]
pub struct WarningBoard {
    text: RwLock<String>,
}

impl WarningBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, warning: impl Into<String>) {
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = warning.into();
    }

    pub fn clear(&self) {
        self.set(String::new());
    }
}

impl WarningSource for WarningBoard {
    fn warnings(&self, _kind: WarningKind) -> String {
        self.text.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Chain view for a node that has only its genesis block
pub struct GenesisChain {
    genesis_hash: String,
    bits: u32,
}

impl GenesisChain {
    pub fn new(profile: &NetworkProfile) -> Self {
        Self {
            genesis_hash: profile.genesis.hash_hex(),
            bits: profile.genesis.bits,
        }
    }
}

impl ChainView for GenesisChain {
    fn block_count(&self) -> u64 {
        0
    }

    fn best_block_hash(&self) -> String {
        self.genesis_hash.clone()
    }

    fn difficulty(&self) -> f64 {
        difficulty_from_bits(self.bits)
    }

    fn connection_count(&self) -> usize {
        0
    }
}

/// Difficulty of a compact target relative to `0x1d00ffff`
pub fn difficulty_from_bits(bits: u32) -> f64 {
    let mantissa = bits & 0x00ff_ffff;
    if mantissa == 0 {
        return 0.0;
    }
    let mut shift = (bits >> 24) & 0xff;
    let mut diff = f64::from(0x0000_ffffu32) / f64::from(mantissa);
    while shift < 29 {
        diff *= 256.0;
        shift += 1;
    }
    while shift > 29 {
        diff /= 256.0;
        shift -= 1;
    }
    diff
}

struct WalletSlot {
    info: Arc<dyn WalletInfo>,
    lock: Mutex<()>,
}

/// Guard over the state a non thread-safe command may touch.
///
/// Field order matters: the wallet guard is released before the chain guard.
pub struct StateGuard<'a> {
    _wallet: Option<MutexGuard<'a, ()>>,
    _chain: MutexGuard<'a, ()>,
}

/// Process-scoped node state handed to RPC handlers
pub struct NodeContext {
    network: Arc<NetworkRegistry>,
    chain: Arc<dyn ChainView>,
    chain_lock: Mutex<()>,
    wallet: Option<WalletSlot>,
    warnings: Arc<dyn WarningSource>,
    disable_safe_mode: bool,
    shutdown: watch::Sender<bool>,
}

impl NodeContext {
    /// Context with a genesis-only chain, no wallet and no warnings
    pub fn new(network: Arc<NetworkRegistry>) -> Self {
        let chain = Arc::new(GenesisChain::new(network.active()));
        let (shutdown, _) = watch::channel(false);
        Self {
            network,
            chain,
            chain_lock: Mutex::new(()),
            wallet: None,
            warnings: Arc::new(WarningBoard::new()),
            disable_safe_mode: false,
            shutdown,
        }
    }

    pub fn with_chain(mut self, chain: Arc<dyn ChainView>) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletInfo>) -> Self {
        self.wallet = Some(WalletSlot {
            info: wallet,
            lock: Mutex::new(()),
        });
        self
    }

    pub fn with_warnings(mut self, warnings: Arc<dyn WarningSource>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_safe_mode_disabled(mut self, disabled: bool) -> Self {
        self.disable_safe_mode = disabled;
        self
    }

    pub fn network(&self) -> &NetworkRegistry {
        &self.network
    }

    pub fn network_registry(&self) -> Arc<NetworkRegistry> {
        Arc::clone(&self.network)
    }

    pub fn chain(&self) -> &dyn ChainView {
        self.chain.as_ref()
    }

    pub fn wallet(&self) -> Option<&dyn WalletInfo> {
        self.wallet.as_ref().map(|slot| slot.info.as_ref())
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn warnings(&self, kind: WarningKind) -> String {
        self.warnings.warnings(kind)
    }

    pub fn safe_mode_disabled(&self) -> bool {
        self.disable_safe_mode
    }

    /// Take the chain-state lock, then the wallet lock when a wallet is loaded.
    pub fn lock_state(&self) -> StateGuard<'_> {
        let chain = self.chain_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let wallet = self
            .wallet
            .as_ref()
            .map(|slot| slot.lock.lock().unwrap_or_else(PoisonError::into_inner));
        StateGuard {
            _wallet: wallet,
            _chain: chain,
        }
    }

    /// Ask the node to shut down. Safe to call more than once.
    pub fn request_shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}
