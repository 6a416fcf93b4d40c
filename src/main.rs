//! clamd: CLAM node JSON-RPC server
//!
//! Usage:
//!   clamd [--config clam.toml | --conf clam.conf] [--testnet | --regtest] [--rpcallowip 10.0.0.*]

use anyhow::{Context, Result};
use clam_node::chainparams::NetworkRegistry;
use clam_node::config::{ConfigOverrides, NodeConfig};
use clam_node::node::NodeContext;
use clam_node::rpc::auth::{RpcAllowList, RpcCredentials};
use clam_node::rpc::tls::{load_tls, TlsMode};
use clam_node::rpc::{default_command_table, RequestDispatcher, RpcServer, ServerSettings};
use clam_node::utils::{init_logging_from_config, wait_for_shutdown};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "clamd", version, about = "CLAM node JSON-RPC server")]
struct Args {
    /// TOML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// clam.conf style configuration file (default: <datadir>/clam.conf)
    #[arg(long)]
    conf: Option<PathBuf>,

    #[arg(long)]
    datadir: Option<PathBuf>,

    #[arg(long)]
    testnet: bool,

    #[arg(long)]
    regtest: bool,

    #[arg(long)]
    rpcuser: Option<String>,

    #[arg(long)]
    rpcpassword: Option<String>,

    #[arg(long)]
    rpcport: Option<u16>,

    /// Allow JSON-RPC connections from matching addresses (repeatable)
    #[arg(long)]
    rpcallowip: Vec<String>,

    #[arg(long)]
    rpcthreads: Option<usize>,

    /// Use TLS for JSON-RPC connections
    #[arg(long)]
    rpcssl: bool,

    /// Serve every command even while a warning is active
    #[arg(long)]
    disablesafemode: bool,

    #[arg(long = "log-filter")]
    log_filter: Option<String>,

    #[arg(long = "log-json")]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            data_dir: self.datadir.clone(),
            testnet: self.testnet,
            regtest: self.regtest,
            rpc_user: self.rpcuser.clone(),
            rpc_password: self.rpcpassword.clone(),
            rpc_port: self.rpcport,
            rpc_allow_ips: self.rpcallowip.clone(),
            rpc_threads: self.rpcthreads,
            rpc_ssl: self.rpcssl,
            disable_safe_mode: self.disablesafemode,
            log_filter: self.log_filter.clone(),
            log_json: self.log_json,
        }
    }

    /// Returns the config plus the path shown in credential errors
    fn load_config(&self) -> Result<(NodeConfig, PathBuf)> {
        if let Some(path) = &self.config {
            let config = NodeConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            return Ok((config, path.clone()));
        }
        // clam.conf syntax whatever the extension
        if let Some(path) = &self.conf {
            let config = NodeConfig::from_clam_conf(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            return Ok((config, path.clone()));
        }

        let data_dir = self
            .datadir
            .clone()
            .unwrap_or_else(|| NodeConfig::default().data_dir);
        let default_conf = data_dir.join("clam.conf");
        if default_conf.exists() {
            let config = NodeConfig::from_clam_conf(&default_conf)
                .with_context(|| format!("failed to load {}", default_conf.display()))?;
            Ok((config, default_conf))
        } else {
            Ok((NodeConfig::default(), default_conf))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_path) = args.load_config()?;
    config.apply_overrides(&args.overrides());
    init_logging_from_config(&config.logging)?;

    let registry = Arc::new(NetworkRegistry::new());
    let kind = config
        .network
        .select(&registry)
        .context("invalid network selection")?;
    let profile = registry.active();
    info!("Using network profile {}", kind);

    config.rpc.validate()?;
    config
        .rpc
        .validate_credentials(profile.require_rpc_password, &config_path)?;

    let network_dir = profile.data_dir_in(&config.data_dir);
    let tls = if config.rpc.ssl {
        let (cert, key) = config.rpc.tls_paths(&network_dir);
        load_tls(&cert, &key, &config.rpc.ssl_ciphers)
    } else {
        TlsMode::Disabled
    };

    let credentials = RpcCredentials::new(&config.rpc.user, &config.rpc.password);
    if credentials.is_weak() {
        warn!("RPC password is short; failed logins will be delayed");
    }

    let node = Arc::new(
        NodeContext::new(Arc::clone(&registry))
            .with_safe_mode_disabled(config.rpc.disable_safe_mode),
    );
    let table = default_command_table().context("failed to build RPC command table")?;
    let dispatcher = RequestDispatcher::new(Arc::new(table), Arc::clone(&node));

    let settings = ServerSettings {
        port: config.rpc.port_for(profile),
        threads: config.rpc.threads,
        allow_list: RpcAllowList::new(config.rpc.allow_ips.clone()),
        credentials,
        tls,
        max_body_bytes: config.rpc.max_body_bytes,
    };
    let mut server = RpcServer::start(settings, dispatcher).context("failed to start RPC server")?;

    let waiter = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;
    waiter.block_on(wait_for_shutdown(node.shutdown_receiver()));

    server.stop();
    info!("clamd stopped");
    Ok(())
}
