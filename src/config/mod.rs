//! Configuration management for the CLAM node
//!
//! `NodeConfig` loads from TOML or JSON by file extension, or from a
//! Bitcoin-style `clam.conf`. Command-line overrides are applied on top with
//! `NodeConfig::apply_overrides`.

use crate::chainparams::{NetworkKind, NetworkProfile, NetworkRegistry, ProfileError};
use crate::rpc::http::MAX_BODY_BYTES;
use crate::rpc::server::DEFAULT_RPC_THREADS;
use crate::rpc::tls::DEFAULT_CIPHERS;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
    #[error("{0}")]
    Credentials(String),
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Network selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub testnet: bool,

    #[serde(default)]
    pub regtest: bool,

    /// Explicit network name (`main`, `test`, `regtest`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl NetworkConfig {
    /// Select the configured profile on `registry`.
    ///
    /// An explicit name must agree with the boolean flags when those are set.
    pub fn select(&self, registry: &NetworkRegistry) -> Result<NetworkKind, ConfigError> {
        let Some(name) = self.network.as_deref() else {
            return Ok(registry.select_from_startup_flags(self.regtest, self.testnet)?);
        };

        let kind: NetworkKind = name.parse()?;
        let flagged = match (self.regtest, self.testnet) {
            (true, true) => return Err(ProfileError::ConflictingNetworkFlags.into()),
            (true, false) => Some(NetworkKind::Regression),
            (false, true) => Some(NetworkKind::Test),
            (false, false) => None,
        };
        if flagged.is_some_and(|flagged| flagged != kind) {
            return Err(ProfileError::ConflictingNetworkFlags.into());
        }
        registry.select(kind)?;
        Ok(kind)
    }
}

/// RPC server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// `rpcallowip` patterns; empty means loopback only
    #[serde(default)]
    pub allow_ips: Vec<String>,

    /// Defaults to the active profile's RPC port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default = "default_threads")]
    pub threads: usize,

    #[serde(default)]
    pub ssl: bool,

    /// Relative to the network data directory unless absolute
    #[serde(default = "default_ssl_cert")]
    pub ssl_cert: PathBuf,

    #[serde(default = "default_ssl_key")]
    pub ssl_key: PathBuf,

    #[serde(default = "default_ssl_ciphers")]
    pub ssl_ciphers: String,

    #[serde(default)]
    pub disable_safe_mode: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_threads() -> usize {
    DEFAULT_RPC_THREADS
}

fn default_ssl_cert() -> PathBuf {
    PathBuf::from("server.cert")
}

fn default_ssl_key() -> PathBuf {
    PathBuf::from("server.pem")
}

fn default_ssl_ciphers() -> String {
    DEFAULT_CIPHERS.to_string()
}

fn default_max_body_bytes() -> usize {
    MAX_BODY_BYTES
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            allow_ips: Vec::new(),
            port: None,
            threads: default_threads(),
            ssl: false,
            ssl_cert: default_ssl_cert(),
            ssl_key: default_ssl_key(),
            ssl_ciphers: default_ssl_ciphers(),
            disable_safe_mode: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl RpcConfig {
    /// Refuse to start without a usable password.
    ///
    /// Only enforced when the profile requires one. The error carries a
    /// freshly generated password suggestion.
    pub fn validate_credentials(
        &self,
        require_password: bool,
        config_path: &Path,
    ) -> Result<(), ConfigError> {
        if !require_password {
            return Ok(());
        }
        if !self.password.is_empty() && self.password != self.user {
            return Ok(());
        }

        Err(ConfigError::Credentials(format!(
            "To use clamd, you must set a rpcpassword in the configuration file:\n\
             {}\n\
             It is recommended you use the following random password:\n\
             rpcuser=clamrpc\n\
             rpcpassword={}\n\
             (you do not need to remember this password)\n\
             The username and password MUST NOT be the same.\n\
             If the file does not exist, create it with owner-readable-only file permissions.",
            config_path.display(),
            random_password()
        )))
    }

    /// Range checks that do not depend on the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "rpcthreads".to_string(),
                value: self.threads.to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_body_bytes".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn port_for(&self, profile: &NetworkProfile) -> u16 {
        self.port.unwrap_or(profile.rpc_port)
    }

    /// Certificate and key paths resolved against `network_dir`
    pub fn tls_paths(&self, network_dir: &Path) -> (PathBuf, PathBuf) {
        (
            resolve(network_dir, &self.ssl_cert),
            resolve(network_dir, &self.ssl_key),
        )
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// 44 alphanumerics, about 256 bits
pub fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(44)
        .map(char::from)
        .collect()
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info", "clam_node::rpc=debug"); `RUST_LOG` wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default)]
    pub json_format: bool,
}

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".clam")
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            network: NetworkConfig::default(),
            rpc: RpcConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Values given on the command line; `None`/`false` leaves the file value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub testnet: bool,
    pub regtest: bool,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    pub rpc_port: Option<u16>,
    pub rpc_allow_ips: Vec<String>,
    pub rpc_threads: Option<usize>,
    pub rpc_ssl: bool,
    pub disable_safe_mode: bool,
    pub log_filter: Option<String>,
    pub log_json: bool,
}

/// Result of reading a `clam.conf`
#[derive(Debug, Clone, Default)]
pub struct ClamConfImport {
    pub config: NodeConfig,
    /// Keys that have no counterpart here
    pub ignored: Vec<String>,
}

impl NodeConfig {
    /// Load by extension: `.toml`, `.json` or `.conf`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "conf" => return Self::from_clam_conf(path),
            "toml" | "json" => {}
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }

        let content = read(path)?;
        let parsed = if extension == "toml" {
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_clam_conf(path: &Path) -> Result<Self, ConfigError> {
        let import = parse_clam_conf(&read(path)?)?;
        for key in &import.ignored {
            debug!("Ignoring unsupported clam.conf key {}", key);
        }
        Ok(import.config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(dir) = &overrides.data_dir {
            self.data_dir = dir.clone();
        }
        self.network.testnet |= overrides.testnet;
        self.network.regtest |= overrides.regtest;
        if let Some(user) = &overrides.rpc_user {
            self.rpc.user = user.clone();
        }
        if let Some(password) = &overrides.rpc_password {
            self.rpc.password = password.clone();
        }
        if overrides.rpc_port.is_some() {
            self.rpc.port = overrides.rpc_port;
        }
        for pattern in &overrides.rpc_allow_ips {
            if !self.rpc.allow_ips.contains(pattern) {
                self.rpc.allow_ips.push(pattern.clone());
            }
        }
        if let Some(threads) = overrides.rpc_threads {
            self.rpc.threads = threads;
        }
        self.rpc.ssl |= overrides.rpc_ssl;
        self.rpc.disable_safe_mode |= overrides.disable_safe_mode;
        if overrides.log_filter.is_some() {
            self.logging.filter = overrides.log_filter.clone();
        }
        self.logging.json_format |= overrides.log_json;
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// `-flag`, `flag=1`, `flag=true` are set; `flag=0`, `flag=false` are not
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "" | "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        other => other.parse::<i64>().map(|n| n != 0).map_err(|_| invalid(key, value)),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Parse `clam.conf` text: `key=value` lines, `#` comments, repeatable
/// `rpcallowip`. Later values of single-valued keys win.
pub fn parse_clam_conf(content: &str) -> Result<ClamConfImport, ConfigError> {
    let mut import = ClamConfImport::default();
    let config = &mut import.config;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, ""),
        };
        let key = key.trim_start_matches('-');

        match key {
            "rpcuser" => config.rpc.user = value.to_string(),
            "rpcpassword" => config.rpc.password = value.to_string(),
            "rpcport" => config.rpc.port = Some(parse_number(key, value)?),
            "rpcallowip" => config.rpc.allow_ips.push(value.to_string()),
            "rpcthreads" => config.rpc.threads = parse_number(key, value)?,
            "rpcssl" => config.rpc.ssl = parse_bool(key, value)?,
            "rpcsslcertificatechainfile" => config.rpc.ssl_cert = PathBuf::from(value),
            "rpcsslprivatekeyfile" => config.rpc.ssl_key = PathBuf::from(value),
            "rpcsslciphers" => config.rpc.ssl_ciphers = value.to_string(),
            "testnet" => config.network.testnet = parse_bool(key, value)?,
            "regtest" => config.network.regtest = parse_bool(key, value)?,
            "disablesafemode" => config.rpc.disable_safe_mode = parse_bool(key, value)?,
            "datadir" => config.data_dir = PathBuf::from(value),
            "debug" => config.logging.filter = debug_filter(value),
            _ => import.ignored.push(key.to_string()),
        }
    }
    Ok(import)
}

/// `debug=1` turns on everything; `debug=<category>` one module.
fn debug_filter(value: &str) -> Option<String> {
    match value {
        "" | "1" | "all" => Some("debug".to_string()),
        "0" => None,
        category => Some(format!("info,clam_node::{}=debug", category)),
    }
}
