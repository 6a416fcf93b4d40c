//! TLS for the RPC listener (`rpcssl`)
//!
//! A missing or unreadable certificate or key is not fatal: the listener
//! still starts, but every TLS connection is dropped before the handshake.

use rustls::{Certificate, PrivateKey, ServerConfig, SupportedCipherSuite, ALL_CIPHER_SUITES};
use rustls_pemfile::Item;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info};

/// Default `rpcsslciphers`: TLS 1.3 suites, then ECDHE AEAD suites for TLS 1.2
pub const DEFAULT_CIPHERS: &str = "TLS13_AES_256_GCM_SHA384:TLS13_AES_128_GCM_SHA256:\
TLS13_CHACHA20_POLY1305_SHA256:TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384:\
TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256:TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256:\
TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384:TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256:\
TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256";

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("missing server certificate file {0}")]
    MissingCertificate(PathBuf),
    #[error("missing server private key file {0}")]
    MissingPrivateKey(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no certificates found in {0}")]
    NoCertificates(PathBuf),
    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),
    #[error("no usable cipher suites in '{0}'")]
    NoCipherSuites(String),
    #[error("TLS configuration rejected: {0}")]
    Config(#[from] rustls::Error),
}

/// How the listener treats TLS
#[derive(Clone)]
pub enum TlsMode {
    /// Plain HTTP
    Disabled,
    Enabled(TlsAcceptor),
    /// TLS requested but not configurable; connections are dropped
    Unavailable,
}

impl TlsMode {
    pub fn is_tls(&self) -> bool {
        !matches!(self, TlsMode::Disabled)
    }
}

impl std::fmt::Debug for TlsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsMode::Disabled => f.write_str("Disabled"),
            TlsMode::Enabled(_) => f.write_str("Enabled"),
            TlsMode::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Resolve the suites named in a colon-separated list.
///
/// Names are rustls suite names, matched case-insensitively. Unknown names
/// are skipped.
pub fn parse_cipher_list(list: &str) -> Vec<SupportedCipherSuite> {
    let mut suites = Vec::new();
    for name in list.split(':').map(str::trim).filter(|n| !n.is_empty()) {
        let found = ALL_CIPHER_SUITES
            .iter()
            .find(|suite| format!("{:?}", suite.suite()).eq_ignore_ascii_case(name));
        match found {
            Some(suite) if !suites.contains(suite) => suites.push(*suite),
            Some(_) => {}
            None => debug!("Ignoring unknown TLS cipher suite {}", name),
        }
    }
    suites
}

fn read_pem(path: &Path) -> Result<Vec<Item>, TlsError> {
    let file = File::open(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    rustls_pemfile::read_all(&mut BufReader::new(file)).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn load_certificates(path: &Path) -> Result<Vec<Certificate>, TlsError> {
    if !path.exists() {
        return Err(TlsError::MissingCertificate(path.to_path_buf()));
    }
    let certs: Vec<Certificate> = read_pem(path)?
        .into_iter()
        .filter_map(|item| match item {
            Item::X509Certificate(der) => Some(Certificate(der)),
            _ => None,
        })
        .collect();
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKey, TlsError> {
    if !path.exists() {
        return Err(TlsError::MissingPrivateKey(path.to_path_buf()));
    }
    read_pem(path)?
        .into_iter()
        .find_map(|item| match item {
            Item::PKCS8Key(der) | Item::RSAKey(der) | Item::ECKey(der) => Some(PrivateKey(der)),
            _ => None,
        })
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

/// Build an acceptor from PEM files and a cipher list.
pub fn build_acceptor(cert: &Path, key: &Path, ciphers: &str) -> Result<TlsAcceptor, TlsError> {
    let suites = parse_cipher_list(ciphers);
    if suites.is_empty() {
        return Err(TlsError::NoCipherSuites(ciphers.to_string()));
    }

    let certs = load_certificates(cert)?;
    let key = load_private_key(key)?;

    let config = ServerConfig::builder()
        .with_cipher_suites(&suites)
        .with_safe_default_kx_groups()
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Set up TLS for the listener, logging instead of failing.
pub fn load_tls(cert: &Path, key: &Path, ciphers: &str) -> TlsMode {
    match build_acceptor(cert, key, ciphers) {
        Ok(acceptor) => {
            info!("RPC TLS enabled with certificate {}", cert.display());
            TlsMode::Enabled(acceptor)
        }
        Err(e) => {
            error!("ThreadRPCServer ERROR: {}", e);
            TlsMode::Unavailable
        }
    }
}

/// Self-signed P-256 certificate for `localhost` and `127.0.0.1`, with its key
#[cfg(test)]
pub(crate) fn fixture_paths() -> (PathBuf, PathBuf) {
    let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data");
    (data.join("server.cert"), data.join("server.pem"))
}
