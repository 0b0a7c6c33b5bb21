//! Daemon transport resolution.
//!
//! Turns a [`DaemonConfig`] into a base URL and a configured
//! `reqwest::Client`. No network I/O happens here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use exapp_common::DaemonConfig;
use reqwest::{Certificate, Client, ClientBuilder, Identity};

use crate::domain::daemon::{DaemonProtocol, UNIX_SOCKET_BASE_URL, tcp_base_url};
use crate::domain::error::TransportConfigError;

/// Settings that come from the orchestrator rather than the daemon record.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Trust only the bundled CA set. Used before first-time setup, when the
    /// system trust store may not be provisioned yet.
    pub bundled_roots: bool,
    /// Extra PEM bundle added to the trust store.
    pub ca_bundle: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            bundled_roots: false,
            ca_bundle: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// A daemon ready to be called.
#[derive(Debug, Clone)]
pub struct ResolvedTransport {
    /// Origin requests are built against. For Unix sockets this is only a
    /// placeholder; the socket path decides where the connection goes.
    pub base_url: String,
    pub client: Client,
}

/// Resolve `daemon` into a transport.
///
/// # Errors
///
/// Returns an error for an unknown protocol, unreadable or encrypted TLS
/// material, a client certificate without a key (or the reverse), or a
/// client that cannot be built.
pub fn resolve(
    daemon: &DaemonConfig,
    opts: &TransportOptions,
) -> Result<ResolvedTransport, TransportConfigError> {
    let protocol: DaemonProtocol = daemon.protocol.parse()?;
    let builder = Client::builder().use_rustls_tls().timeout(opts.timeout);

    let (base_url, builder) = match protocol {
        DaemonProtocol::UnixSocket => (UNIX_SOCKET_BASE_URL.to_string(), unix_socket(builder, &daemon.host)?),
        DaemonProtocol::Http => (tcp_base_url(protocol, &daemon.host, daemon.port), builder),
        DaemonProtocol::Https => (
            tcp_base_url(protocol, &daemon.host, daemon.port),
            configure_tls(builder, daemon, opts)?,
        ),
    };
    let client = builder
        .build()
        .map_err(|e| TransportConfigError::Client(e.to_string()))?;
    tracing::debug!(daemon = %daemon.name, %base_url, ?protocol, "resolved daemon transport");
    Ok(ResolvedTransport { base_url, client })
}

#[cfg(unix)]
#[allow(clippy::unnecessary_wraps)]
fn unix_socket(builder: ClientBuilder, path: &str) -> Result<ClientBuilder, TransportConfigError> {
    Ok(builder.unix_socket(PathBuf::from(path)))
}

#[cfg(not(unix))]
fn unix_socket(_builder: ClientBuilder, _path: &str) -> Result<ClientBuilder, TransportConfigError> {
    Err(TransportConfigError::UnixSocketUnsupported)
}

fn configure_tls(
    builder: ClientBuilder,
    daemon: &DaemonConfig,
    opts: &TransportOptions,
) -> Result<ClientBuilder, TransportConfigError> {
    let mut builder = builder
        .tls_built_in_webpki_certs(opts.bundled_roots)
        .tls_built_in_native_certs(!opts.bundled_roots);

    if let Some(bundle) = &opts.ca_bundle {
        let pem = read_pem(bundle)?;
        let certs = Certificate::from_pem_bundle(&pem).map_err(|e| invalid(bundle, &e))?;
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    let cfg = &daemon.deploy_config;
    if cfg.ssl_key_password.is_some() || cfg.ssl_cert_password.is_some() {
        return Err(TransportConfigError::EncryptedKeyUnsupported);
    }
    match (&cfg.ssl_cert, &cfg.ssl_key) {
        (None, None) => Ok(builder),
        (Some(cert_path), Some(key_path)) => {
            let cert_path = Path::new(cert_path);
            let key_path = Path::new(key_path);
            let mut pem = read_pem(cert_path)?;
            let key = read_pem(key_path)?;
            if is_encrypted_pem(&key) || is_encrypted_pem(&pem) {
                return Err(TransportConfigError::EncryptedKeyUnsupported);
            }
            pem.push(b'\n');
            pem.extend_from_slice(&key);
            let identity = Identity::from_pem(&pem).map_err(|e| invalid(key_path, &e))?;
            Ok(builder.identity(identity))
        }
        _ => Err(TransportConfigError::IncompleteClientIdentity),
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TransportConfigError> {
    std::fs::read(path).map_err(|e| TransportConfigError::UnreadableTlsMaterial {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn invalid(path: &Path, err: &reqwest::Error) -> TransportConfigError {
    TransportConfigError::InvalidTlsMaterial {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// `true` for PKCS#8 encrypted keys and legacy `Proc-Type: 4,ENCRYPTED` PEM.
fn is_encrypted_pem(pem: &[u8]) -> bool {
    let text = String::from_utf8_lossy(pem);
    text.contains("BEGIN ENCRYPTED PRIVATE KEY") || text.contains("Proc-Type: 4,ENCRYPTED")
}
