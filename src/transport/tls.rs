//! # TLS Transport Layer
//!
//! Server-side TLS for switch connections.
//!
//! Switches connect as TLS clients; the controller presents a certificate
//! loaded from PEM files. Whether TLS is used at all is decided by
//! [`crate::config::TlsSupport`]; this module only builds the acceptor.
//!
//! ## Responsibilities
//! - Load certificate chains and PKCS#8 keys from PEM files
//! - Build a `TlsAcceptor` with rustls safe defaults (TLS 1.2+)
//! - Generate self-signed material for development and tests

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::{Certificate, PrivateKey, ServerConfig};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, instrument};

use crate::config::TlsSettings;
use crate::error::{ProtocolError, Result};

/// TLS server configuration
#[derive(Debug, Clone)]
pub struct TlsServerConfig {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl TlsServerConfig {
    /// Create a new TLS server configuration
    pub fn new<P: AsRef<Path>>(cert_path: P, key_path: P) -> Self {
        Self {
            cert_path: cert_path.as_ref().to_path_buf(),
            key_path: key_path.as_ref().to_path_buf(),
        }
    }

    /// Take the PEM paths from TLS settings; both must be present.
    pub fn from_settings(settings: &TlsSettings) -> Result<Self> {
        match (&settings.cert_path, &settings.key_path) {
            (Some(cert), Some(key)) => Ok(Self::new(cert, key)),
            _ => Err(ProtocolError::TlsError(
                "TLS required but certificate or key path missing".into(),
            )),
        }
    }

    /// Generate a self-signed certificate for development/testing purposes
    pub fn generate_self_signed<P: AsRef<Path>>(cert_path: P, key_path: P) -> io::Result<Self> {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".into()])
            .map_err(|e| io::Error::other(format!("Certificate generation error: {e}")))?;

        let mut cert_file = File::create(&cert_path)?;
        cert_file.write_all(cert.cert.pem().as_bytes())?;

        let mut key_file = File::create(&key_path)?;
        key_file.write_all(cert.signing_key.serialize_pem().as_bytes())?;

        Ok(Self::new(cert_path, key_path))
    }

    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Load the TLS configuration from files
    pub fn load_server_config(&self) -> Result<ServerConfig> {
        let cert_file = File::open(&self.cert_path)
            .map_err(|e| ProtocolError::TlsError(format!("Failed to open cert file: {e}")))?;
        let mut cert_reader = BufReader::new(cert_file);
        let cert_chain: Vec<Certificate> = certs(&mut cert_reader)
            .map_err(|_| ProtocolError::TlsError("Failed to parse certificate".into()))?
            .into_iter()
            .map(Certificate)
            .collect();
        if cert_chain.is_empty() {
            return Err(ProtocolError::TlsError("No certificates found".into()));
        }

        let key_file = File::open(&self.key_path)
            .map_err(|e| ProtocolError::TlsError(format!("Failed to open key file: {e}")))?;
        let mut key_reader = BufReader::new(key_file);
        let private_key = pkcs8_private_keys(&mut key_reader)
            .map_err(|_| ProtocolError::TlsError("Failed to parse private key".into()))?
            .into_iter()
            .next()
            .map(PrivateKey)
            .ok_or_else(|| ProtocolError::TlsError("No private keys found".into()))?;

        // Safe defaults: TLS 1.2+ with modern cipher suites.
        ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .map_err(|e| ProtocolError::TlsError(format!("TLS error: {e}")))
    }

    /// Build the acceptor used for every accepted switch connection.
    #[instrument(skip(self), fields(cert = %self.cert_path.display()))]
    pub fn build_acceptor(&self) -> Result<TlsAcceptor> {
        let config = self.load_server_config()?;
        debug!("TLS acceptor ready");
        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}
