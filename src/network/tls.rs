//! TLS acceptor construction from PEM material.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tracing::info;

/// Load the certificate chain and PKCS#8 private key and build the
/// acceptor for the secure listener.
pub fn build_acceptor(cert_path: &str, key_path: &str) -> anyhow::Result<TlsAcceptor> {
    let cert_data = std::fs::read(cert_path)?;
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut Cursor::new(&cert_data))
        .filter_map(|r| r.ok())
        .collect();
    if cert_chain.is_empty() {
        bail!("no certificates found in {cert_path}");
    }

    let key_data = std::fs::read(key_path)?;
    let key: PrivateKeyDer<'static> = pkcs8_private_keys(&mut Cursor::new(&key_data))
        .filter_map(|r| r.ok())
        .map(PrivateKeyDer::Pkcs8)
        .next()
        .ok_or_else(|| anyhow!("no private key found in {key_path}"))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;

    info!(cert = %cert_path, "TLS acceptor ready");
    Ok(TlsAcceptor::from(Arc::new(config)))
}
