use crate::core_network::stream::BoxedStream;
use crate::core_tls::error::TlsError;
use crate::core_tls::tls_config::TlsConfig;
use async_trait::async_trait;
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::{rustls, TlsAcceptor};

/// Upgrades the control channel in place after `AUTH TLS`.
#[async_trait]
pub trait ControlTlsUpgrade: Send + Sync {
    async fn upgrade(&self, stream: BoxedStream) -> Result<BoxedStream, TlsError>;

    /// Sends close_notify and shuts the write side down.
    async fn disconnect(&self, stream: &mut BoxedStream) -> Result<(), TlsError>;
}

/// Server-side TLS built from a PEM certificate chain and key.
#[derive(Clone)]
pub struct TlsConnection {
    tls_acceptor: TlsAcceptor,
}

impl TlsConnection {
    pub fn new(cert_file: impl AsRef<Path>, key_file: impl AsRef<Path>) -> Result<Self, TlsError> {
        let cert_chain = load_certificates(cert_file.as_ref())?;
        let private_key = load_private_key(key_file.as_ref())?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?
            .with_no_client_auth()
            .with_single_cert(cert_chain, private_key)
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;

        info!("TLS certificate loaded from {:?}", cert_file.as_ref());
        Ok(Self {
            tls_acceptor: TlsAcceptor::from(Arc::new(config)),
        })
    }

    /// Returns `Ok(None)` when TLS is disabled in the configuration.
    pub fn from_config(config: &TlsConfig) -> Result<Option<Self>, TlsError> {
        if !config.enabled {
            return Ok(None);
        }
        config.validate()?;
        Self::new(&config.cert_file, &config.key_file).map(Some)
    }

    pub fn acceptor(&self) -> TlsAcceptor {
        self.tls_acceptor.clone()
    }

    pub async fn accept_tls(&self, stream: BoxedStream) -> Result<BoxedStream, TlsError> {
        let tls_stream = self
            .tls_acceptor
            .accept(stream)
            .await
            .map_err(|e| TlsError::TlsHandshakeError(e.to_string()))?;
        debug!("TLS handshake completed");
        Ok(Box::new(tls_stream))
    }
}

#[async_trait]
impl ControlTlsUpgrade for TlsConnection {
    async fn upgrade(&self, stream: BoxedStream) -> Result<BoxedStream, TlsError> {
        self.accept_tls(stream).await
    }

    async fn disconnect(&self, stream: &mut BoxedStream) -> Result<(), TlsError> {
        stream
            .shutdown()
            .await
            .map_err(|e| TlsError::TlsShutdownError(e.to_string()))
    }
}

fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path)
        .map_err(|e| TlsError::CertificateLoadError(format!("{:?}: {}", path, e)))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::CertificateLoadError(format!("{:?}: {}", path, e)))?;
    if certs.is_empty() {
        return Err(TlsError::CertificateLoadError(format!(
            "{:?}: no certificate found",
            path
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path)
        .map_err(|e| TlsError::PrivateKeyLoadError(format!("{:?}: {}", path, e)))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| TlsError::PrivateKeyLoadError(format!("{:?}: {}", path, e)))?
        .ok_or_else(|| TlsError::PrivateKeyLoadError(format!("{:?}: no private key found", path)))
}
