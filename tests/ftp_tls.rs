mod common;

use common::{builder, parse_pasv_reply, start, Client};
use ferrftpd::core_network::port_allocator::PassivePortAllocator;
use ferrftpd::core_network::LocalDataConnectionFactory;
use ferrftpd::core_tls::TlsConnection;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{
    ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;

/// Trusts whatever certificate the test server presents.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn connector() -> TlsConnector {
    let provider = Arc::new(ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .unwrap()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

fn server_tls(dir: &TempDir) -> TlsConnection {
    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");
    std::fs::write(&cert_path, generated.cert.pem()).unwrap();
    std::fs::write(&key_path, generated.key_pair.serialize_pem()).unwrap();
    TlsConnection::new(&cert_path, &key_path).unwrap()
}

fn server_name() -> ServerName<'static> {
    ServerName::try_from("localhost").unwrap()
}

#[tokio::test]
async fn test_auth_tls_and_protected_listing() {
    let root = TempDir::new().unwrap();
    let certs = TempDir::new().unwrap();
    std::fs::write(root.path().join("secret.txt"), b"top").unwrap();

    let tls = server_tls(&certs);
    let data_factory = LocalDataConnectionFactory::new(Arc::new(PassivePortAllocator::default()))
        .with_tls(tls.acceptor());
    let server = start(
        builder(root.path())
            .control_tls(Arc::new(tls))
            .data_connection_factory(Arc::new(data_factory)),
    )
    .await;

    let mut client = Client::connect(server.addr).await;
    client.send("FEAT").await;
    let features = client.read_multiline("211").await;
    assert!(features.contains(&" AUTH TLS\r\n".to_string()));
    assert!(features.contains(&" PROT\r\n".to_string()));

    assert_eq!(client.command("AUTH TLS").await, "234 Authenticating\r\n");
    let tcp = client.into_inner();
    let secured = connector().connect(server_name(), tcp).await.unwrap();
    let mut client = Client::new(secured);

    client.login().await;
    assert_eq!(client.command("PBSZ 0").await, "200 PBSZ=0\r\n");
    assert_eq!(client.command("PROT P").await, "200 Secure level set\r\n");

    let reply = client.command("PASV").await;
    assert!(reply.starts_with("227 "));
    let data = TcpStream::connect(parse_pasv_reply(&reply)).await.unwrap();
    client.send("NLST").await;
    assert!(client.read_reply().await.starts_with("150 "));

    let mut data = connector().connect(server_name(), data).await.unwrap();
    let mut body = String::new();
    data.read_to_string(&mut body).await.unwrap();
    assert_eq!(body, "secret.txt\r\n");
    assert_eq!(client.read_reply().await, "226 Listing has been sent\r\n");

    assert_eq!(client.command("QUIT").await, "221 Goodbye\r\n");
}

#[tokio::test]
async fn test_failed_handshake_ends_session() {
    let root = TempDir::new().unwrap();
    let certs = TempDir::new().unwrap();
    let server = start(builder(root.path()).control_tls(Arc::new(server_tls(&certs)))).await;

    let mut client = Client::connect(server.addr).await;
    assert_eq!(client.command("AUTH SSL").await, "234 Authenticating\r\n");
    // Plain text instead of a ClientHello.
    client.send("NOOP").await;
    let mut rest = Vec::new();
    let _ = client.stream.read_to_end(&mut rest).await;
    assert!(!String::from_utf8_lossy(&rest).contains("200 OK"));
}
