//! The second TCP channel of an FTP session.
//!
//! A data connection is closed, listening (after PASV/EPSV) or open (after the
//! client connected, or after an active connect for PORT/EPRT). One instance
//! lives for the whole session and carries one transfer at a time.

use crate::core_network::error::DataConnectionError;
use crate::core_network::port_allocator::PassivePortAllocator;
use crate::core_network::stream::{AsyncStream, BoxedStream};
use crate::core_tls::TlsError;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;

/// RFC 2428 network protocol ids.
pub const PROTOCOL_IPV4: u8 = 1;
pub const PROTOCOL_IPV6: u8 = 2;

/// Upper bound for a client to show up on a passive port, or for an active connect.
pub const DATA_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait DataConnection: Send {
    /// Whether a channel exists and its peer is still connected. A channel the
    /// peer already closed is dropped and reported as not open.
    async fn is_open(&mut self) -> bool;

    /// Protocol ids accepted by `connect_active`.
    fn supported_active_protocols(&self) -> Vec<u8>;

    /// Protocol ids accepted by `extended_listen`, derived from the local address family.
    fn supported_passive_protocols(&self) -> Vec<u8>;

    async fn connect_active(
        &mut self,
        ip: IpAddr,
        port: u16,
        protocol: u8,
    ) -> Result<(), DataConnectionError>;

    /// Starts listening on the local address, reusing a pending listener if any.
    /// Any open channel is dropped: the next transfer goes through the listener.
    fn listen(&mut self) -> Result<SocketAddr, DataConnectionError>;

    fn extended_listen(&mut self, protocol: u8) -> Result<u16, DataConnectionError>;

    /// Waits for the client on the pending listener, then stops listening.
    async fn accept(&mut self) -> Result<(), DataConnectionError>;

    /// Shuts the open channel down gracefully, then drops the socket.
    async fn disconnect(&mut self) -> Result<(), DataConnectionError>;

    /// Copies `source` to the channel until EOF and flushes.
    async fn send(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64, DataConnectionError>;

    /// Copies the channel into `destination` until the client closes it.
    async fn receive(
        &mut self,
        destination: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, DataConnectionError>;

    /// Drops the open socket and any pending listener. Safe to call repeatedly.
    fn close(&mut self);

    fn supports_tls(&self) -> bool {
        false
    }

    async fn upgrade_to_tls(&mut self) -> Result<(), DataConnectionError> {
        Err(DataConnectionError::TlsUnavailable)
    }
}

/// Builds one data connection per control connection.
pub trait DataConnectionFactory: Send + Sync {
    fn create(&self, local_ip: IpAddr) -> Box<dyn DataConnection>;

    fn supports_tls(&self) -> bool {
        false
    }
}

/// An open data channel. Plain sockets stay unboxed so their peer can be checked.
enum DataStream {
    Plain(TcpStream),
    Secure(BoxedStream),
}

impl DataStream {
    fn io(&mut self) -> &mut (dyn AsyncStream + 'static) {
        match self {
            DataStream::Plain(stream) => stream,
            DataStream::Secure(stream) => &mut **stream,
        }
    }
}

/// Peeks without waiting: a peer that closed or reset the socket reads as EOF or fails.
async fn peer_connected(stream: &TcpStream) -> bool {
    let mut byte = [0u8; 1];
    match timeout(Duration::ZERO, stream.peek(&mut byte)).await {
        Err(_) => true,
        Ok(Ok(read)) => read > 0,
        Ok(Err(_)) => false,
    }
}

pub struct LocalDataConnection {
    listening_ip: IpAddr,
    allocator: Arc<PassivePortAllocator>,
    tls: Option<TlsAcceptor>,
    listener: Option<TcpListener>,
    stream: Option<DataStream>,
}

impl LocalDataConnection {
    pub fn new(
        listening_ip: IpAddr,
        allocator: Arc<PassivePortAllocator>,
        tls: Option<TlsAcceptor>,
    ) -> Self {
        Self {
            listening_ip,
            allocator,
            tls,
            listener: None,
            stream: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    fn open_stream(&mut self) -> Result<&mut (dyn AsyncStream + 'static), DataConnectionError> {
        self.stream
            .as_mut()
            .map(DataStream::io)
            .ok_or(DataConnectionError::NotConnected)
    }
}

#[async_trait]
impl DataConnection for LocalDataConnection {
    async fn is_open(&mut self) -> bool {
        let connected = match self.stream.as_mut() {
            None => return false,
            Some(DataStream::Secure(_)) => true,
            Some(DataStream::Plain(stream)) => peer_connected(stream).await,
        };
        if !connected {
            debug!("Dropping data connection closed by the peer");
            self.stream = None;
        }
        connected
    }

    fn supported_active_protocols(&self) -> Vec<u8> {
        vec![PROTOCOL_IPV4, PROTOCOL_IPV6]
    }

    fn supported_passive_protocols(&self) -> Vec<u8> {
        match self.listening_ip {
            IpAddr::V4(_) => vec![PROTOCOL_IPV4],
            IpAddr::V6(_) => vec![PROTOCOL_IPV6],
        }
    }

    async fn connect_active(
        &mut self,
        ip: IpAddr,
        port: u16,
        protocol: u8,
    ) -> Result<(), DataConnectionError> {
        let socket = match protocol {
            PROTOCOL_IPV4 => TcpSocket::new_v4().map_err(DataConnectionError::Connect)?,
            PROTOCOL_IPV6 => TcpSocket::new_v6().map_err(DataConnectionError::Connect)?,
            requested => {
                return Err(DataConnectionError::ProtocolNotSupported {
                    requested,
                    supported: self.supported_active_protocols(),
                })
            }
        };

        let target = SocketAddr::new(ip, port);
        let stream = timeout(DATA_CONNECTION_TIMEOUT, socket.connect(target))
            .await
            .unwrap_or_else(|_| Err(io::Error::from(io::ErrorKind::TimedOut)))
            .map_err(DataConnectionError::Connect)?;
        debug!("Active data connection established to {}", target);
        // A failed connect leaves a pending listener in place.
        self.close();
        self.stream = Some(DataStream::Plain(stream));
        Ok(())
    }

    fn listen(&mut self) -> Result<SocketAddr, DataConnectionError> {
        if self.stream.take().is_some() {
            debug!("Dropping open data connection for a passive listener");
        }
        if let Some(listener) = &self.listener {
            if let Ok(addr) = listener.local_addr() {
                return Ok(addr);
            }
        }
        let listener = self.allocator.bind(self.listening_ip)?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    fn extended_listen(&mut self, protocol: u8) -> Result<u16, DataConnectionError> {
        let supported = self.supported_passive_protocols();
        if !supported.contains(&protocol) {
            return Err(DataConnectionError::ProtocolNotSupported {
                requested: protocol,
                supported,
            });
        }
        Ok(self.listen()?.port())
    }

    async fn accept(&mut self) -> Result<(), DataConnectionError> {
        let listener = self
            .listener
            .take()
            .ok_or(DataConnectionError::NotListening)?;
        let (stream, peer) = timeout(DATA_CONNECTION_TIMEOUT, listener.accept())
            .await
            .unwrap_or_else(|_| Err(io::Error::from(io::ErrorKind::TimedOut)))
            .map_err(DataConnectionError::Connect)?;
        debug!("Passive data connection accepted from {}", peer);
        self.stream = Some(DataStream::Plain(stream));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), DataConnectionError> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.io().shutdown().await {
                debug!("Data channel shutdown failed: {}", e);
            }
        }
        Ok(())
    }

    async fn send(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64, DataConnectionError> {
        let stream = self.open_stream()?;
        let copied = tokio::io::copy(source, stream).await?;
        stream.flush().await?;
        Ok(copied)
    }

    async fn receive(
        &mut self,
        destination: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, DataConnectionError> {
        let stream = self.open_stream()?;
        let copied = tokio::io::copy(stream, destination).await?;
        Ok(copied)
    }

    fn close(&mut self) {
        let had_stream = self.stream.take().is_some();
        let had_listener = self.listener.take().is_some();
        if had_stream || had_listener {
            debug!("Data connection closed");
        }
    }

    fn supports_tls(&self) -> bool {
        self.tls.is_some()
    }

    async fn upgrade_to_tls(&mut self) -> Result<(), DataConnectionError> {
        let acceptor = self
            .tls
            .clone()
            .ok_or(DataConnectionError::TlsUnavailable)?;
        let stream = match self.stream.take() {
            Some(DataStream::Plain(stream)) => stream,
            Some(secure) => {
                self.stream = Some(secure);
                return Ok(());
            }
            None => return Err(DataConnectionError::NotConnected),
        };
        match acceptor.accept(stream).await {
            Ok(tls_stream) => {
                self.stream = Some(DataStream::Secure(Box::new(tls_stream)));
                info!("Data connection upgraded to TLS");
                Ok(())
            }
            Err(e) => {
                warn!("Data connection TLS handshake failed: {}", e);
                Err(TlsError::TlsHandshakeError(e.to_string()).into())
            }
        }
    }
}

pub struct LocalDataConnectionFactory {
    allocator: Arc<PassivePortAllocator>,
    tls: Option<TlsAcceptor>,
}

impl LocalDataConnectionFactory {
    pub fn new(allocator: Arc<PassivePortAllocator>) -> Self {
        Self {
            allocator,
            tls: None,
        }
    }

    /// Data connections created by this factory can be upgraded with `PROT P`.
    pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls = Some(acceptor);
        self
    }
}

impl Default for LocalDataConnectionFactory {
    fn default() -> Self {
        Self::new(Arc::new(PassivePortAllocator::default()))
    }
}

impl DataConnectionFactory for LocalDataConnectionFactory {
    fn create(&self, local_ip: IpAddr) -> Box<dyn DataConnection> {
        Box::new(LocalDataConnection::new(
            local_ip,
            Arc::clone(&self.allocator),
            self.tls.clone(),
        ))
    }

    fn supports_tls(&self) -> bool {
        self.tls.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn connection() -> LocalDataConnection {
        LocalDataConnection::new(
            LOCALHOST,
            Arc::new(PassivePortAllocator::new(30000, 60000)),
            None,
        )
    }

    #[tokio::test]
    async fn test_passive_send() {
        let mut data = connection();
        let addr = data.listen().unwrap();
        assert!(data.is_listening());
        assert_eq!(data.listen().unwrap(), addr);

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        });

        data.accept().await.unwrap();
        assert!(data.is_open().await);
        assert!(!data.is_listening());
        let mut source: &[u8] = b"listing\r\n";
        assert_eq!(data.send(&mut source).await.unwrap(), 9);
        data.disconnect().await.unwrap();
        assert!(!data.is_open().await);

        assert_eq!(client.await.unwrap(), b"listing\r\n".to_vec());
    }

    #[tokio::test]
    async fn test_active_receive() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let client = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"upload").await.unwrap();
        });

        let mut data = connection();
        data.connect_active(LOCALHOST, port, PROTOCOL_IPV4)
            .await
            .unwrap();
        client.await.unwrap();
        let mut sink = Vec::new();
        assert_eq!(data.receive(&mut sink).await.unwrap(), 6);
        assert_eq!(sink, b"upload".to_vec());
        data.close();
        data.close();
        assert!(!data.is_open().await);
    }

    #[tokio::test]
    async fn test_listen_drops_active_connection() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut data = connection();
        data.connect_active(LOCALHOST, port, PROTOCOL_IPV4)
            .await
            .unwrap();
        let (mut peer, _) = listener.accept().await.unwrap();
        assert!(data.is_open().await);

        data.listen().unwrap();
        assert!(data.is_listening());
        assert!(!data.is_open().await);
        let mut rest = Vec::new();
        assert_eq!(peer.read_to_end(&mut rest).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_listener() {
        let port = {
            let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut data = connection();
        let addr = data.listen().unwrap();
        assert!(data.connect_active(LOCALHOST, port, PROTOCOL_IPV4).await.is_err());
        assert!(data.is_listening());
        assert_eq!(data.listen().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_connection_closed_by_peer_is_not_open() {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut data = connection();
        data.connect_active(LOCALHOST, port, PROTOCOL_IPV4)
            .await
            .unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        assert!(data.is_open().await);

        drop(peer);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!data.is_open().await);
        let mut source: &[u8] = b"x";
        assert!(matches!(
            data.send(&mut source).await,
            Err(DataConnectionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_unsupported_protocols() {
        let mut data = connection();
        assert_eq!(data.supported_passive_protocols(), vec![PROTOCOL_IPV4]);
        match data.extended_listen(PROTOCOL_IPV6) {
            Err(DataConnectionError::ProtocolNotSupported { requested, supported }) => {
                assert_eq!(requested, PROTOCOL_IPV6);
                assert_eq!(supported, vec![PROTOCOL_IPV4]);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        let active = data.connect_active(LOCALHOST, 21, 9).await;
        assert!(matches!(
            active,
            Err(DataConnectionError::ProtocolNotSupported { requested: 9, .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_without_listen() {
        let mut data = connection();
        assert!(matches!(
            data.accept().await,
            Err(DataConnectionError::NotListening)
        ));
        let mut source: &[u8] = b"x";
        assert!(matches!(
            data.send(&mut source).await,
            Err(DataConnectionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_plain_connection_has_no_tls() {
        let mut data = connection();
        assert!(!data.supports_tls());
        assert!(matches!(
            data.upgrade_to_tls().await,
            Err(DataConnectionError::TlsUnavailable)
        ));
        assert!(!LocalDataConnectionFactory::default().supports_tls());
    }
}
