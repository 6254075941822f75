#![allow(dead_code)]

use ferrftpd::core_auth::{AnonymousAuthenticator, Authenticator};
use ferrftpd::core_file::LocalFileProviderFactory;
use ferrftpd::core_trace::{FtpTraceObserver, TraceEvent};
use ferrftpd::{FtpServer, FtpServerBuilder};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

pub struct TestServer {
    pub addr: SocketAddr,
    pub cancel: CancellationToken,
    pub server: Arc<FtpServer>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn builder(root: &Path) -> FtpServerBuilder {
    builder_with(root, Arc::new(AnonymousAuthenticator))
}

pub fn builder_with(root: &Path, authenticator: Arc<dyn Authenticator>) -> FtpServerBuilder {
    FtpServer::builder(authenticator, Arc::new(LocalFileProviderFactory::new(root)))
}

pub async fn start(builder: FtpServerBuilder) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let server = Arc::new(builder.build());

    let serving = Arc::clone(&server);
    let token = cancel.clone();
    tokio::spawn(async move { serving.serve(listener, token).await });

    TestServer {
        addr,
        cancel,
        server,
    }
}

/// Raw control-channel client.
pub struct Client<S> {
    pub stream: BufReader<S>,
}

impl Client<TcpStream> {
    /// Connects and consumes the 220 greeting.
    pub async fn connect(addr: SocketAddr) -> Self {
        let mut client = Client {
            stream: BufReader::new(TcpStream::connect(addr).await.unwrap()),
        };
        let greeting = client.read_reply().await;
        assert!(greeting.starts_with("220 "), "unexpected greeting {:?}", greeting);
        client
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    pub fn new(stream: S) -> Self {
        Client {
            stream: BufReader::new(stream),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    /// Reads one reply line including its CRLF. Empty when the server closed the connection.
    pub async fn read_reply(&mut self) -> String {
        let mut line = String::new();
        self.stream.read_line(&mut line).await.unwrap();
        line
    }

    /// Reads a multi-line reply up to the `<code> ` terminator line.
    pub async fn read_multiline(&mut self, code: &str) -> Vec<String> {
        let terminator = format!("{} ", code);
        let mut lines = Vec::new();
        loop {
            let line = self.read_reply().await;
            assert!(!line.is_empty(), "connection closed inside a multi-line reply");
            let done = line.starts_with(&terminator);
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    pub async fn send(&mut self, command: &str) {
        let stream = self.stream.get_mut();
        stream
            .write_all(format!("{}\r\n", command).as_bytes())
            .await
            .unwrap();
        stream.flush().await.unwrap();
    }

    pub async fn command(&mut self, command: &str) -> String {
        self.send(command).await;
        self.read_reply().await
    }

    pub async fn login(&mut self) {
        assert!(self.command("USER anonymous").await.starts_with("331 "));
        assert!(self.command("PASS guest@example.com").await.starts_with("230 "));
    }

    /// Issues PASV and returns the announced data endpoint.
    pub async fn pasv(&mut self) -> SocketAddr {
        let reply = self.command("PASV").await;
        assert!(reply.starts_with("227 "), "unexpected PASV reply {:?}", reply);
        parse_pasv_reply(&reply)
    }
}

pub fn parse_pasv_reply(reply: &str) -> SocketAddr {
    let start = reply.find('(').unwrap() + 1;
    let end = reply.find(')').unwrap();
    let numbers: Vec<u8> = reply[start..end]
        .split(',')
        .map(|n| n.parse().unwrap())
        .collect();
    let ip = std::net::Ipv4Addr::new(numbers[0], numbers[1], numbers[2], numbers[3]);
    let port = u16::from_be_bytes([numbers[4], numbers[5]]);
    SocketAddr::from((ip, port))
}

/// Collects every trace event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<TraceEvent>>,
}

impl FtpTraceObserver for RecordingObserver {
    fn on_event(&self, event: &TraceEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
