use crate::config::{AuthMode, Config};
use crate::constants::DEFAULT_GREETING;
use crate::core_auth::{
    AnonymousAuthenticator, Authenticator, PasswdAuthenticator, SimpleAuthenticator,
};
use crate::core_file::{FileProviderFactory, LocalFileProviderFactory};
use crate::core_ftpcommand::control::ControlConnection;
use crate::core_network::data_connection::{DataConnectionFactory, LocalDataConnectionFactory};
use crate::core_network::line_reader::DEFAULT_READ_BUFFER_SIZE;
use crate::core_network::port_allocator::PassivePortAllocator;
use crate::core_tls::{ControlTlsUpgrade, TlsConnection};
use crate::core_trace::{FtpTraceObserver, FtpTracer, LogTraceObserver};
use crate::session::ListFormat;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

/// Everything a control connection needs from the server, shared by all sessions.
pub struct ServerContext {
    pub authenticator: Arc<dyn Authenticator>,
    pub file_provider_factory: Arc<dyn FileProviderFactory>,
    pub data_connection_factory: Arc<dyn DataConnectionFactory>,
    pub control_tls: Option<Arc<dyn ControlTlsUpgrade>>,
    pub tracer: Arc<FtpTracer>,
    pub greeting: String,
    pub list_format: ListFormat,
    /// Address advertised in 227 replies instead of the bound one.
    pub pasv_address: Option<Ipv4Addr>,
    pub command_buffer_size: usize,
}

pub struct FtpServerBuilder {
    authenticator: Arc<dyn Authenticator>,
    file_provider_factory: Arc<dyn FileProviderFactory>,
    data_connection_factory: Option<Arc<dyn DataConnectionFactory>>,
    control_tls: Option<Arc<dyn ControlTlsUpgrade>>,
    observers: Vec<Arc<dyn FtpTraceObserver>>,
    greeting: String,
    list_format: ListFormat,
    pasv_address: Option<Ipv4Addr>,
    command_buffer_size: usize,
}

impl FtpServerBuilder {
    pub fn data_connection_factory(mut self, factory: Arc<dyn DataConnectionFactory>) -> Self {
        self.data_connection_factory = Some(factory);
        self
    }

    /// Enables `AUTH TLS` on the control channel.
    pub fn control_tls(mut self, tls: Arc<dyn ControlTlsUpgrade>) -> Self {
        self.control_tls = Some(tls);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn FtpTraceObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn list_format(mut self, list_format: ListFormat) -> Self {
        self.list_format = list_format;
        self
    }

    pub fn pasv_address(mut self, address: Option<Ipv4Addr>) -> Self {
        self.pasv_address = address;
        self
    }

    pub fn command_buffer_size(mut self, size: usize) -> Self {
        self.command_buffer_size = size;
        self
    }

    pub fn build(self) -> FtpServer {
        let data_connection_factory = self
            .data_connection_factory
            .unwrap_or_else(|| {
                Arc::new(LocalDataConnectionFactory::default()) as Arc<dyn DataConnectionFactory>
            });
        FtpServer {
            context: Arc::new(ServerContext {
                authenticator: self.authenticator,
                file_provider_factory: self.file_provider_factory,
                data_connection_factory,
                control_tls: self.control_tls,
                tracer: Arc::new(FtpTracer::new(self.observers)),
                greeting: self.greeting,
                list_format: self.list_format,
                pasv_address: self.pasv_address,
                command_buffer_size: self.command_buffer_size,
            }),
        }
    }
}

pub struct FtpServer {
    context: Arc<ServerContext>,
}

impl FtpServer {
    /// Starts a builder. The log observer is registered by default.
    pub fn builder(
        authenticator: Arc<dyn Authenticator>,
        file_provider_factory: Arc<dyn FileProviderFactory>,
    ) -> FtpServerBuilder {
        FtpServerBuilder {
            authenticator,
            file_provider_factory,
            data_connection_factory: None,
            control_tls: None,
            observers: vec![Arc::new(LogTraceObserver)],
            greeting: DEFAULT_GREETING.to_string(),
            list_format: ListFormat::default(),
            pasv_address: None,
            command_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    /// Wires authenticator, file provider, passive ports and TLS from the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let authenticator: Arc<dyn Authenticator> = match config.auth.mode {
            AuthMode::Anonymous => Arc::new(AnonymousAuthenticator),
            AuthMode::Simple => Arc::new(SimpleAuthenticator::new(
                config.auth.username.clone(),
                config.auth.password.clone(),
            )),
            AuthMode::Passwd => {
                let path = config
                    .auth
                    .passwd_file
                    .as_ref()
                    .context("auth.passwd_file is required when auth.mode = \"passwd\"")?;
                Arc::new(PasswdAuthenticator::load(path)?)
            }
        };

        let allocator = Arc::new(PassivePortAllocator::new(
            config.server.pasv_port_min,
            config.server.pasv_port_max,
        ));
        let mut data_factory = LocalDataConnectionFactory::new(allocator);
        let tls = TlsConnection::from_config(&config.tls).context("Failed to set up TLS")?;
        if let Some(tls) = &tls {
            data_factory = data_factory.with_tls(tls.acceptor());
        }

        let mut builder = FtpServer::builder(
            authenticator,
            Arc::new(LocalFileProviderFactory::new(&config.server.root_dir)),
        )
        .data_connection_factory(Arc::new(data_factory))
        .greeting(config.server.greeting.clone())
        .list_format(config.server.list_format)
        .pasv_address(config.server.pasv_address)
        .command_buffer_size(config.server.command_buffer_size);
        if let Some(tls) = tls {
            builder = builder.control_tls(Arc::new(tls));
        }
        Ok(builder.build())
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    pub fn tracer(&self) -> Arc<FtpTracer> {
        Arc::clone(&self.context.tracer)
    }

    /// Binds `addr` and serves until `cancel` fires.
    pub async fn run(&self, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        self.serve(listener, cancel).await
    }

    /// Accepts control connections on `listener` until `cancel` fires.
    ///
    /// Running sessions see the same token and stop between commands.
    pub async fn serve(&self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        self.context.tracer.start();
        info!("Server listening on {}", listener.local_addr()?);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Server stopped accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok((socket, remote)) => self.spawn_session(socket, remote, cancel.clone()),
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }
    }

    fn spawn_session(&self, socket: TcpStream, remote: SocketAddr, cancel: CancellationToken) {
        let local = match socket.local_addr() {
            Ok(local) => local,
            Err(e) => {
                warn!("Dropping connection from {}: {}", remote, e);
                return;
            }
        };
        info!("New connection from {}", remote);
        let connection = ControlConnection::new(
            Arc::clone(&self.context),
            Box::new(socket),
            remote,
            local,
            cancel,
        );
        tokio::spawn(connection.run());
    }
}
