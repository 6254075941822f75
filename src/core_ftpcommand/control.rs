//! One FTP control connection: greeting, command loop, replies and teardown.

use crate::core_ftpcommand::error::SessionError;
use crate::core_ftpcommand::handlers;
use crate::core_network::data_connection::DataConnection;
use crate::core_network::line_reader::LineReader;
use crate::core_network::network::ServerContext;
use crate::core_network::stream::BoxedStream;
use crate::core_reply::{format_multiline_reply, format_reply, ReplyCode};
use crate::core_tls::ControlTlsUpgrade;
use crate::session::{DataConnectionMode, Session};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

pub struct ControlConnection {
    pub(crate) context: Arc<ServerContext>,
    pub(crate) session: Session,
    pub(crate) data_connection: Box<dyn DataConnection>,
    stream: Option<BoxedStream>,
    reader: LineReader,
    secure: bool,
    cancel: CancellationToken,
}

impl ControlConnection {
    pub fn new(
        context: Arc<ServerContext>,
        stream: BoxedStream,
        remote: SocketAddr,
        local: SocketAddr,
        cancel: CancellationToken,
    ) -> Self {
        // IPv4-mapped IPv6 peers are handled as plain IPv4.
        let remote = SocketAddr::new(remote.ip().to_canonical(), remote.port());
        let local = SocketAddr::new(local.ip().to_canonical(), local.port());
        let data_connection = context.data_connection_factory.create(local.ip());
        let session = Session::new(remote, local, context.list_format);
        let reader = LineReader::with_buffer_size(context.command_buffer_size);
        Self {
            context,
            session,
            data_connection,
            stream: Some(stream),
            reader,
            secure: false,
            cancel,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Serves the connection until the client quits, disconnects or the server stops.
    pub async fn run(mut self) {
        let remote = self.session.remote_endpoint;
        self.context.tracer.trace_user_connected(remote);

        match self.process().await {
            Ok(()) => info!("Session with {} finished", remote),
            Err(SessionError::Disconnected) => info!("Client {} closed the connection", remote),
            Err(e) => warn!("Session with {} aborted: {}", remote, e),
        }

        self.dispose().await;
        self.context.tracer.trace_user_disconnected(remote);
    }

    async fn process(&mut self) -> Result<(), SessionError> {
        let greeting = self.context.greeting.clone();
        self.reply(ReplyCode::ServiceReady, &greeting).await?;

        let cancel = self.cancel.clone();
        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                line = self.read_line() => line,
            };
            let line = match line {
                Ok(line) => line,
                Err(e) => return self.abort(e).await,
            };

            match handlers::process_command(self, &line).await {
                Ok(()) => {}
                Err(SessionError::QuitRequested) => return Ok(()),
                Err(e) if e.is_fatal() => return self.abort(e).await,
                Err(e) => {
                    debug!("Command failed for {}: {}", self.session.remote_endpoint, e);
                    let (code, text) = e.reply();
                    self.reply(code, &text).await?;
                }
            }

            if cancel.is_cancelled() {
                return Ok(());
            }
        }
    }

    /// Ends the session on a fatal error, telling the client when the line was too long.
    async fn abort(&mut self, error: SessionError) -> Result<(), SessionError> {
        if let SessionError::LineTooLong(limit) = error {
            let text = format!("Command line exceeds {} bytes", limit);
            self.reply(ReplyCode::SyntaxError, &text).await?;
        }
        Err(error)
    }

    async fn dispose(&mut self) {
        self.data_connection.close();
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Control channel shutdown failed: {}", e);
            }
        }
    }

    /// Reads the next command line in the session's encoding.
    pub async fn read_line(&mut self) -> Result<String, SessionError> {
        let stream = self.stream.as_mut().ok_or(SessionError::Disconnected)?;
        let line = self.reader.read_line(stream, self.session.encoding).await?;
        Ok(line)
    }

    pub async fn reply(&mut self, code: ReplyCode, text: &str) -> Result<(), SessionError> {
        self.context
            .tracer
            .trace_reply(code.code(), text, self.session.remote_endpoint);
        let bytes = self.session.encoding.encode(&format_reply(code, text));
        self.write_control(&bytes).await
    }

    /// Sends `text` as a multi-line reply; each `\n` starts a continuation line.
    pub async fn reply_multiline(&mut self, code: ReplyCode, text: &str) -> Result<(), SessionError> {
        self.context
            .tracer
            .trace_reply(code.code(), text, self.session.remote_endpoint);
        let bytes = self
            .session
            .encoding
            .encode(&format_multiline_reply(code, text));
        self.write_control(&bytes).await
    }

    async fn write_control(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let stream = self.stream.as_mut().ok_or(SessionError::Disconnected)?;
        stream
            .write_all(bytes)
            .await
            .map_err(SessionError::ControlIo)?;
        stream.flush().await.map_err(SessionError::ControlIo)
    }

    /// Replaces the control stream with its TLS-wrapped version.
    ///
    /// Bytes the client pipelined before the handshake are discarded.
    pub async fn upgrade_control_stream(
        &mut self,
        tls: Arc<dyn ControlTlsUpgrade>,
    ) -> Result<(), SessionError> {
        let stream = self.stream.take().ok_or(SessionError::Disconnected)?;
        let upgraded = tls.upgrade(stream).await.map_err(SessionError::ControlTls)?;
        self.stream = Some(upgraded);
        self.reader = LineReader::with_buffer_size(self.context.command_buffer_size);
        self.secure = true;
        info!("Control connection of {} secured", self.session.remote_endpoint);
        Ok(())
    }

    /// Sends close_notify on a TLS control stream before the session ends.
    pub async fn shutdown_control_tls(&mut self) -> Result<(), SessionError> {
        if !self.secure {
            return Ok(());
        }
        if let (Some(tls), Some(stream)) = (self.context.control_tls.clone(), self.stream.as_mut()) {
            tls.disconnect(stream)
                .await
                .map_err(SessionError::ControlTls)?;
        }
        Ok(())
    }

    /// Announces the transfer and makes sure the data channel is open.
    ///
    /// Replies 125 when the channel is already open, otherwise 150 before
    /// connecting (active) or accepting (passive). The channel is secured when
    /// `PROT P` is in effect.
    pub async fn open_data_connection(&mut self) -> Result<(), SessionError> {
        if self.data_connection.is_open().await {
            self.reply(ReplyCode::DataConnectionAlreadyOpen, "Transfer is starting")
                .await?;
        } else {
            self.reply(
                ReplyCode::AboutToOpenDataConnection,
                "File is ok, about to open connection",
            )
            .await?;
            match self.session.data_connection_mode {
                DataConnectionMode::Active | DataConnectionMode::ExtendedActive => {
                    let endpoint = self.session.user_active_endpoint;
                    self.data_connection
                        .connect_active(endpoint.ip, endpoint.port, endpoint.protocol)
                        .await?;
                }
                DataConnectionMode::Passive | DataConnectionMode::ExtendedPassive => {
                    self.data_connection.accept().await?;
                }
            }
        }

        if self.session.use_secure_data_connection {
            self.data_connection.upgrade_to_tls().await?;
        }
        Ok(())
    }

    /// Closes the data channel after a transfer, whatever its outcome.
    pub async fn finish_transfer<T>(
        &mut self,
        result: Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let closed = self.data_connection.disconnect().await;
        let value = result?;
        closed?;
        Ok(value)
    }
}
