//! The narrow capability interface the session consumes from its
//! transport, plus a plain-TCP reference adapter used by this crate's
//! own integration tests.
//!
//! The genuine external collaborator in production is a WebSocket
//! session secured by TLS (§6 of the design notes); that transport, its
//! TLS configuration, and its handshake are not specified here. What
//! *is* specified is the four-operation trait the session is written
//! against, expressed as native `async fn`s in a trait so no
//! `async-trait`-style boxing is needed.

use std::future::Future;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::frame::scan_boundary;

/// Error surfaced by a transport at one of its four operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("recv failed: {0}")]
    Recv(String),
    #[error("close failed: {0}")]
    Close(String),
}

/// The capability set the session requires of its transport: establish
/// a connection, send one already-framed message, receive the next
/// complete inbound message, and close. The session is generic over
/// this trait (`Session<T: Transport>`) rather than boxing it as a
/// trait object, mirroring how the original client is polymorphic over
/// its WebSocket client via a template parameter.
pub trait Transport: Send + 'static {
    /// Establish the connection.
    fn connect(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send one complete wire message.
    fn send(&mut self, payload: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receive the next complete inbound wire message. `Ok(None)`
    /// signals an orderly peer-initiated close.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Initiate orderly shutdown.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A plain-TCP transport: no TLS, no WebSocket framing. It exists as a
/// worked reference implementation of [`Transport`] and as the backbone
/// of this crate's socket-level integration tests; a production client
/// instead supplies an adapter over a TLS WebSocket stream.
///
/// STOMP frames are NUL-terminated but TCP does not preserve message
/// boundaries, so this adapter buffers inbound bytes and uses
/// [`scan_boundary`] to find where one frame ends before handing a
/// slice back from [`Transport::recv`].
pub struct TcpTransport {
    addr: String,
    stream: Option<TcpStream>,
    inbound: Vec<u8>,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        TcpTransport {
            addr: addr.into(),
            stream: None,
            inbound: Vec::new(),
        }
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream
            .as_mut()
            .ok_or_else(|| TransportError::Send("not connected".to_string()))
    }
}

impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        self.stream = Some(stream);
        tracing::debug!(addr = %self.addr, "tcp transport connected");
        Ok(())
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.stream_mut()?
            .write_all(&payload)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            if let Some(len) = scan_boundary(&self.inbound) {
                let frame_bytes = self.inbound.drain(..len).collect::<Vec<u8>>();
                return Ok(Some(frame_bytes));
            }
            let mut chunk = [0u8; 4096];
            let n = self
                .stream_mut()?
                .read(&mut chunk)
                .await
                .map_err(|e| TransportError::Recv(e.to_string()))?;
            if n == 0 {
                return Ok(None);
            }
            self.inbound.extend_from_slice(&chunk[..n]);
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .shutdown()
                .await
                .map_err(|e| TransportError::Close(e.to_string()))?;
        }
        Ok(())
    }
}
