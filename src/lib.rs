//! STOMP 1.2 frame codec and client session state machine for a
//! transport-monitoring passenger-flow client.
//!
//! This crate covers the two pieces of hard engineering behind
//! subscribing to a STOMP broker over a WebSocket transport: a
//! byte-precise [`frame`] codec, and a [`session`] state machine that
//! drives the CONNECT/CONNECTED handshake, receipt-acknowledged
//! SUBSCRIBE, and per-subscription message dispatch over an abstract
//! [`transport`]. The TLS/WebSocket transport itself, JSON
//! configuration loading, and the process entry point are the calling
//! application's concern, not this crate's.

pub mod frame;
pub mod session;
pub mod transport;
pub mod vocabulary;

pub use frame::Frame;
pub use session::{MessageHandler, OnceHandler, Session, SessionConfig, SessionState};
pub use transport::{TcpTransport, Transport, TransportError};
pub use vocabulary::{CodecError, CommandKind, HeaderKind, SessionError};
