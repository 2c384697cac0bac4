//! Shared closed vocabularies for the STOMP subset this client speaks:
//! command kinds, header kinds, and the two error enumerations that the
//! codec and the session report through.

use std::fmt;

/// A STOMP 1.2 verb. Unknown verbs never enter the model — they surface
/// as [`crate::vocabulary::CodecError::UndefinedCommand`] during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Send,
    Subscribe,
    Unsubscribe,
    Begin,
    Commit,
    Abort,
    Ack,
    Nack,
    Disconnect,
    Connect,
    Stomp,
    Connected,
    Message,
    Receipt,
    Error,
}

impl CommandKind {
    /// The exact uppercase wire token for this command.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Send => "SEND",
            CommandKind::Subscribe => "SUBSCRIBE",
            CommandKind::Unsubscribe => "UNSUBSCRIBE",
            CommandKind::Begin => "BEGIN",
            CommandKind::Commit => "COMMIT",
            CommandKind::Abort => "ABORT",
            CommandKind::Ack => "ACK",
            CommandKind::Nack => "NACK",
            CommandKind::Disconnect => "DISCONNECT",
            CommandKind::Connect => "CONNECT",
            CommandKind::Stomp => "STOMP",
            CommandKind::Connected => "CONNECTED",
            CommandKind::Message => "MESSAGE",
            CommandKind::Receipt => "RECEIPT",
            CommandKind::Error => "ERROR",
        }
    }

    /// Resolve a wire token to a known command, or `None` for anything
    /// outside the closed set.
    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        Some(match token {
            b"SEND" => CommandKind::Send,
            b"SUBSCRIBE" => CommandKind::Subscribe,
            b"UNSUBSCRIBE" => CommandKind::Unsubscribe,
            b"BEGIN" => CommandKind::Begin,
            b"COMMIT" => CommandKind::Commit,
            b"ABORT" => CommandKind::Abort,
            b"ACK" => CommandKind::Ack,
            b"NACK" => CommandKind::Nack,
            b"DISCONNECT" => CommandKind::Disconnect,
            b"CONNECT" => CommandKind::Connect,
            b"STOMP" => CommandKind::Stomp,
            b"CONNECTED" => CommandKind::Connected,
            b"MESSAGE" => CommandKind::Message,
            b"RECEIPT" => CommandKind::Receipt,
            b"ERROR" => CommandKind::Error,
            _ => return None,
        })
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A STOMP header this client recognizes. Wire representation is the
/// lowercase token.
///
/// `Subscription` is carried beyond the 13 tokens named in the
/// distilled vocabulary: real brokers stamp MESSAGE frames with a
/// `subscription` header, and this client must still decode them.
/// Dispatch itself keys off `receipt-id`, never `subscription`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    ContentLength,
    ContentType,
    Receipt,
    AcceptVersion,
    Host,
    Login,
    Passcode,
    Id,
    Destination,
    Ack,
    Version,
    Session,
    ReceiptId,
    Subscription,
}

impl HeaderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HeaderKind::ContentLength => "content-length",
            HeaderKind::ContentType => "content-type",
            HeaderKind::Receipt => "receipt",
            HeaderKind::AcceptVersion => "accept-version",
            HeaderKind::Host => "host",
            HeaderKind::Login => "login",
            HeaderKind::Passcode => "passcode",
            HeaderKind::Id => "id",
            HeaderKind::Destination => "destination",
            HeaderKind::Ack => "ack",
            HeaderKind::Version => "version",
            HeaderKind::Session => "session",
            HeaderKind::ReceiptId => "receipt-id",
            HeaderKind::Subscription => "subscription",
        }
    }

    pub fn from_str(token: &str) -> Option<Self> {
        Some(match token {
            "content-length" => HeaderKind::ContentLength,
            "content-type" => HeaderKind::ContentType,
            "receipt" => HeaderKind::Receipt,
            "accept-version" => HeaderKind::AcceptVersion,
            "host" => HeaderKind::Host,
            "login" => HeaderKind::Login,
            "passcode" => HeaderKind::Passcode,
            "id" => HeaderKind::Id,
            "destination" => HeaderKind::Destination,
            "ack" => HeaderKind::Ack,
            "version" => HeaderKind::Version,
            "session" => HeaderKind::Session,
            "receipt-id" => HeaderKind::ReceiptId,
            "subscription" => HeaderKind::Subscription,
            _ => return None,
        })
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors the frame codec can report. The codec never surfaces a
/// decoded frame alongside one of these: callers get a `Result`, never
/// an out-parameter plus an `Ok` sentinel.
///
/// `EmptyHeader` is kept for parity with the protocol's historical
/// error taxonomy but this decoder never constructs it: an empty
/// header line is the normal header/body separator, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("command token not recognized")]
    UndefinedCommand,
    #[error("empty header line encountered outside the header/body separator position")]
    EmptyHeader,
    #[error("header line has no colon, or its key is not recognized")]
    BadHeader,
    #[error("header value is empty")]
    EmptyHeaderValue,
    #[error("header phase ended without finding the blank separator line")]
    MissingBodyNewline,
    #[error("body was not terminated by a NUL byte")]
    UnterminatedBody,
    #[error("non line-feed byte found after the body's terminating NUL")]
    JunkAfterBody,
    #[error("declared content-length does not match the body's actual length")]
    WrongContentLength,
    #[error("CONNECT/STOMP frame is missing the accept-version header")]
    MissingAcceptVersion,
    #[error("CONNECT/STOMP frame is missing the host header")]
    MissingHost,
}

/// Errors the session can report to a completion handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session operation invalid in the current state, or the inbound frame could not be used")]
    Undefined,
    #[error("transport failed to establish a connection")]
    CouldNotConnectTransport,
    #[error("transport failed to send the STOMP/CONNECT frame")]
    CouldNotSendStompFrame,
    #[error("transport failed to send a SUBSCRIBE frame")]
    CouldNotSendSubscribeFrame,
    #[error("a frame could not be built from the given command and headers")]
    CouldNotCreateValidFrame,
    #[error("message body was not the content type a handler could consume")]
    UnexpectedMessageContentType,
    #[error("message destination did not match the subscription's destination")]
    SubscriptionMismatch,
    #[error("transport disconnected")]
    TransportDisconnected,
    #[error("transport failed to close cleanly")]
    CouldNotCloseTransport,
}
