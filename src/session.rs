//! The STOMP client session: a callback-driven state machine that owns
//! one transport, runs as a single background task (the session's
//! "strand"), and drives the CONNECT/CONNECTED handshake,
//! receipt-acknowledged SUBSCRIBE, per-subscription message dispatch,
//! and orderly teardown.

use std::collections::HashMap;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::frame::Frame;
use crate::transport::Transport;
use crate::vocabulary::{CommandKind, HeaderKind, SessionError};

/// A handler invoked at most once with the outcome of a single
/// operation (connect, close, or one subscribe's receipt).
pub type OnceHandler<T> = Box<dyn FnOnce(Result<T, SessionError>) + Send>;

/// A handler invoked once per inbound `MESSAGE` routed to a
/// subscription.
pub type MessageHandler = Box<dyn FnMut(Result<String, SessionError>) + Send>;

/// Where this client's STOMP `host` header value, and the broker
/// address it is paired with, come from. No environment variables or
/// CLI are part of the core — a caller constructs this directly.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Value sent as the STOMP `host` header during the handshake.
    pub host: String,
    /// Broker endpoint path, carried for diagnostics.
    pub endpoint: String,
    /// Broker port, carried for diagnostics.
    pub port: u16,
}

/// Current position in the state machine of §4.2.2. `Closed` and
/// `Failed` are terminal: once reached, further API calls are rejected
/// without touching the transport again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    WsConnecting,
    StompConnecting,
    Connected,
    Closing,
    Closed,
    Failed,
}

struct SubscriptionRecord {
    destination: String,
    on_subscribe: Option<OnceHandler<String>>,
    on_message: MessageHandler,
}

enum ActorCommand {
    Connect {
        username: String,
        password: String,
        on_connect: Option<OnceHandler<()>>,
        on_disconnect: Option<OnceHandler<()>>,
    },
    Subscribe {
        id: String,
        destination: String,
        on_subscribe: OnceHandler<String>,
        on_message: MessageHandler,
    },
    Close {
        on_close: Option<OnceHandler<()>>,
    },
}

/// A STOMP client session. This handle is cheap, non-`Clone`, and owns
/// nothing but a channel to the background task that owns the
/// transport and the subscription table; moving it transfers ownership
/// of both, exactly as the copy-forbidden contract requires.
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<ActorCommand>,
}

impl Session {
    /// Construct a session over `transport`, spawning its background
    /// task immediately. The task starts in [`SessionState::Idle`] and
    /// does nothing until [`Session::connect`] is called.
    pub fn new<T: Transport>(transport: T, config: SessionConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(transport, config, cmd_rx));
        Session { cmd_tx }
    }

    /// Initiate the transport connection and, once established, the
    /// STOMP handshake. `on_connect` fires exactly once; `on_disconnect`
    /// fires at most once, and is always the last handler this session
    /// invokes.
    pub fn connect(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        on_connect: Option<OnceHandler<()>>,
        on_disconnect: Option<OnceHandler<()>>,
    ) {
        let _ = self.cmd_tx.send(ActorCommand::Connect {
            username: username.into(),
            password: password.into(),
            on_connect,
            on_disconnect,
        });
    }

    /// Subscribe to `destination`, returning the freshly generated
    /// subscription id synchronously, or the empty string if no valid
    /// SUBSCRIBE frame could be built (for example, an empty
    /// destination).
    pub fn subscribe(
        &self,
        destination: impl Into<String>,
        on_subscribe: OnceHandler<String>,
        on_message: MessageHandler,
    ) -> String {
        let destination = destination.into();
        if destination.is_empty() {
            return String::new();
        }
        let id = Uuid::new_v4().simple().to_string();
        let _ = self.cmd_tx.send(ActorCommand::Subscribe {
            id: id.clone(),
            destination,
            on_subscribe,
            on_message,
        });
        id
    }

    /// Request transport close. `on_close` fires once with the result.
    pub fn close(&self, on_close: Option<OnceHandler<()>>) {
        let _ = self.cmd_tx.send(ActorCommand::Close { on_close });
    }
}

fn fire<T>(handler: Option<OnceHandler<T>>, result: Result<T, SessionError>) {
    if let Some(cb) = handler {
        cb(result);
    }
}

async fn run<T: Transport>(mut transport: T, config: SessionConfig, mut cmd_rx: mpsc::UnboundedReceiver<ActorCommand>) {
    let mut state = SessionState::Idle;
    let mut subscriptions: HashMap<String, SubscriptionRecord> = HashMap::new();
    let mut pending_on_connect: Option<OnceHandler<()>> = None;
    let mut on_disconnect: Option<OnceHandler<()>> = None;

    loop {
        let recv_active = matches!(state, SessionState::StompConnecting | SessionState::Connected);
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None => {
                        // Handle dropped without an explicit close(): treat
                        // it as one, per §5's implicit-close note.
                        let _ = transport.close().await;
                        fire(on_disconnect.take(), Ok(()));
                        break;
                    }
                    Some(ActorCommand::Connect { username, password, on_connect, on_disconnect: od }) => {
                        if !matches!(state, SessionState::Idle) {
                            fire(on_connect, Err(SessionError::Undefined));
                            continue;
                        }
                        on_disconnect = od;
                        state = SessionState::WsConnecting;
                        if let Err(e) = transport.connect().await {
                            tracing::warn!(error = %e, "transport connect failed");
                            state = SessionState::Failed;
                            fire(on_connect, Err(SessionError::CouldNotConnectTransport));
                            continue;
                        }
                        state = SessionState::StompConnecting;
                        let headers = vec![
                            (HeaderKind::AcceptVersion, "1.2".to_string()),
                            (HeaderKind::Host, config.host.clone()),
                            (HeaderKind::Login, username),
                            (HeaderKind::Passcode, password),
                        ];
                        match Frame::try_new(CommandKind::Stomp, headers, Vec::new()) {
                            Err(_) => {
                                state = SessionState::Failed;
                                fire(on_connect, Err(SessionError::CouldNotCreateValidFrame));
                            }
                            Ok(frame) => match transport.send(frame.encode()).await {
                                Err(e) => {
                                    tracing::warn!(error = %e, "failed to send STOMP/CONNECT frame");
                                    state = SessionState::Failed;
                                    fire(on_connect, Err(SessionError::CouldNotSendStompFrame));
                                }
                                Ok(()) => {
                                    pending_on_connect = on_connect;
                                }
                            },
                        }
                    }
                    Some(ActorCommand::Subscribe { id, destination, on_subscribe, on_message }) => {
                        if !matches!(state, SessionState::Connected) {
                            fire(Some(on_subscribe), Err(SessionError::Undefined));
                            continue;
                        }
                        let headers = vec![
                            (HeaderKind::Id, id.clone()),
                            (HeaderKind::Destination, destination.clone()),
                            (HeaderKind::Ack, "auto".to_string()),
                            (HeaderKind::Receipt, id.clone()),
                        ];
                        match Frame::try_new(CommandKind::Subscribe, headers, Vec::new()) {
                            Err(_) => fire(Some(on_subscribe), Err(SessionError::CouldNotCreateValidFrame)),
                            Ok(frame) => match transport.send(frame.encode()).await {
                                Err(e) => {
                                    tracing::warn!(error = %e, "failed to send SUBSCRIBE frame");
                                    fire(Some(on_subscribe), Err(SessionError::CouldNotSendSubscribeFrame));
                                }
                                Ok(()) => {
                                    subscriptions.insert(
                                        id,
                                        SubscriptionRecord { destination, on_subscribe: Some(on_subscribe), on_message },
                                    );
                                }
                            },
                        }
                    }
                    Some(ActorCommand::Close { on_close }) => {
                        if matches!(state, SessionState::Failed | SessionState::Closed) {
                            fire(on_close, Err(SessionError::Undefined));
                            continue;
                        }
                        state = SessionState::Closing;
                        let result = transport.close().await;
                        state = SessionState::Closed;
                        fire(on_close, result.map_err(|e| {
                            tracing::warn!(error = %e, "transport close failed");
                            SessionError::CouldNotCloseTransport
                        }));
                        fire(on_disconnect.take(), Ok(()));
                        break;
                    }
                }
            }
            msg = transport.recv(), if recv_active => {
                match msg {
                    Ok(Some(bytes)) => match Frame::decode(&bytes) {
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to decode inbound frame");
                            if matches!(state, SessionState::StompConnecting) {
                                state = SessionState::Failed;
                                fire(pending_on_connect.take(), Err(SessionError::Undefined));
                            }
                        }
                        Ok(frame) => dispatch(frame, &mut state, &mut subscriptions, &mut pending_on_connect),
                    },
                    Ok(None) => {
                        state = SessionState::Closed;
                        fire(on_disconnect.take(), Ok(()));
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "transport recv failed");
                        state = SessionState::Closed;
                        fire(on_disconnect.take(), Err(SessionError::TransportDisconnected));
                        break;
                    }
                }
            }
        }
    }
}

fn dispatch(
    frame: Frame,
    state: &mut SessionState,
    subscriptions: &mut HashMap<String, SubscriptionRecord>,
    pending_on_connect: &mut Option<OnceHandler<()>>,
) {
    // Anything other than CONNECTED seen while the handshake is still
    // outstanding fails it, regardless of which command it is — a
    // broker rejecting bad credentials with ERROR instead of CONNECTED
    // is a routine STOMP pattern, not a frame to silently drop.
    if *state == SessionState::StompConnecting {
        if frame.command() == CommandKind::Connected {
            *state = SessionState::Connected;
            fire(pending_on_connect.take(), Ok(()));
        } else {
            *state = SessionState::Failed;
            fire(pending_on_connect.take(), Err(SessionError::Undefined));
        }
        return;
    }

    match frame.command() {
        CommandKind::Receipt => {
            let id = frame.header(HeaderKind::ReceiptId);
            match subscriptions.get_mut(id) {
                Some(record) => fire(record.on_subscribe.take(), Ok(id.to_string())),
                None => tracing::debug!(receipt_id = id, "receipt for unknown subscription"),
            }
        }
        CommandKind::Message => {
            let id = frame.header(HeaderKind::ReceiptId);
            match subscriptions.get_mut(id) {
                Some(record) => {
                    let destination = frame.header(HeaderKind::Destination);
                    if destination != record.destination {
                        (record.on_message)(Err(SessionError::SubscriptionMismatch));
                    } else {
                        match std::str::from_utf8(frame.body()) {
                            Ok(body) => (record.on_message)(Ok(body.to_string())),
                            Err(_) => (record.on_message)(Err(SessionError::UnexpectedMessageContentType)),
                        }
                    }
                }
                None => tracing::debug!(receipt_id = id, "message for unknown subscription"),
            }
        }
        CommandKind::Error => {
            tracing::warn!(body = %frame.body_str(), "server sent ERROR frame");
        }
        other => {
            tracing::debug!(command = %other, "frame ignored");
        }
    }
}
