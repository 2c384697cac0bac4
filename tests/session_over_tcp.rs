//! Integration tests driving a real `Session<TcpTransport>` against a
//! fake broker running on a background thread, in the same style used
//! throughout this lineage's socket-level tests: bind an ephemeral
//! port, spawn a plain `std::thread` to play the server side, and drive
//! the client through `#[tokio::test]`.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use stomp_core::{SessionConfig, SessionError, TcpTransport};
use tokio::sync::oneshot;

fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn config(port: u16) -> SessionConfig {
    SessionConfig { host: "broker.example".to_string(), endpoint: "/ws".to_string(), port }
}

#[tokio::test]
async fn connect_subscribe_message_and_close_happy_path() {
    let port = get_available_port();
    let addr = format!("127.0.0.1:{port}");

    let server_addr = addr.clone();
    let server = thread::spawn(move || {
        let listener = TcpListener::bind(&server_addr).unwrap();
        let (mut stream, _) = listener.accept().unwrap();

        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf); // CONNECT
        stream.write_all(b"CONNECTED\nversion:1.2\n\n\0").unwrap();

        let n = stream.read(&mut buf).unwrap(); // SUBSCRIBE
        let sent = String::from_utf8_lossy(&buf[..n]).to_string();
        let id = sent
            .lines()
            .find_map(|l| l.strip_prefix("id:"))
            .expect("subscribe frame carries an id header")
            .to_string();

        stream
            .write_all(format!("RECEIPT\nreceipt-id:{id}\n\n\0").as_bytes())
            .unwrap();
        stream
            .write_all(format!("MESSAGE\nsubscription:0\nreceipt-id:{id}\ndestination:/d\n\nHello\0").as_bytes())
            .unwrap();

        thread::sleep(Duration::from_millis(100));
    });

    thread::sleep(Duration::from_millis(50));

    let transport = TcpTransport::new(&addr);
    let session = stomp_core::Session::new(transport, config(port));

    let (connect_tx, connect_rx) = oneshot::channel();
    session.connect(
        "user",
        "pass",
        Some(Box::new(move |r| {
            let _ = connect_tx.send(r);
        })),
        None,
    );
    assert_eq!(connect_rx.await.unwrap(), Ok(()));

    let (sub_tx, sub_rx) = oneshot::channel();
    let sub_tx = std::sync::Mutex::new(Some(sub_tx));
    let (msg_tx, mut msg_rx) = tokio::sync::mpsc::unbounded_channel();
    let id = session.subscribe(
        "/d",
        Box::new(move |r| {
            if let Some(tx) = sub_tx.lock().unwrap().take() {
                let _ = tx.send(r);
            }
        }),
        Box::new(move |r| {
            let _ = msg_tx.send(r);
        }),
    );
    assert!(!id.is_empty());
    assert_eq!(sub_rx.await.unwrap(), Ok(id));
    assert_eq!(msg_rx.recv().await, Some(Ok("Hello".to_string())));

    server.join().unwrap();
}

#[tokio::test]
async fn unparseable_frame_during_handshake_fails_the_connect() {
    let port = get_available_port();
    let addr = format!("127.0.0.1:{port}");

    let server_addr = addr.clone();
    let server = thread::spawn(move || {
        let listener = TcpListener::bind(&server_addr).unwrap();
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);
        stream.write_all(b"GARBAGE_COMMAND\n\n\0").unwrap();
        thread::sleep(Duration::from_millis(100));
    });

    thread::sleep(Duration::from_millis(50));

    let transport = TcpTransport::new(&addr);
    let session = stomp_core::Session::new(transport, config(port));

    let (connect_tx, connect_rx) = oneshot::channel();
    session.connect(
        "user",
        "pass",
        Some(Box::new(move |r| {
            let _ = connect_tx.send(r);
        })),
        None,
    );
    assert_eq!(connect_rx.await.unwrap(), Err(SessionError::Undefined));

    server.join().unwrap();
}

#[tokio::test]
async fn connection_refused_surfaces_could_not_connect_transport() {
    let port = get_available_port();
    let addr = format!("127.0.0.1:{port}");
    // No listener bound on this port.

    let transport = TcpTransport::new(&addr);
    let session = stomp_core::Session::new(transport, config(port));

    let (connect_tx, connect_rx) = oneshot::channel();
    session.connect(
        "user",
        "pass",
        Some(Box::new(move |r| {
            let _ = connect_tx.send(r);
        })),
        None,
    );
    assert_eq!(connect_rx.await.unwrap(), Err(SessionError::CouldNotConnectTransport));
}

#[tokio::test]
async fn server_closing_before_connected_reports_an_orderly_disconnect() {
    // An orderly EOF (the peer simply closing the socket) is reported
    // as `on-disconnect(Ok)`, not `TransportDisconnected` — that kind is
    // reserved for an actual transport-level I/O error, which a clean
    // close is not. `on-connect` never fires in this case: it was still
    // pending when the disconnect preempted it, and best-effort
    // delivery means a handler that never gets reached is simply never
    // invoked.
    let port = get_available_port();
    let addr = format!("127.0.0.1:{port}");

    let server_addr = addr.clone();
    let server = thread::spawn(move || {
        let listener = TcpListener::bind(&server_addr).unwrap();
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);
        drop(stream);
    });

    thread::sleep(Duration::from_millis(50));

    let transport = TcpTransport::new(&addr);
    let session = stomp_core::Session::new(transport, config(port));

    let (disconnect_tx, disconnect_rx) = oneshot::channel();
    session.connect(
        "user",
        "pass",
        None,
        Some(Box::new(move |r| {
            let _ = disconnect_tx.send(r);
        })),
    );
    assert_eq!(disconnect_rx.await.unwrap(), Ok(()));

    server.join().unwrap();
}
