//! Black-box decode/encode tests against the public API, complementing
//! the inline unit tests in `src/frame.rs`.

use stomp_core::{CodecError, CommandKind, Frame, HeaderKind};

#[test]
fn connect_frame_with_body_decodes() {
    let frame = Frame::decode(b"CONNECT\naccept-version:1.2\nhost:broker.example\n\nhello\0").unwrap();
    assert_eq!(frame.command(), CommandKind::Connect);
    assert_eq!(frame.header(HeaderKind::AcceptVersion), "1.2");
    assert_eq!(frame.body_str(), "hello");
}

#[test]
fn subscribe_frame_round_trips() {
    let frame = Frame::try_new(
        CommandKind::Subscribe,
        vec![
            (HeaderKind::Id, "abc123".to_string()),
            (HeaderKind::Destination, "/topic/passenger-flow".to_string()),
            (HeaderKind::Ack, "auto".to_string()),
            (HeaderKind::Receipt, "abc123".to_string()),
        ],
        Vec::new(),
    )
    .unwrap();

    let decoded = Frame::decode(&frame.encode()).unwrap();
    assert_eq!(decoded, frame);
    assert_eq!(decoded.header(HeaderKind::Destination), "/topic/passenger-flow");
}

#[test]
fn message_frame_with_subscription_header_decodes() {
    // Real brokers stamp MESSAGE frames with `subscription`, which is
    // outside the 13-token vocabulary the distillation named but is
    // still a recognized header here.
    let frame = Frame::decode(b"MESSAGE\nsubscription:0\nreceipt-id:X\ndestination:/d\n\nHello\0").unwrap();
    assert_eq!(frame.header(HeaderKind::Subscription), "0");
    assert_eq!(frame.header(HeaderKind::ReceiptId), "X");
}

#[test]
fn error_frame_with_message_header_decodes_without_handshake_headers() {
    // ERROR/RECEIPT/MESSAGE frames never need accept-version/host.
    let frame = Frame::decode(b"ERROR\ncontent-type:text/plain\n\nbad credentials\0").unwrap();
    assert_eq!(frame.command(), CommandKind::Error);
    assert_eq!(frame.body_str(), "bad credentials");
}

#[test]
fn wrong_content_length_never_yields_a_frame() {
    let err = Frame::decode(b"SEND\ndestination:/d\ncontent-length:100\n\nshort\0").unwrap_err();
    assert_eq!(err, CodecError::WrongContentLength);
}

#[test]
fn content_length_agreeing_with_body_decodes() {
    let frame = Frame::decode(b"SEND\ndestination:/d\ncontent-length:5\n\nhello\0").unwrap();
    assert_eq!(frame.body(), b"hello");
}
