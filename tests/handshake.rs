mod common;

use common::{wire_string, wire_u32, ScriptedTransport};
use sftp3_core::Session;

#[tokio::test]
async fn handshake_succeeds_on_matching_version() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3));

    let session = Session::handshake(transport).await.unwrap();
    assert_eq!(session.server_version(), 3);
}

#[tokio::test]
async fn handshake_ignores_trailing_extension_pairs() {
    let mut transport = ScriptedTransport::new();
    let mut payload = wire_u32(3);
    payload.extend(wire_string("posix-rename@openssh.com"));
    payload.extend(wire_string("1"));
    transport.push_frame(2, &payload);

    let session = Session::handshake(transport).await.unwrap();
    assert_eq!(session.server_version(), 3);
}

#[tokio::test]
async fn handshake_rejects_a_newer_server_version() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(4));

    assert!(Session::handshake(transport).await.is_err());
}

#[tokio::test]
async fn handshake_rejects_an_unexpected_reply_type() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(101, &wire_u32(4)); // STATUS instead of VERSION

    assert!(Session::handshake(transport).await.is_err());
}
