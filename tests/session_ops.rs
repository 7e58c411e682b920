mod common;

use common::{wire_string, wire_u32, ScriptedTransport};
use sftp3_core::Session;

fn name_entry(filename: &str, long_name: &str) -> Vec<u8> {
    let mut out = wire_string(filename);
    out.extend(wire_string(long_name));
    out.extend(wire_u32(0)); // empty attr flags
    out
}

fn bytes_from(s: &str) -> bytes::Bytes {
    bytes::Bytes::copy_from_slice(s.as_bytes())
}

#[tokio::test]
async fn realpath_resolves_dot_to_a_single_name() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3)); // VERSION

    // First allocated request id after a fresh handshake is always 256.
    let mut payload = wire_u32(256);
    payload.extend(wire_u32(1)); // one name
    payload.extend(name_entry("/home/user", "drwxr-xr-x 2 user user /home/user"));
    transport.push_frame(104, &payload); // NAME

    let mut session = Session::handshake(transport).await.unwrap();
    let name = session.realpath(".").await.unwrap();
    assert_eq!(name.filename, "/home/user");
}

#[tokio::test]
async fn realpath_with_more_than_one_name_is_a_protocol_error() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3));

    let mut payload = wire_u32(256);
    payload.extend(wire_u32(2)); // two names, which REALPATH never returns
    payload.extend(name_entry("/a", "a"));
    payload.extend(name_entry("/b", "b"));
    transport.push_frame(104, &payload);

    let mut session = Session::handshake(transport).await.unwrap();
    let err = session.realpath(".").await.unwrap_err();
    assert!(matches!(err, sftp3_core::Error::Protocol(_)));
}

#[tokio::test]
async fn remove_success_is_signalled_by_status_ok() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3));

    let mut payload = wire_u32(256);
    payload.extend(wire_u32(0)); // SSH_FX_OK
    transport.push_frame(101, &payload); // STATUS

    let mut session = Session::handshake(transport).await.unwrap();
    session.remove("/tmp/gone").await.unwrap();
}

#[tokio::test]
async fn remove_failure_maps_status_code_into_the_error() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3));

    let mut payload = wire_u32(256);
    payload.extend(wire_u32(2)); // SSH_FX_NO_SUCH_FILE
    payload.extend(wire_string("no such file"));
    payload.extend(wire_string("en"));
    transport.push_frame(101, &payload);

    let mut session = Session::handshake(transport).await.unwrap();
    let err = session.remove("/tmp/missing").await.unwrap_err();
    assert_eq!(err.status_code(), 2);
    assert_eq!(session.last_error_kind(), 2);
}

#[tokio::test]
async fn readdir_with_bad_reply_type_is_a_protocol_error() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3));

    // A HANDLE reply where NAME or STATUS was expected.
    let mut payload = wire_u32(256);
    payload.extend(wire_string("not-a-name-or-status"));
    transport.push_frame(102, &payload);

    let mut session = Session::handshake(transport).await.unwrap();
    let handle = bytes_from("handle");
    let err = session.readdir(&handle).await.unwrap_err();
    assert!(matches!(err, sftp3_core::Error::Protocol(_)));
}

#[tokio::test]
async fn open_then_close_round_trips_a_handle() {
    let mut transport = ScriptedTransport::new();
    transport.push_frame(2, &wire_u32(3));

    let mut open_payload = wire_u32(256);
    open_payload.extend(wire_string("file-handle-1"));
    transport.push_frame(102, &open_payload); // HANDLE

    let mut close_payload = wire_u32(257);
    close_payload.extend(wire_u32(0));
    transport.push_frame(101, &close_payload); // STATUS OK

    let mut session = Session::handshake(transport).await.unwrap();
    let handle = session
        .open("/tmp/f", sftp3_core::OpenFlags::READ, &sftp3_core::FileAttrs::default())
        .await
        .unwrap();
    assert_eq!(&handle[..], b"file-handle-1");
    session.close(&handle).await.unwrap();
}
