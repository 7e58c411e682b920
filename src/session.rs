//! Protocol primitives: one send/recv pair per SFTP operation.
//!
//! A [`Session`] owns the transport and the request registry and drives
//! both operations synchronously — one request out, its matching reply
//! in — except for `READ`/`WRITE`, which [`crate::transfer::Transfer`]
//! pipelines on top of the same `send_raw`/`recv_raw` primitives this
//! module exposes to it.
//!
//! Grounded on the reference's `fxp_*_send`/`fxp_*_recv` function pairs:
//! `fxp_realpath_send`/`_recv`, `fxp_open_send`/`_recv`,
//! `fxp_close_send`/`_recv`, `fxp_mkdir_send`/`_recv`, and so on, each of
//! which allocates a request id, writes one packet, and parses exactly
//! the reply types that operation can produce.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::attrs::FileAttrs;
use crate::error::{Error, Result};
use crate::message::{self, MessageType, Name, SFTP_PROTO_VERSION};
use crate::packet::{InPacket, OutPacket};
use crate::registry::{Registry, Request};
use crate::transport::Transport;

/// A negotiated SFTP connection: transport plus the request-id registry
/// needed to keep pipelined requests apart.
pub struct Session<T: Transport> {
    transport: T,
    registry: Registry,
    server_version: u32,
    last_error: Option<Error>,
}

impl<T: Transport> Session<T> {
    /// Perform the `INIT`/`VERSION` handshake and return a ready session.
    ///
    /// Success requires `server_version <= SFTP_PROTO_VERSION`; any
    /// extension pairs the server advertises are parsed, logged, and
    /// otherwise ignored, since this crate negotiates no extensions.
    pub async fn handshake(mut transport: T) -> Result<Self> {
        let mut init = OutPacket::new(MessageType::Init as u8);
        init.put_u32(SFTP_PROTO_VERSION);
        init.send(&mut transport).await?;

        let mut reply = InPacket::recv(&mut transport).await?;
        if reply.kind != MessageType::Version as u8 {
            return Err(Error::Protocol(format!(
                "expected VERSION during handshake, got type {}",
                reply.kind
            )));
        }

        let server_version = reply.get_u32()?;
        if server_version > SFTP_PROTO_VERSION {
            return Err(Error::Protocol(format!(
                "server speaks SFTP version {server_version}, which is newer than the {SFTP_PROTO_VERSION} this client supports"
            )));
        }

        while reply.remaining() > 0 {
            let name = reply.get_string()?;
            let data = reply.get_string()?;
            debug!(extension = %name, %data, "server advertised an extension; ignoring");
        }

        debug!(server_version, "SFTP handshake complete");
        Ok(Self { transport, registry: Registry::new(), server_version, last_error: None })
    }

    pub fn server_version(&self) -> u32 {
        self.server_version
    }

    /// The most recent error this session observed, mirroring the
    /// reference's process-wide `error()`/`error_type()` but kept as
    /// ordinary per-session state instead of statics.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// `last_error()`'s status code, or `-1` if there has been none, or
    /// the last error wasn't a `STATUS` reply.
    pub fn last_error_kind(&self) -> i32 {
        self.last_error.as_ref().map_or(-1, Error::status_code)
    }

    fn record_error(&mut self, err: Error) -> Error {
        warn!(error = %err, "recording session error");
        self.last_error = Some(match &err {
            Error::Status { code, message } => Error::Status { code: *code, message },
            Error::Protocol(msg) => Error::Protocol(msg.clone()),
            Error::ShortBufferNotAtEof => Error::ShortBufferNotAtEof,
            Error::Internal(msg) => Error::Internal(msg.clone()),
            Error::Io(io_err) => Error::Internal(io_err.to_string()),
        });
        err
    }

    // -- low-level primitives shared with Transfer --------------------

    pub(crate) fn alloc_id(&mut self, userdata: Option<usize>) -> u32 {
        self.registry.alloc(userdata)
    }

    pub(crate) fn free_id(&mut self, id: u32) -> Option<Request> {
        self.registry.remove(id)
    }

    pub(crate) async fn send_raw(&mut self, pkt: OutPacket) -> Result<()> {
        pkt.send(&mut self.transport).await
    }

    pub(crate) async fn recv_raw(&mut self) -> Result<InPacket> {
        InPacket::recv(&mut self.transport).await
    }

    /// Send one request and wait for its single, matching reply. Used by
    /// every operation below; `Transfer` bypasses this and drives
    /// `send_raw`/`recv_raw` itself so several requests can be in flight
    /// together.
    async fn roundtrip(&mut self, pkt_kind: u8, build: impl FnOnce(&mut OutPacket)) -> Result<InPacket> {
        let id = self.registry.alloc(None);
        let mut pkt = OutPacket::new(pkt_kind);
        pkt.put_u32(id);
        build(&mut pkt);
        self.send_raw(pkt).await?;

        let reply = self.recv_raw().await?;
        let mut reply = reply;
        let reply_id = reply.get_u32()?;
        self.registry.remove(id);

        if reply_id != id {
            let err = Error::Protocol(format!(
                "reply id {reply_id} does not match requested id {id}"
            ));
            return Err(self.record_error(err));
        }
        Ok(reply)
    }

    /// For operations with no data reply: the reply must be `STATUS`;
    /// success iff the code is `SSH_FX_OK`.
    async fn finish_status(&mut self, reply: InPacket) -> Result<()> {
        if reply.kind != MessageType::Status as u8 {
            let err = Error::Protocol(format!("expected STATUS, got type {}", reply.kind));
            return Err(self.record_error(err));
        }
        let mut reply = reply;
        let code = reply.get_u32()?;
        if code == 0 {
            Ok(())
        } else {
            let server_message = reply.get_string().unwrap_or_default();
            let message = message::StatusCode::description_for_code(code);
            if !server_message.is_empty() {
                warn!(code, server_message = %server_message, "server returned SSH_FX_STATUS");
            }
            Err(self.record_error(Error::Status { code, message }))
        }
    }

    fn finish_data<F, R>(&mut self, reply: InPacket, expected: MessageType, decode: F) -> Result<R>
    where
        F: FnOnce(&mut InPacket) -> Result<R>,
    {
        let mut reply = reply;
        if reply.kind == expected as u8 {
            decode(&mut reply)
        } else if reply.kind == MessageType::Status as u8 {
            let code = reply.get_u32()?;
            let server_message = reply.get_string().unwrap_or_default();
            let message = message::StatusCode::description_for_code(code);
            if !server_message.is_empty() {
                warn!(code, server_message = %server_message, "server returned SSH_FX_STATUS");
            }
            Err(self.record_error(Error::Status { code, message }))
        } else {
            let err = Error::Protocol(format!(
                "expected {} or STATUS, got type {}",
                expected as u8, reply.kind
            ));
            Err(self.record_error(err))
        }
    }

    // -- operations -----------------------------------------------------

    /// Resolve `path` to its canonical form. A `REALPATH` reply must carry
    /// exactly one name; any other count is a protocol error.
    pub async fn realpath(&mut self, path: &str) -> Result<message::SingleName> {
        let reply = self
            .roundtrip(MessageType::RealPath as u8, |pkt| {
                pkt.put_str(path);
            })
            .await?;
        let mut names = self.finish_data(reply, MessageType::Name, |r| r.get_name())?;
        if names.len() != 1 {
            let err = Error::Protocol(format!(
                "REALPATH reply must contain exactly one name, got {}",
                names.len()
            ));
            return Err(self.record_error(err));
        }
        Ok(names.remove(0))
    }

    pub async fn open(&mut self, filename: &str, pflags: u32, attrs: &FileAttrs) -> Result<Bytes> {
        let reply = self
            .roundtrip(MessageType::Open as u8, |pkt| {
                pkt.put_str(filename).put_u32(pflags).put_attrs(attrs);
            })
            .await?;
        self.finish_data(reply, MessageType::Handle, |r| r.get_bytes())
    }

    pub async fn opendir(&mut self, path: &str) -> Result<Bytes> {
        let reply = self
            .roundtrip(MessageType::OpenDir as u8, |pkt| {
                pkt.put_str(path);
            })
            .await?;
        self.finish_data(reply, MessageType::Handle, |r| r.get_bytes())
    }

    pub async fn close(&mut self, handle: &Bytes) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::Close as u8, |pkt| {
                pkt.put_bytes(handle);
            })
            .await?;
        self.finish_status(reply).await
    }

    /// List one batch of directory entries. Returns `Ok(Vec::new())`-like
    /// callers should not expect: end of listing is signalled by an
    /// `Err(Error::Status { code: 1, .. })` (`SSH_FX_EOF`), matching
    /// `Error::status_code() == 1`.
    pub async fn readdir(&mut self, handle: &Bytes) -> Result<Name> {
        let reply = self
            .roundtrip(MessageType::ReadDir as u8, |pkt| {
                pkt.put_bytes(handle);
            })
            .await?;
        self.finish_data(reply, MessageType::Name, |r| r.get_name())
    }

    pub async fn remove(&mut self, path: &str) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::Remove as u8, |pkt| {
                pkt.put_str(path);
            })
            .await?;
        self.finish_status(reply).await
    }

    pub async fn mkdir(&mut self, path: &str, attrs: &FileAttrs) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::MkDir as u8, |pkt| {
                pkt.put_str(path).put_attrs(attrs);
            })
            .await?;
        self.finish_status(reply).await
    }

    pub async fn rmdir(&mut self, path: &str) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::RmDir as u8, |pkt| {
                pkt.put_str(path);
            })
            .await?;
        self.finish_status(reply).await
    }

    pub async fn rename(&mut self, old_path: &str, new_path: &str) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::Rename as u8, |pkt| {
                pkt.put_str(old_path).put_str(new_path);
            })
            .await?;
        self.finish_status(reply).await
    }

    pub async fn stat(&mut self, path: &str) -> Result<FileAttrs> {
        let reply = self
            .roundtrip(MessageType::Stat as u8, |pkt| {
                pkt.put_str(path);
            })
            .await?;
        self.finish_data(reply, MessageType::Attrs, |r| r.get_attrs())
    }

    pub async fn fstat(&mut self, handle: &Bytes) -> Result<FileAttrs> {
        let reply = self
            .roundtrip(MessageType::FStat as u8, |pkt| {
                pkt.put_bytes(handle);
            })
            .await?;
        self.finish_data(reply, MessageType::Attrs, |r| r.get_attrs())
    }

    pub async fn setstat(&mut self, path: &str, attrs: &FileAttrs) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::SetStat as u8, |pkt| {
                pkt.put_str(path).put_attrs(attrs);
            })
            .await?;
        self.finish_status(reply).await
    }

    pub async fn fsetstat(&mut self, handle: &Bytes, attrs: &FileAttrs) -> Result<()> {
        let reply = self
            .roundtrip(MessageType::FSetStat as u8, |pkt| {
                pkt.put_bytes(handle).put_attrs(attrs);
            })
            .await?;
        self.finish_status(reply).await
    }
}
