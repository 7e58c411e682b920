//! Packet framing and the outbound/inbound cursors built on top of it.
//!
//! Wire frame: `u32 length || u8 type || payload`, big-endian, where
//! `length` counts `type + payload`. [`OutPacket`] accumulates a payload
//! being built; [`InPacket`] is the decoded, bounds-checked mirror.

use bytes::{Buf, Bytes, BytesMut};

use crate::attrs::FileAttrs;
use crate::decode::SftpDecode;
use crate::encode::SftpEncode;
use crate::error::{Error, Result};
use crate::message::{decode_name, Name};
use crate::transport::Transport;

/// An outbound packet under construction.
///
/// `begin_string`/`end_string` mirror the reference's
/// `sftp_pkt_addstring_start`/`sftp_pkt_addstring_str`: a string's length
/// prefix is reserved up front and patched once the bytes that follow are
/// known, rather than requiring the caller to measure ahead of time.
pub(crate) struct OutPacket {
    buf: BytesMut,
}

impl OutPacket {
    pub fn new(kind: u8) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        kind.encode(&mut buf);
        Self { buf }
    }

    pub fn put_u8(&mut self, v: u8) -> &mut Self {
        v.encode(&mut self.buf);
        self
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        v.encode(&mut self.buf);
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        v.encode(&mut self.buf);
        self
    }

    pub fn put_bytes(&mut self, v: &[u8]) -> &mut Self {
        v.encode(&mut self.buf);
        self
    }

    pub fn put_str(&mut self, v: &str) -> &mut Self {
        v.encode(&mut self.buf);
        self
    }

    pub fn put_attrs(&mut self, attrs: &FileAttrs) -> &mut Self {
        attrs.encode(&mut self.buf);
        self
    }

    /// Reserve the 4-byte length prefix of a string and remember where its
    /// body starts.
    pub fn begin_string(&mut self) -> usize {
        self.buf.put_u32(0);
        self.buf.len()
    }

    /// Patch the length reserved by `begin_string` to cover everything
    /// appended since.
    pub fn end_string(&mut self, mark: usize) {
        let len = (self.buf.len() - mark) as u32;
        self.buf[mark - 4..mark].copy_from_slice(&len.to_be_bytes());
    }

    /// Append a string using the deferred-length mechanism end to end.
    pub fn put_deferred_str(&mut self, v: &[u8]) -> &mut Self {
        let mark = self.begin_string();
        self.buf.extend_from_slice(v);
        self.end_string(mark);
        self
    }

    /// Frame and send this packet: `u32 length || type || payload`.
    pub async fn send(self, transport: &mut dyn Transport) -> Result<()> {
        let length = self.buf.len() as u32;
        transport.send_bytes(&length.to_be_bytes()).await?;
        transport.send_bytes(&self.buf).await?;
        Ok(())
    }
}

/// A decoded inbound packet: the type tag plus a cursor over its payload.
pub(crate) struct InPacket {
    pub kind: u8,
    body: Bytes,
}

impl InPacket {
    /// Read one frame off the transport: 4-byte length, then that many
    /// bytes, with the leading type byte split off into `kind`.
    pub async fn recv(transport: &mut dyn Transport) -> Result<Self> {
        let mut len_buf = [0u8; 4];
        transport.recv_exact_bytes(&mut len_buf).await?;
        let length = u32::from_be_bytes(len_buf) as usize;

        let mut payload = vec![0u8; length];
        transport.recv_exact_bytes(&mut payload).await?;

        let mut body = Bytes::from(payload);
        if body.is_empty() {
            return Err(Error::Protocol("empty frame, missing type byte".into()));
        }
        let kind = body.get_u8();
        Ok(Self { kind, body })
    }

    pub fn remaining(&self) -> usize {
        self.body.remaining()
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        u8::decode(&mut self.body)
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        u32::decode(&mut self.body)
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        u64::decode(&mut self.body)
    }

    pub fn get_bytes(&mut self) -> Result<Bytes> {
        Bytes::decode(&mut self.body)
    }

    pub fn get_string(&mut self) -> Result<String> {
        String::decode(&mut self.body)
    }

    pub fn get_attrs(&mut self) -> Result<FileAttrs> {
        FileAttrs::decode(&mut self.body)
    }

    pub fn get_name(&mut self) -> Result<Name> {
        decode_name(&mut self.body)
    }
}
