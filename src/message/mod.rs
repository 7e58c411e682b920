//! Wire tags and data-carrying payload types shared across operations.
//!
//! Per-operation request/reply framing lives in [`crate::session`]; this
//! module holds the pieces more than one operation needs: the protocol
//! version constant, the `pflags` bits for `OPEN`, the status code table,
//! and the `NAME` reply's element type.

use bytes::Buf;

use crate::attrs::FileAttrs;
use crate::decode::SftpDecode;
use crate::error::Error;

/// The only protocol version this crate speaks.
pub const SFTP_PROTO_VERSION: u32 = 3;

/// Wire type tags, grounded on the protocol's packet-type table.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessageType {
    Init = 1,
    Version = 2,
    Open = 3,
    Close = 4,
    Read = 5,
    Write = 6,
    FStat = 8,
    SetStat = 9,
    FSetStat = 10,
    OpenDir = 11,
    ReadDir = 12,
    Remove = 13,
    MkDir = 14,
    RmDir = 15,
    RealPath = 16,
    Stat = 17,
    Rename = 18,
    Status = 101,
    Handle = 102,
    Data = 103,
    Name = 104,
    Attrs = 105,
}

/// `pflags` bits accepted by `SSH_FXP_OPEN`. The codec passes this word
/// through verbatim; it never interprets it itself.
#[non_exhaustive]
pub struct OpenFlags;

impl OpenFlags {
    pub const READ: u32 = 0x0000_0001;
    pub const WRITE: u32 = 0x0000_0002;
    pub const APPEND: u32 = 0x0000_0004;
    pub const CREATE: u32 = 0x0000_0008;
    pub const TRUNCATE: u32 = 0x0000_0010;
    pub const EXCLUDE: u32 = 0x0000_0020;
}

/// `SSH_FXP_STATUS` result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 0,
    Eof = 1,
    NoSuchFile = 2,
    PermissionDenied = 3,
    Failure = 4,
    BadMessage = 5,
    NoConnection = 6,
    ConnectionLost = 7,
    OpUnsupported = 8,
}

impl StatusCode {
    /// Maps a raw status code to its variant, or `None` if it falls
    /// outside the `0..=8` range the protocol defines.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Eof),
            2 => Some(Self::NoSuchFile),
            3 => Some(Self::PermissionDenied),
            4 => Some(Self::Failure),
            5 => Some(Self::BadMessage),
            6 => Some(Self::NoConnection),
            7 => Some(Self::ConnectionLost),
            8 => Some(Self::OpUnsupported),
            _ => None,
        }
    }

    /// A short, stable description, used when the server's own error text
    /// is empty or untrustworthy.
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Eof => "end of file",
            Self::NoSuchFile => "no such file",
            Self::PermissionDenied => "permission denied",
            Self::Failure => "failure",
            Self::BadMessage => "bad message",
            Self::NoConnection => "no connection",
            Self::ConnectionLost => "connection lost",
            Self::OpUnsupported => "operation unsupported",
        }
    }

    pub fn description_for_code(code: u32) -> &'static str {
        match Self::from_code(code) {
            Some(status) => status.description(),
            None => "unknown error code",
        }
    }
}

/// One entry of an `SSH_FXP_NAME` reply (used by both `REALPATH`, which
/// always returns exactly one, and `READDIR`, which returns as many as
/// fit in the reply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleName {
    pub filename: String,
    pub long_name: String,
    pub attrs: FileAttrs,
}

impl SftpDecode for SingleName {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        let filename = String::decode(buf)?;
        let long_name = String::decode(buf)?;
        let attrs = FileAttrs::decode(buf)?;
        Ok(Self { filename, long_name, attrs })
    }
}

/// A full `SSH_FXP_NAME` reply.
pub type Name = Vec<SingleName>;

/// Smallest possible `SingleName` on the wire: three empty length-prefixed
/// fields (filename, long name, zero attr flags) at 4 bytes each.
const MIN_SINGLE_NAME_LEN: usize = 12;

pub(crate) fn decode_name(buf: &mut dyn Buf) -> Result<Name, Error> {
    let count = u32::decode(buf)?;
    if count as usize > buf.remaining() / MIN_SINGLE_NAME_LEN {
        return Err(Error::Protocol("malformed FXP_NAME packet".into()));
    }
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        names.push(SingleName::decode(buf)?);
    }
    Ok(names)
}

/// A `VERSION` reply extension pair. No extensions are recognised or
/// negotiated; these are parsed only so the handshake doesn't choke on a
/// server that advertises some.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    pub data: String,
}
