use bytes::{Buf, Bytes};

use crate::error::Error;

/// Bounds-checked decoding from a packet payload.
///
/// Every implementation must check `buf.remaining()` before consuming any
/// byte: a short buffer is a malformed packet, never a panic.
pub(crate) trait SftpDecode: Sized {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error>;
}

impl SftpDecode for u8 {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        if buf.remaining() >= std::mem::size_of::<u8>() {
            Ok(buf.get_u8())
        } else {
            Err(Error::Protocol("truncated u8".into()))
        }
    }
}

impl SftpDecode for u32 {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        if buf.remaining() >= std::mem::size_of::<u32>() {
            Ok(buf.get_u32())
        } else {
            Err(Error::Protocol("truncated u32".into()))
        }
    }
}

impl SftpDecode for u64 {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        if buf.remaining() >= std::mem::size_of::<u64>() {
            Ok(buf.get_u64())
        } else {
            Err(Error::Protocol("truncated u64".into()))
        }
    }
}

/// Length-prefixed byte string. The length is validated against what
/// remains in the buffer before any bytes are copied out.
impl SftpDecode for Bytes {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        let length = u32::decode(buf)? as usize;
        if buf.remaining() >= length {
            Ok(buf.copy_to_bytes(length))
        } else {
            Err(Error::Protocol("string length exceeds remaining bytes".into()))
        }
    }
}

impl SftpDecode for String {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        let bytes = Bytes::decode(buf)?;
        String::from_utf8(bytes.into())
            .map_err(|e| Error::Protocol(format!("invalid UTF-8 string: {e}")))
    }
}
