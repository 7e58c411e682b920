use bytes::BufMut;

/// Encoding onto a packet payload.
///
/// Unlike decoding, encoding into our always-growable [`bytes::BytesMut`]
/// buffers cannot fail, so (unlike the reference implementation and unlike
/// [`crate::decode::SftpDecode`]) this isn't fallible.
pub(crate) trait SftpEncode {
    fn encode(&self, buf: &mut dyn BufMut);
}

impl SftpEncode for u8 {
    fn encode(&self, buf: &mut dyn BufMut) {
        buf.put_u8(*self);
    }
}

impl SftpEncode for u32 {
    fn encode(&self, buf: &mut dyn BufMut) {
        buf.put_u32(*self);
    }
}

impl SftpEncode for u64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        buf.put_u64(*self);
    }
}

impl SftpEncode for [u8] {
    fn encode(&self, buf: &mut dyn BufMut) {
        (self.len() as u32).encode(buf);
        buf.put_slice(self);
    }
}

impl SftpEncode for str {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf);
    }
}

impl SftpEncode for String {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_str().encode(buf);
    }
}

impl SftpEncode for bytes::Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf);
    }
}
