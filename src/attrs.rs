//! The `ATTRS` record shared by `OPEN`, `STAT`/`FSTAT`, `SETSTAT`/`FSETSTAT`
//! and `NAME` replies.

use bytes::Buf;

use crate::decode::SftpDecode;
use crate::encode::SftpEncode;
use crate::error::Error;

const SIZE: u32 = 0x0000_0001;
const UIDGID: u32 = 0x0000_0002;
const PERMISSIONS: u32 = 0x0000_0004;
const ACMODTIME: u32 = 0x0000_0008;
const EXTENDED: u32 = 0x8000_0000;

/// Owner/group pair, present iff the `UIDGID` flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

/// Access/modify timestamps, present iff the `ACMODTIME` flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileTime {
    pub atime: u32,
    pub mtime: u32,
}

/// File attributes as carried on the wire. Each field is independently
/// optional; absence is meaningful (the server didn't report it, or the
/// caller doesn't want to change it in a `SETSTAT`).
///
/// Extended attribute pairs are read off the wire so decoding doesn't run
/// off the end of the packet, then discarded: nothing in this crate
/// interprets them, and `FileAttrs` never re-sends what it didn't itself
/// set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileAttrs {
    pub size: Option<u64>,
    pub owner: Option<FileOwner>,
    pub permissions: Option<u32>,
    pub time: Option<FileTime>,
}

impl FileAttrs {
    pub fn with_size(size: u64) -> Self {
        Self { size: Some(size), ..Default::default() }
    }

    pub fn with_permissions(permissions: u32) -> Self {
        Self { permissions: Some(permissions), ..Default::default() }
    }

    fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.size.is_some() {
            flags |= SIZE;
        }
        if self.owner.is_some() {
            flags |= UIDGID;
        }
        if self.permissions.is_some() {
            flags |= PERMISSIONS;
        }
        if self.time.is_some() {
            flags |= ACMODTIME;
        }
        flags
    }
}

impl SftpEncode for FileAttrs {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        self.flags().encode(buf);
        if let Some(size) = self.size {
            size.encode(buf);
        }
        if let Some(owner) = self.owner {
            owner.uid.encode(buf);
            owner.gid.encode(buf);
        }
        if let Some(permissions) = self.permissions {
            permissions.encode(buf);
        }
        if let Some(time) = self.time {
            time.atime.encode(buf);
            time.mtime.encode(buf);
        }
        // EXTENDED is never set by us, so no extended pairs follow.
    }
}

impl SftpDecode for FileAttrs {
    fn decode(buf: &mut dyn Buf) -> Result<Self, Error> {
        let flags = u32::decode(buf)?;

        let size = if flags & SIZE != 0 { Some(u64::decode(buf)?) } else { None };

        let owner = if flags & UIDGID != 0 {
            let uid = u32::decode(buf)?;
            let gid = u32::decode(buf)?;
            Some(FileOwner { uid, gid })
        } else {
            None
        };

        let permissions = if flags & PERMISSIONS != 0 { Some(u32::decode(buf)?) } else { None };

        let time = if flags & ACMODTIME != 0 {
            let atime = u32::decode(buf)?;
            let mtime = u32::decode(buf)?;
            Some(FileTime { atime, mtime })
        } else {
            None
        };

        if flags & EXTENDED != 0 {
            let count = u32::decode(buf)?;
            for _ in 0..count {
                let _type = bytes::Bytes::decode(buf)?;
                let _data = bytes::Bytes::decode(buf)?;
            }
        }

        Ok(Self { size, owner, permissions, time })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn round_trips_full_attrs() {
        let attrs = FileAttrs {
            size: Some(42),
            owner: Some(FileOwner { uid: 1, gid: 2 }),
            permissions: Some(0o644),
            time: Some(FileTime { atime: 10, mtime: 20 }),
        };
        let mut buf = BytesMut::new();
        attrs.encode(&mut buf);

        let mut cursor = buf.freeze();
        let decoded = FileAttrs::decode(&mut cursor).unwrap();
        assert_eq!(decoded, attrs);
    }

    #[test]
    fn empty_attrs_round_trip_to_all_none() {
        let attrs = FileAttrs::default();
        let mut buf = BytesMut::new();
        attrs.encode(&mut buf);
        assert_eq!(buf.len(), 4); // just the flags word

        let mut cursor = buf.freeze();
        assert_eq!(FileAttrs::decode(&mut cursor).unwrap(), attrs);
    }

    #[test]
    fn extended_pairs_are_consumed_but_not_retained() {
        let mut buf = BytesMut::new();
        EXTENDED.encode(&mut buf);
        1u32.encode(&mut buf); // one extended pair
        "foo".encode(&mut buf);
        "bar".encode(&mut buf);

        let mut cursor = buf.freeze();
        let decoded = FileAttrs::decode(&mut cursor).unwrap();
        assert_eq!(decoded, FileAttrs::default());
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn truncated_attrs_is_a_protocol_error() {
        let mut buf = BytesMut::new();
        SIZE.encode(&mut buf); // claims a size field follows, but it doesn't
        let mut cursor = buf.freeze();
        assert!(FileAttrs::decode(&mut cursor).is_err());
    }
}
