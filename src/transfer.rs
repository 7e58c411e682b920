//! Windowed pipelining of `READ` or `WRITE` requests against one open
//! file handle.
//!
//! Grounded on the reference's `xfer_upload_*`/`xfer_download_*` family:
//! a download keeps the pipe full by queueing reads up to a byte budget
//! and draining completed ones in order off the head of the queue; an
//! upload lets the caller push writes as fast as the same budget allows
//! and reclaims queue slots as acknowledgements arrive, in whatever order
//! they arrive in.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::config::TransferConfig;
use crate::error::{Error, Result};
use crate::message::MessageType;
use crate::packet::{InPacket, OutPacket};
use crate::session::Session;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Complete {
    Pending,
    Success,
    Failed,
}

struct ReqSlot {
    id: u32,
    offset: u64,
    requested_len: u32,
    complete: Complete,
    data: Option<Bytes>,
}

/// A pipelined `READ` or `WRITE` stream over one already-open handle.
///
/// `Transfer` doesn't own a [`Transport`]; every method that needs to send
/// or receive takes the driving [`Session`] as an argument, so the two
/// queue/send/receive steps interleave exactly the way the embedder's
/// event loop calls them.
pub struct Transfer {
    direction: Direction,
    handle: Bytes,
    config: TransferConfig,
    queue: VecDeque<ReqSlot>,
    in_flight_bytes: u64,
    next_offset: u64,
    furthest_data: u64,
    believed_filesize: u64,
    eof: bool,
    err: Option<Error>,
}

impl Transfer {
    /// Start a pipelined download from `offset`, queueing nothing yet:
    /// call [`Transfer::queue_more`] to start filling the window.
    pub fn download(handle: Bytes, offset: u64, config: TransferConfig) -> Self {
        Self {
            direction: Direction::Download,
            handle,
            config,
            queue: VecDeque::new(),
            in_flight_bytes: 0,
            next_offset: offset,
            furthest_data: offset,
            believed_filesize: u64::MAX,
            eof: false,
            err: None,
        }
    }

    /// Start a pipelined upload at `offset`. Uploads never queue reads of
    /// their own, so `eof` starts set: it only ever means "no more writes
    /// will be queued by this engine", which for an upload is always true
    /// since the caller drives every write through [`Transfer::write`].
    pub fn upload(handle: Bytes, offset: u64, config: TransferConfig) -> Self {
        Self {
            direction: Direction::Upload,
            handle,
            config,
            queue: VecDeque::new(),
            in_flight_bytes: 0,
            next_offset: offset,
            furthest_data: offset,
            believed_filesize: u64::MAX,
            eof: true,
            err: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the engine has nothing left to do: it has seen EOF or an
    /// error, and every queued request has drained.
    pub fn done(&self) -> bool {
        (self.eof || self.err.is_some()) && self.queue.is_empty()
    }

    /// Whether a download may queue more reads, or an upload's caller may
    /// push another write, without exceeding the configured window.
    pub fn ready(&self) -> bool {
        !self.eof && self.err.is_none() && self.in_flight_bytes < self.config.window_bytes
    }

    fn push_request(&mut self, id: u32, offset: u64, requested_len: u32) {
        self.queue.push_back(ReqSlot {
            id,
            offset,
            requested_len,
            complete: Complete::Pending,
            data: None,
        });
        self.in_flight_bytes += requested_len as u64;
    }

    /// Queue reads until the window is full, `eof`, or an error has been
    /// observed. A no-op once the transfer is draining or done.
    pub async fn queue_more<T: Transport>(&mut self, session: &mut Session<T>) -> Result<()> {
        debug_assert_eq!(self.direction, Direction::Download);
        let mut queued = 0u32;
        while self.ready() {
            let chunk = self.config.chunk_bytes;
            let id = session.alloc_id(Some(self.queue.len()));

            let mut pkt = OutPacket::new(MessageType::Read as u8);
            pkt.put_u32(id).put_bytes(&self.handle).put_u64(self.next_offset).put_u32(chunk);
            session.send_raw(pkt).await?;

            self.push_request(id, self.next_offset, chunk);
            self.next_offset += chunk as u64;
            queued += 1;
        }
        if queued > 0 {
            debug!(queued, in_flight_bytes = self.in_flight_bytes, "queued download reads");
        }
        Ok(())
    }

    /// Queue one write of `data` at the current offset. The caller is
    /// responsible for polling [`Transfer::ready`] first; this never
    /// blocks on the window itself.
    pub async fn write<T: Transport>(&mut self, session: &mut Session<T>, data: &[u8]) -> Result<()> {
        debug_assert_eq!(self.direction, Direction::Upload);
        let id = session.alloc_id(Some(self.queue.len()));

        let mut pkt = OutPacket::new(MessageType::Write as u8);
        pkt.put_u32(id).put_bytes(&self.handle).put_u64(self.next_offset).put_bytes(data);
        session.send_raw(pkt).await?;

        self.push_request(id, self.next_offset, data.len() as u32);
        self.next_offset += data.len() as u64;
        Ok(())
    }

    /// Mark the upload finished: no more writes will be queued. Download
    /// transfers set this themselves once the server reports EOF.
    pub fn finish_upload(&mut self) {
        debug_assert_eq!(self.direction, Direction::Upload);
        self.eof = true;
    }

    fn slot_index_for(&self, id: u32) -> Option<usize> {
        self.queue.iter().position(|slot| slot.id == id)
    }

    /// Route one inbound packet to this transfer. Returns `Ok(false)` if
    /// the packet's request id isn't one of ours (it belongs to some
    /// other in-flight operation on the same session), in which case the
    /// caller should try routing it elsewhere.
    pub(crate) async fn on_packet<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        mut packet: InPacket,
    ) -> Result<bool> {
        let id = packet.get_u32()?;
        let Some(index) = self.slot_index_for(id) else {
            return Ok(false);
        };
        session.free_id(id);

        match self.direction {
            Direction::Download => self.on_download_reply(index, packet)?,
            Direction::Upload => self.on_upload_reply(index, packet),
        }
        Ok(true)
    }

    fn on_download_reply(&mut self, index: usize, mut packet: InPacket) -> Result<()> {
        if packet.kind == MessageType::Data as u8 {
            let data = packet.get_bytes()?;
            let offset = self.queue[index].offset;
            let requested = self.queue[index].requested_len;
            let rlen = data.len() as u32;

            if rlen > requested {
                return Err(Error::Protocol(format!(
                    "DATA reply carried {rlen} bytes for a read of {requested}"
                )));
            }

            self.furthest_data = self.furthest_data.max(offset);
            if rlen < requested {
                let implied_filesize = offset + rlen as u64;
                self.believed_filesize = self.believed_filesize.min(implied_filesize);
            }

            let slot = &mut self.queue[index];
            slot.complete = Complete::Success;
            slot.data = Some(data);

            if self.furthest_data > self.believed_filesize {
                error!(
                    furthest_data = self.furthest_data,
                    believed_filesize = self.believed_filesize,
                    "short read arrived that was not at end of file"
                );
                self.err = Some(Error::ShortBufferNotAtEof);
                return Err(Error::ShortBufferNotAtEof);
            }
            if rlen == 0 {
                debug!(offset, "download reached EOF (zero-length DATA)");
                self.eof = true;
            }
        } else if packet.kind == MessageType::Status as u8 {
            let code = packet.get_u32()?;
            let slot = &mut self.queue[index];
            slot.complete = Complete::Failed;

            if code == 1 {
                debug!(offset = slot.offset, "download reached EOF (SSH_FX_EOF)");
                self.eof = true;
            } else {
                let message = crate::message::StatusCode::description_for_code(code);
                warn!(code, message, "download read failed");
                let err = Error::Status { code, message };
                self.err = Some(Error::Status { code, message });
                return Err(err);
            }
        } else {
            return Err(Error::Protocol(format!(
                "expected DATA or STATUS for a pending read, got type {}",
                packet.kind
            )));
        }
        Ok(())
    }

    fn on_upload_reply(&mut self, index: usize, mut packet: InPacket) {
        let result = if packet.kind == MessageType::Status as u8 {
            match packet.get_u32() {
                Ok(0) => Ok(()),
                Ok(code) => {
                    let message = crate::message::StatusCode::description_for_code(code);
                    warn!(code, message, "upload write failed");
                    Err(Error::Status { code, message })
                }
                Err(e) => Err(e),
            }
        } else {
            Err(Error::Protocol(format!("expected STATUS for a pending write, got type {}", packet.kind)))
        };

        let requested_len = self.queue[index].requested_len as u64;
        if let Err(err) = result {
            self.queue[index].complete = Complete::Failed;
            self.err = Some(err);
        } else {
            self.queue[index].complete = Complete::Success;
        }

        // Upload acks remove their req from any position, not just the
        // head: drop it now rather than waiting for pull_data to walk by.
        self.queue.remove(index);
        self.in_flight_bytes = self.in_flight_bytes.saturating_sub(requested_len);
    }

    /// Deliver the next run of completed downloaded buffers: pops
    /// completed entries off the head of the queue, stopping at the
    /// first still-pending one, and hands back the first successful
    /// buffer found (failed entries are silently discarded, since their
    /// failure already set `eof`/`err`).
    pub fn pull_data(&mut self) -> Option<Bytes> {
        debug_assert_eq!(self.direction, Direction::Download);
        while let Some(front) = self.queue.front() {
            if front.complete == Complete::Pending {
                return None;
            }
            let slot = self.queue.pop_front().expect("front just matched Some");
            self.in_flight_bytes = self.in_flight_bytes.saturating_sub(slot.requested_len as u64);
            if slot.complete == Complete::Success {
                return slot.data;
            }
        }
        None
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Receive the next reply off `session`'s transport and route it to
    /// this transfer. The usual driving loop is: call [`Transfer::queue_more`]
    /// (download) or [`Transfer::write`] (upload) while [`Transfer::ready`],
    /// then call `step` until a buffer is available from
    /// [`Transfer::pull_data`] or [`Transfer::done`] becomes true.
    pub async fn step<T: Transport>(&mut self, session: &mut Session<T>) -> Result<()> {
        let packet = session.recv_raw().await?;
        self.on_packet(session, packet).await?;
        Ok(())
    }
}
