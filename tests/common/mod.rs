//! Shared test double for the integration suite: a `Transport` backed by
//! plain in-memory byte queues, in the same spirit as the crate's own
//! internal mock rather than a mocking framework.

use std::collections::VecDeque;

use async_trait::async_trait;
use sftp3_core::Transport;

pub struct ScriptedTransport {
    sent: VecDeque<u8>,
    inbound: VecDeque<u8>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self { sent: VecDeque::new(), inbound: VecDeque::new() }
    }

    /// Append one pre-framed `u32 length || type || payload` reply to the
    /// inbound queue.
    pub fn push_frame(&mut self, kind: u8, payload: &[u8]) {
        let length = (payload.len() + 1) as u32;
        self.inbound.extend(length.to_be_bytes());
        self.inbound.push_back(kind);
        self.inbound.extend(payload.iter().copied());
    }

    /// Pop the next frame this transport was asked to send, parsed back
    /// into (kind, payload) so a test can assert on what the engine
    /// actually transmitted.
    pub fn take_sent_frame(&mut self) -> Option<(u8, Vec<u8>)> {
        if self.sent.len() < 4 {
            return None;
        }
        let len_bytes: Vec<u8> = self.sent.drain(..4).collect();
        let length = u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize;
        if self.sent.len() < length {
            return None;
        }
        let frame: Vec<u8> = self.sent.drain(..length).collect();
        let kind = frame[0];
        let payload = frame[1..].to_vec();
        Some((kind, payload))
    }

    pub fn has_pending_sent(&self) -> bool {
        !self.sent.is_empty()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.sent.extend(bytes.iter().copied());
        Ok(())
    }

    async fn recv_exact_bytes(&mut self, out: &mut [u8]) -> std::io::Result<()> {
        if self.inbound.len() < out.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "scripted transport ran out of inbound bytes",
            ));
        }
        for slot in out.iter_mut() {
            *slot = self.inbound.pop_front().unwrap();
        }
        Ok(())
    }
}

/// Build a `u32`-length-prefixed string as it appears on the wire.
pub fn wire_string(s: &str) -> Vec<u8> {
    let mut out = (s.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    out
}

pub fn wire_u32(v: u32) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}
