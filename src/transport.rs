//! The byte-stream boundary this crate drives, rather than owns.
//!
//! Mirrors the reference terraform provider's `Connection` trait: a thin
//! `async_trait` seam so the embedder can plug in an SSH subsystem channel
//! (or, in tests, an in-memory byte pipe) without this crate knowing
//! anything about how the channel was established.

use async_trait::async_trait;

/// A raw, already-authenticated duplex byte stream carrying one SFTP
/// subsystem session.
///
/// Implementations are not expected to buffer: `send_bytes` should write
/// everything given to it, and `recv_exact_bytes` should block until the
/// output slice is completely filled or the stream ends.
#[async_trait]
pub trait Transport: Send {
    async fn send_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    async fn recv_exact_bytes(&mut self, out: &mut [u8]) -> std::io::Result<()>;
}
