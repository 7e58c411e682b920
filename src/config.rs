//! Tunables for the pipelined transfer engine.

/// Bounds on a single [`crate::Transfer`]'s in-flight requests.
///
/// Mirrors the reference's hardcoded `32768`-byte request size and
/// `1048576`-byte window; exposed here as a config surface so an embedder
/// can trade memory for throughput without touching the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Total bytes allowed in flight at once, across all queued requests.
    pub window_bytes: u64,
    /// Bytes requested (or written) per individual `READ`/`WRITE`.
    pub chunk_bytes: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self { window_bytes: 1_048_576, chunk_bytes: 32_768 }
    }
}
