use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while speaking SFTP.
///
/// Mirrors the reference implementation's `(errtype, message)` error
/// channel, but as a proper typed error instead of a pair of globals kept
/// on the side.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed to deliver or accept bytes.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A packet could not be decoded: wrong reply type, or a getter ran
    /// past the declared bounds of the packet.
    #[error("malformed packet: {0}")]
    Protocol(String),

    /// The server replied with an `SSH_FXP_STATUS` other than OK or EOF.
    #[error("{message} (status {code})")]
    Status { code: u32, message: &'static str },

    /// A download's bookkeeping found data past the point it believed to
    /// be the end of the file.
    #[error("received a short buffer from FXP_READ, but not at EOF")]
    ShortBufferNotAtEof,

    /// Programmer error: an unregistered or unknown request id, a request
    /// used after its reply, etc.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The SFTP status code this error corresponds to, or `-1` for
    /// anything that isn't a protocol `STATUS` reply. Matches the
    /// reference's `fxp_error_type`.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::Status { code, .. } => *code as i32,
            _ => -1,
        }
    }
}
