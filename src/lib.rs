//! Client-side core of the SSH File Transfer Protocol, version 3.
//!
//! This crate implements the wire codec, the request-id allocator and
//! correlation registry, the per-operation send/recv primitives, and the
//! windowed pipelined transfer engine used for bulk upload/download. It does
//! not open SSH connections itself: callers supply a [`Transport`] over
//! whatever secure channel they already have (typically an SSH subsystem
//! channel), and drive a [`Session`] with it.

mod attrs;
mod config;
mod decode;
mod encode;
mod error;
mod message;
mod packet;
mod registry;
mod session;
mod transfer;
mod transport;

pub use attrs::FileAttrs;
pub use config::TransferConfig;
pub use error::{Error, Result};
pub use message::{Extension, Name, OpenFlags, SingleName, StatusCode, SFTP_PROTO_VERSION};
pub use session::Session;
pub use transfer::{Direction, Transfer};
pub use transport::Transport;
