//! Closed error sets. `LinkError` is what callers see (spec §7);
//! `CodecError` stays internal to the codec/DLC boundary.

use thiserror::Error;

/// Externally visible error kinds (spec §7).
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum LinkError {
    /// The transport layer reported a failure.
    #[error("transport write failed")]
    Os,
    /// The link is not in `RstComplete` or `Active` state.
    #[error("link not connected")]
    NotConnected,
    /// The payload exceeds `Config::max_frame_len`.
    #[error("frame too long")]
    FrameTooLong,
}

/// Internal codec error set (spec §4.1/§7). Never escapes the crate;
/// callers only observe its effects (a dropped frame, a stats counter).
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub(crate) enum CodecError {
    #[error("invalid input to encoder")]
    InvalidInput,
    /// Not enough bytes yet to close a frame; resumable, no data lost.
    #[error("incomplete frame")]
    NoMessage,
    /// Short frame, bad FCS, or destination overflow; frame discarded.
    #[error("checksum or framing error")]
    Checksum,
}
