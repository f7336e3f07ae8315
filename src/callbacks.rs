//! Injected collaborator traits (spec §6 "Downward interfaces" and
//! "Upward callbacks"). The controller is generic over these so the
//! integration can supply a real serial port and a real timer wheel
//! without the core depending on either.

/// Raw-byte send sink. Implementations must be non-blocking or bounded;
/// the controller calls `send` while holding its internal lock.
pub trait Transport {
    /// Write `bytes` to the wire. Returns the number of bytes accepted,
    /// or an error if the underlying sink failed.
    fn send(&self, bytes: &[u8]) -> std::io::Result<usize>;
}

/// Single-shot retransmit/keep-alive timer. `start` (re)arms the timer
/// for the configured period, cancelling any previous arming; `stop`
/// disarms it. The integration calls back into
/// [`crate::controller::Controller::on_timer`] when it fires.
pub trait LinkTimer {
    fn start(&self);
    fn stop(&self);
}

/// Why a link tore down (spec §4.2.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    ApplicationFree,
    LinkLost,
    TimeoutKeepAlive,
    TimeoutRetransmit,
    PeerInitiated,
}

/// Upward application callbacks (spec §6 "Upward callbacks"). All are
/// invoked with the controller's internal lock released, so callbacks
/// may re-enter `send_frame`/`send_frame_unacknowledged`.
pub trait LinkCallbacks {
    /// In-order delivery of a reliable frame, or delivery of a `UI` frame.
    fn on_recv(&self, payload: &[u8]);
    /// The given payload has been acknowledged by the peer, or discarded
    /// by a reset. Fires exactly once per successful `send_frame` call
    /// whose entry carried a payload (keep-alives are suppressed).
    fn on_sent(&self, payload: Vec<u8>);
    /// Link state has been torn down; no further sends succeed until
    /// `on_connected` fires.
    fn on_reset(&self, cause: ResetCause);
    /// SABM/UA handshake completed; reliable sends now accepted.
    fn on_connected(&self);
}
