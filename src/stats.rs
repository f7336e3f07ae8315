//! Link statistics, mirroring the original `hdlc_stat_t` counters (spec
//! §9 "Plumbing traits/interfaces, statistics").

/// Running counters useful for diagnosing link performance. All fields
/// saturate rather than panic on overflow.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    /// In-order data frames received.
    pub rx: u64,
    /// UI frames received.
    pub ui_rx: u64,
    /// Out-of-order data frames received (each triggers NACK bookkeeping).
    pub rx_retrans: u64,
    /// Frames dropped by the codec (checksum/framing error).
    pub rx_err: u64,
    /// ACK frames received.
    pub rx_ack: u64,
    /// NACK frames received.
    pub rx_nack: u64,
    /// Fresh data frames transmitted.
    pub tx: u64,
    /// UI frames transmitted.
    pub ui_tx: u64,
    /// Transport write failures while sending ACK/NACK/SABM/UA.
    pub tx_err: u64,
    /// Data frame retransmissions.
    pub tx_retrans: u64,
    /// ACK frames transmitted.
    pub tx_ack: u64,
    /// NACK frames transmitted.
    pub tx_nack: u64,
    /// Keep-alive frames transmitted.
    pub tx_keep_alive: u64,
    /// Number of link resets.
    pub reset: u64,
}
