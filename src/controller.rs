//! The data-link controller: window, sequencing, ack policy, retransmit
//! timer, keep-alive, and the SABM/UA reset handshake (spec §4.2).

use std::sync::{Mutex, MutexGuard};

use log::{debug, trace, warn};

use crate::callbacks::{LinkCallbacks, LinkTimer, ResetCause, Transport};
use crate::codec::{encode, Decoder};
use crate::config::Config;
use crate::error::{CodecError, LinkError};
use crate::frame::{Control, FrameKind};
use crate::stats::Stats;
use crate::txqueue::{TxEntry, TxQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DlcState {
    RstRequired,
    RstCompleteWait,
    RstComplete,
    Active,
}

struct State {
    dlc_state: DlcState,
    tx_next_seq: u8,
    rx_expected_seq: u8,
    outstanding: u8,
    txq: TxQueue,
    retransmit_attempts: u32,
    retransmit_on_ack: bool,
    ack_pending: bool,
    keep_alive_counter: u32,
    decoder: Decoder,
    stats: Stats,
}

impl State {
    fn fresh(max_frame_len: usize) -> Self {
        State {
            dlc_state: DlcState::RstRequired,
            tx_next_seq: 0,
            rx_expected_seq: 0,
            outstanding: 0,
            txq: TxQueue::new(),
            retransmit_attempts: 0,
            retransmit_on_ack: false,
            ack_pending: false,
            keep_alive_counter: 0,
            decoder: Decoder::new(max_frame_len),
            stats: Stats::default(),
        }
    }
}

/// A single data-link instance, generic over its injected collaborators.
///
/// `T` is the raw-byte transport, `L` the single-shot retransmit/keep-alive
/// timer, `A` the upward application callbacks. One `Controller` speaks to
/// exactly one peer.
pub struct Controller<T, L, A> {
    transport: T,
    timer: L,
    callbacks: A,
    config: Config,
    state: Mutex<State>,
}

impl<T: Transport, L: LinkTimer, A: LinkCallbacks> Controller<T, L, A> {
    /// Create a new instance: enters `RstRequired`, sends the initial
    /// `SABM`, and arms the timer.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`Config::validate`] (e.g. a window outside
    /// `1..=7`, built via struct-literal rather than [`Config::new`]).
    pub fn new(transport: T, timer: L, callbacks: A, config: Config) -> Self {
        config.validate().expect("invalid Config passed to Controller::new");
        let controller = Controller {
            transport,
            timer,
            callbacks,
            config,
            state: Mutex::new(State::fresh(config.max_frame_len)),
        };
        let mut st = controller.state.lock().unwrap();
        controller.send_sabm(&mut st);
        drop(st);
        controller
    }

    pub fn stats(&self) -> Stats {
        self.state.lock().unwrap().stats
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().unwrap().txq.len()
    }

    // ---- outgoing control frames -------------------------------------

    fn send_ctrl_frame(&self, st: &mut State, control: Control) {
        let wire = encode(control, &[]);
        if self.transport.send(&wire).is_err() {
            st.stats.tx_err = st.stats.tx_err.saturating_add(1);
            warn!("transport write failed sending {:?}", control.kind);
        }
    }

    fn send_ack(&self, st: &mut State) {
        st.stats.tx_ack = st.stats.tx_ack.saturating_add(1);
        trace!("send pending ACK {}", st.rx_expected_seq);
        self.send_ctrl_frame(st, Control::ack(st.rx_expected_seq));
        st.ack_pending = false;
    }

    fn send_nack(&self, st: &mut State) {
        st.stats.tx_nack = st.stats.tx_nack.saturating_add(1);
        debug!("send NACK {}", st.rx_expected_seq);
        self.send_ctrl_frame(st, Control::nack(st.rx_expected_seq));
        st.ack_pending = false;
    }

    fn send_sabm(&self, st: &mut State) {
        debug!("send SABM (reset)");
        self.send_ctrl_frame(st, Control::sabm());
        self.timer.start();
    }

    fn send_ua(&self, st: &mut State) {
        debug!("send UA");
        self.send_ctrl_frame(st, Control::ua());
    }

    // ---- outgoing data frames -------------------------------------

    /// Transmit (or retransmit) the entry at `index`, per `tx_data_frame`.
    /// Per the invariant that the window is filled front-to-back with no
    /// gaps, the entry transmitted here is always the one immediately
    /// following the previous `last_tx`, so `last_tx` always advances to
    /// `index`.
    fn send_data_frame(&self, st: &mut State, index: usize) {
        let recv_seq = st.rx_expected_seq;
        let is_fresh = st
            .txq
            .get_mut(index)
            .expect("valid txq index")
            .seq
            .is_none();
        let send_seq = if is_fresh {
            let seq = st.tx_next_seq;
            st.tx_next_seq = (st.tx_next_seq + 1) % 8;
            st.retransmit_attempts = 0;
            st.txq.get_mut(index).expect("valid txq index").seq = Some(seq);
            st.stats.tx = st.stats.tx.saturating_add(1);
            seq
        } else {
            st.stats.tx_retrans = st.stats.tx_retrans.saturating_add(1);
            let seq = st
                .txq
                .get_mut(index)
                .expect("valid txq index")
                .seq
                .expect("checked Some above");
            debug!("retransmission of seq_no={seq}");
            seq
        };
        let payload = st
            .txq
            .get_mut(index)
            .expect("valid txq index")
            .payload
            .clone()
            .unwrap_or_default();
        st.ack_pending = false;
        trace!("tx frame seq={send_seq} ack={recv_seq} len={}", payload.len());
        let wire = encode(Control::data(send_seq, recv_seq), &payload);
        let _ = self.transport.send(&wire);
        st.txq.set_last_tx_index(Some(index));
    }

    fn insert_frame(&self, st: &mut State, entry: TxEntry) {
        st.txq.push_back(entry);
        let index = st.txq.len() - 1;
        if !st.retransmit_on_ack && (st.outstanding as usize) < self.config.max_outstanding_frames as usize {
            st.outstanding += 1;
            self.send_data_frame(st, index);
            if st.outstanding == 1 {
                self.timer.start();
            }
        }
    }

    // ---- upward operations ------------------------------------------

    /// Reliable send. Fails `FrameTooLong` / `NotConnected` per spec
    /// §4.2.1; otherwise enqueues and (if window allows) transmits
    /// immediately.
    pub fn send_frame(&self, payload: Vec<u8>) -> Result<(), LinkError> {
        if payload.len() > self.config.max_frame_len {
            warn!("frame length {} too long", payload.len());
            return Err(LinkError::FrameTooLong);
        }
        let mut st = self.state.lock().unwrap();
        if st.dlc_state < DlcState::RstComplete {
            warn!("send_frame: not connected");
            return Err(LinkError::NotConnected);
        }
        st.dlc_state = DlcState::Active;
        self.insert_frame(&mut st, TxEntry { payload: Some(payload), seq: None });
        Ok(())
    }

    /// Best-effort `UI` send: no queueing, no retransmission, no "sent"
    /// callback (spec §4.2.1).
    pub fn send_frame_unacknowledged(&self, payload: &[u8]) -> Result<(), LinkError> {
        if payload.len() > self.config.max_frame_len {
            warn!("frame length {} too long", payload.len());
            return Err(LinkError::FrameTooLong);
        }
        let wire = encode(Control::ui(), payload);
        let mut st = self.state.lock().unwrap();
        if st.dlc_state < DlcState::RstComplete {
            warn!("send_frame_unacknowledged: not connected");
            return Err(LinkError::NotConnected);
        }
        st.stats.ui_tx = st.stats.ui_tx.saturating_add(1);
        let res = self.transport.send(&wire);
        drop(st);
        res.map(|_| ()).map_err(|_| LinkError::Os)
    }

    /// Release every queued payload with cause `ApplicationFree` and stop
    /// the timer. No further operations are legal on the instance after
    /// this returns.
    pub fn shutdown(&self) {
        let st = self.state.lock().unwrap();
        self.do_reset(st, ResetCause::ApplicationFree);
        self.timer.stop();
    }

    /// Equivalent to a local reset with cause `LinkLost` (spec §4.2.2).
    pub fn on_link_lost(&self) {
        let st = self.state.lock().unwrap();
        self.do_reset(st, ResetCause::LinkLost);
    }

    // ---- acknowledgement processing (spec §4.2.4) --------------------

    /// Process a received N(R), acknowledging every outstanding entry it
    /// covers. Returns the detached entries to notify once the lock is
    /// released.
    fn rx_ack(&self, st: &mut State, ack_seq: u8) -> Vec<TxEntry> {
        match st.txq.front() {
            None => {
                trace!("rx_ack {ack_seq} but txq is empty");
                return Vec::new();
            }
            Some(e) if e.seq == Some(ack_seq) => {
                trace!("rx_ack {ack_seq} outdated");
                return Vec::new();
            }
            _ => {}
        }

        let mut notify = Vec::new();
        loop {
            let popped = match st.txq.pop_front() {
                Some(e) => e,
                None => break,
            };
            if st.outstanding > 0 {
                st.outstanding -= 1;
            }
            notify.push(popped);
            match st.txq.front() {
                None => break,
                Some(next) => {
                    if next.seq == Some(ack_seq) {
                        break;
                    }
                    if next.seq.is_none() {
                        debug_assert!(
                            false,
                            "ack-pop loop reached an untransmitted entry before matching ack_seq={ack_seq}"
                        );
                        break;
                    }
                }
            }
        }

        // Link is demonstrably alive; forgive however many retries it took.
        st.retransmit_attempts = 0;

        if st.retransmit_on_ack {
            let mut index = 0;
            loop {
                let fresh = match st.txq.get_mut(index) {
                    Some(e) => e.seq.is_none(),
                    None => break,
                };
                if fresh {
                    break;
                }
                debug!("retransmit (on ack) index={index}");
                self.send_data_frame(st, index);
                index += 1;
            }
            st.retransmit_on_ack = false;
        }

        while (st.outstanding as usize) < self.config.max_outstanding_frames as usize
            && st.txq.len() > st.outstanding as usize
        {
            let next_index = st.txq.last_tx_index().map_or(0, |i| i + 1);
            st.outstanding += 1;
            self.send_data_frame(st, next_index);
        }

        self.timer.start();
        if st.outstanding == 0 && st.ack_pending {
            self.send_ack(st);
        }

        notify
    }

    /// Called after receiving a valid in-sequence `DATA` frame: either
    /// defer the ack for piggybacking or send it immediately (spec §4.2.6).
    fn ack_recv_data(&self, st: &mut State, rx_seq_no: u8) {
        st.rx_expected_seq = (rx_seq_no + 1) % 8;
        if !st.txq.is_empty() && (st.outstanding as usize) < self.config.max_outstanding_frames as usize {
            trace!("delay ack {rx_seq_no}");
            st.ack_pending = true;
            return;
        }
        self.send_ack(st);
    }

    fn fire_sent(&self, notify: Vec<TxEntry>) {
        for entry in notify {
            if let Some(payload) = entry.payload {
                self.callbacks.on_sent(payload);
            }
        }
    }

    // ---- reset (spec §4.2.7) -----------------------------------------

    fn reset_internal(&self, st: &mut State, cause: ResetCause) -> Vec<TxEntry> {
        let stats = st.stats;
        let drained = st.txq.drain_all();
        *st = State::fresh(self.config.max_frame_len);
        st.stats = stats;
        st.stats.reset = st.stats.reset.saturating_add(1);
        if cause == ResetCause::PeerInitiated {
            st.dlc_state = DlcState::RstCompleteWait;
        }
        self.timer.start();
        drained
    }

    fn do_reset(&self, mut st: MutexGuard<'_, State>, cause: ResetCause) {
        debug!("HDLC reset ({cause:?})!");
        let drained = self.reset_internal(&mut st, cause);
        drop(st);
        self.callbacks.on_reset(cause);
        self.fire_sent(drained);
    }

    // ---- timer tick (spec §4.2.5) -------------------------------------

    /// Retransmission/keep-alive tick, driven by the integration's timer.
    pub fn on_timer(&self) {
        let mut st = self.state.lock().unwrap();
        match st.dlc_state {
            DlcState::RstRequired => {
                self.send_sabm(&mut st);
                return;
            }
            DlcState::RstCompleteWait => {
                st.dlc_state = DlcState::RstComplete;
                self.timer.start();
                drop(st);
                self.callbacks.on_connected();
                return;
            }
            _ => {}
        }

        if !st.txq.is_empty() && st.outstanding > 0 {
            st.retransmit_attempts += 1;
            debug!("retransmit attempt {}", st.retransmit_attempts);
            if st.retransmit_attempts == self.config.retransmit_cnt {
                let cause = if st.keep_alive_counter >= self.config.keep_alive_cnt {
                    ResetCause::TimeoutKeepAlive
                } else {
                    ResetCause::TimeoutRetransmit
                };
                self.do_reset(st, cause);
                return;
            }
            self.send_data_frame(&mut st, 0);
            st.retransmit_on_ack = true;
        } else {
            st.keep_alive_counter += 1;
            if st.keep_alive_counter == self.config.keep_alive_cnt {
                debug!("send keep-alive");
                st.stats.tx_keep_alive = st.stats.tx_keep_alive.saturating_add(1);
                self.insert_frame(&mut st, TxEntry { payload: None, seq: None });
            }
        }
        self.timer.start();
    }

    // ---- rx dispatch (spec §4.2.2 / §4.2.3) ---------------------------

    /// Feed bytes read from the transport through the codec and dispatch
    /// every decoded frame.
    pub fn on_rx(&self, bytes: &[u8]) {
        let mut remaining = bytes;
        let mut need_nack = false;
        let mut prev_kind: Option<FrameKind> = None;

        while !remaining.is_empty() {
            let mut st = self.state.lock().unwrap();
            let (consumed, outcome) = st.decoder.feed(remaining);
            remaining = &remaining[consumed..];

            let decoded = match outcome {
                Err(CodecError::NoMessage) => break,
                Err(CodecError::Checksum) => {
                    st.stats.rx_err = st.stats.rx_err.saturating_add(1);
                    warn!("checksum error, discarding frame");
                    continue;
                }
                Err(CodecError::InvalidInput) => continue,
                Ok(frame) => frame,
            };

            st.keep_alive_counter = if decoded.control.kind == FrameKind::Data { 1 } else { 0 };

            if decoded.control.kind == FrameKind::Sabm && prev_kind == Some(FrameKind::Sabm) {
                debug!("ignore duplicate SABM");
                continue;
            }
            prev_kind = Some(decoded.control.kind);

            if st.dlc_state < DlcState::RstComplete
                && !matches!(decoded.control.kind, FrameKind::Sabm | FrameKind::Ua)
            {
                warn!("ignore frame due to RST_REQUIRED state");
                continue;
            }

            match decoded.control.kind {
                FrameKind::Data => {
                    let in_order = st.rx_expected_seq == decoded.control.send_seq;
                    let notify = self.rx_ack(&mut st, decoded.control.recv_seq);
                    if in_order {
                        st.stats.rx = st.stats.rx.saturating_add(1);
                        st.dlc_state = DlcState::Active;
                        self.ack_recv_data(&mut st, decoded.control.send_seq);
                        need_nack = false;
                    } else {
                        st.stats.rx_retrans = st.stats.rx_retrans.saturating_add(1);
                        warn!(
                            "out-of-order frame: expected {}, got {}",
                            st.rx_expected_seq, decoded.control.send_seq
                        );
                        need_nack = true;
                    }
                    drop(st);
                    if in_order && !decoded.payload.is_empty() {
                        self.callbacks.on_recv(&decoded.payload);
                    }
                    self.fire_sent(notify);
                }
                FrameKind::Ui => {
                    st.stats.ui_rx = st.stats.ui_rx.saturating_add(1);
                    drop(st);
                    self.callbacks.on_recv(&decoded.payload);
                }
                FrameKind::Ack => {
                    st.stats.rx_ack = st.stats.rx_ack.saturating_add(1);
                    let notify = self.rx_ack(&mut st, decoded.control.recv_seq);
                    drop(st);
                    self.fire_sent(notify);
                }
                FrameKind::Nack => {
                    st.stats.rx_nack = st.stats.rx_nack.saturating_add(1);
                    // Retransmission on NACK is timer-driven only.
                    let notify = self.rx_ack(&mut st, decoded.control.recv_seq);
                    drop(st);
                    self.fire_sent(notify);
                }
                FrameKind::Sabm => {
                    self.send_ua(&mut st);
                    if st.dlc_state == DlcState::Active {
                        self.do_reset(st, ResetCause::PeerInitiated);
                    } else if st.dlc_state == DlcState::RstRequired {
                        st.dlc_state = DlcState::RstComplete;
                        drop(st);
                        self.callbacks.on_connected();
                    }
                }
                FrameKind::Ua => {
                    if st.dlc_state == DlcState::RstRequired {
                        st.dlc_state = DlcState::RstComplete;
                        drop(st);
                        self.callbacks.on_connected();
                    }
                }
                FrameKind::Unsupported => {
                    warn!("got unsupported frame type");
                }
            }
        }

        if need_nack {
            let mut st = self.state.lock().unwrap();
            self.send_nack(&mut st);
        }
    }
}
