//! Frame kinds and control-byte encoding, per the HDLC-derived control
//! field layout.

/// The closed set of frame kinds this link layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Data,
    Ack,
    Nack,
    Ui,
    Sabm,
    Ua,
    Unsupported,
}

/// Station address byte. All traffic is broadcast; there is no addressing.
pub const ADDR: u8 = 0xFF;

const UFRAME_UI: u8 = 0x13;
const UFRAME_SABM: u8 = 0x3F;
const UFRAME_UA: u8 = 0x73;
const UFRAME_MASK: u8 = 0xEF; // ignore poll/final bit

const SFRAME_ACK: u8 = 0x01;
const SFRAME_NACK: u8 = 0x09;
const SFRAME_MASK: u8 = 0x0F;

/// Decoded control-field metadata for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub kind: FrameKind,
    /// N(S), valid only for `Data`.
    pub send_seq: u8,
    /// N(R), valid for `Data`, `Ack`, `Nack`.
    pub recv_seq: u8,
}

impl Control {
    pub fn data(send_seq: u8, recv_seq: u8) -> Self {
        Control { kind: FrameKind::Data, send_seq, recv_seq }
    }

    pub fn ack(recv_seq: u8) -> Self {
        Control { kind: FrameKind::Ack, send_seq: 0, recv_seq }
    }

    pub fn nack(recv_seq: u8) -> Self {
        Control { kind: FrameKind::Nack, send_seq: 0, recv_seq }
    }

    pub fn ui() -> Self {
        Control { kind: FrameKind::Ui, send_seq: 0, recv_seq: 0 }
    }

    pub fn sabm() -> Self {
        Control { kind: FrameKind::Sabm, send_seq: 0, recv_seq: 0 }
    }

    pub fn ua() -> Self {
        Control { kind: FrameKind::Ua, send_seq: 0, recv_seq: 0 }
    }

    /// Encode to the on-wire control byte (§4.1.1).
    pub fn to_byte(self) -> u8 {
        match self.kind {
            FrameKind::Data => {
                ((self.recv_seq & 7) << 5) | (1 << 4) | ((self.send_seq & 7) << 1)
            }
            FrameKind::Ui => UFRAME_UI,
            FrameKind::Sabm => UFRAME_SABM,
            FrameKind::Ua => UFRAME_UA,
            FrameKind::Ack => ((self.recv_seq & 7) << 5) | SFRAME_ACK,
            FrameKind::Nack => ((self.recv_seq & 7) << 5) | SFRAME_NACK,
            FrameKind::Unsupported => 0,
        }
    }

    /// Decode an on-wire control byte (§4.1.3).
    pub fn from_byte(ctrl: u8) -> Self {
        if ctrl & 1 == 0 {
            Control::data((ctrl >> 1) & 7, (ctrl >> 5) & 7)
        } else if (ctrl & SFRAME_MASK) == SFRAME_ACK {
            Control::ack((ctrl >> 5) & 7)
        } else if (ctrl & SFRAME_MASK) == SFRAME_NACK {
            Control::nack((ctrl >> 5) & 7)
        } else {
            match ctrl & UFRAME_MASK {
                UFRAME_UI => Control::ui(),
                UFRAME_SABM => Control::sabm(),
                UFRAME_UA => Control::ua(),
                _ => Control { kind: FrameKind::Unsupported, send_seq: 0, recv_seq: 0 },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_round_trips_through_control_byte() {
        let c = Control::data(3, 5);
        let byte = c.to_byte();
        let back = Control::from_byte(byte);
        assert_eq!(back.kind, FrameKind::Data);
        assert_eq!(back.send_seq, 3);
        assert_eq!(back.recv_seq, 5);
    }

    #[test]
    fn ack_and_nack_are_distinguished() {
        assert_eq!(Control::from_byte(Control::ack(2).to_byte()).kind, FrameKind::Ack);
        assert_eq!(Control::from_byte(Control::nack(2).to_byte()).kind, FrameKind::Nack);
    }

    #[test]
    fn u_frames_ignore_poll_final_bit() {
        assert_eq!(Control::from_byte(UFRAME_SABM | 0x10).kind, FrameKind::Sabm);
        assert_eq!(Control::from_byte(UFRAME_UA | 0x10).kind, FrameKind::Ua);
        assert_eq!(Control::from_byte(UFRAME_UI | 0x10).kind, FrameKind::Ui);
    }

    #[test]
    fn unknown_control_byte_is_unsupported() {
        assert_eq!(Control::from_byte(0x05).kind, FrameKind::Unsupported);
    }
}
