//! Stateless frame encoder and stateful incremental decoder (spec §4.1).

use crate::error::CodecError;
use crate::fcs::{Fcs, FCS_GOOD_VALUE};
use crate::frame::{Control, ADDR};

const FLAG: u8 = 0x7E;
const ESCAPE: u8 = 0x7D;
const ESCAPE_XOR: u8 = 0x20;

fn push_escaped(dest: &mut Vec<u8>, byte: u8) {
    if byte == FLAG || byte == ESCAPE {
        dest.push(ESCAPE);
        dest.push(byte ^ ESCAPE_XOR);
    } else {
        dest.push(byte);
    }
}

/// Encode `control`/`payload` into a complete wire frame (§4.1.1).
///
/// `payload` is only meaningful for `Data`/`Ui` control kinds; it is
/// ignored for every other kind.
pub fn encode(control: Control, payload: &[u8]) -> Vec<u8> {
    let carries_payload = matches!(
        control.kind,
        crate::frame::FrameKind::Data | crate::frame::FrameKind::Ui
    );
    let body = if carries_payload { payload } else { &[] };

    let mut dest = Vec::with_capacity(6 + 2 * body.len() + 4);
    dest.push(FLAG);

    let ctrl_byte = control.to_byte();
    let mut fcs = Fcs::new();
    fcs.step(ADDR);
    fcs.step(ctrl_byte);
    fcs.step_all(body);
    let fcs_value = fcs.finalize();

    push_escaped(&mut dest, ADDR);
    push_escaped(&mut dest, ctrl_byte);
    for &b in body {
        push_escaped(&mut dest, b);
    }
    push_escaped(&mut dest, (fcs_value & 0xFF) as u8);
    push_escaped(&mut dest, (fcs_value >> 8) as u8);
    dest.push(FLAG);
    dest
}

/// A fully decoded frame, as produced by [`Decoder::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub control: Control,
    pub payload: Vec<u8>,
}

/// Incremental byte-stuffing decoder (§4.1.2). Holds partial-frame state
/// across calls to [`Decoder::feed`]; a single `Decoder` must only ever
/// see bytes from one peer in order.
pub struct Decoder {
    max_dest_len: usize,
    in_frame: bool,
    escape: bool,
    fcs: Fcs,
    dest: Vec<u8>,
}

impl Decoder {
    /// `max_frame_len` bounds the payload; the decoder's destination
    /// buffer capacity is `max_frame_len + 2` (payload plus FCS), per
    /// `YAHDLC_DEST_LEN`.
    pub fn new(max_frame_len: usize) -> Self {
        Decoder {
            max_dest_len: max_frame_len + 2,
            in_frame: false,
            escape: false,
            fcs: Fcs::new(),
            dest: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.in_frame = false;
        self.escape = false;
        self.fcs = Fcs::new();
        self.dest.clear();
    }

    fn start_frame(&mut self) {
        self.in_frame = true;
        self.escape = false;
        self.fcs = Fcs::new();
        self.dest.clear();
    }

    /// Feed one chunk of source bytes. Consumes as much of `src` as forms
    /// one outcome (a completed frame, a discarded bad frame, or running
    /// out of input) and returns `(consumed, outcome)`. Call again with
    /// the remaining bytes (if any) to continue, and repeatedly while
    /// `consumed < src.len()` to drain every frame in the chunk.
    pub fn feed(&mut self, src: &[u8]) -> (usize, Result<DecodedFrame, CodecError>) {
        for (i, &byte) in src.iter().enumerate() {
            if !self.in_frame {
                if byte == FLAG {
                    self.start_frame();
                }
                continue;
            }

            if byte == FLAG {
                if self.dest.is_empty() && !self.escape {
                    // Empty frame (double flag, or flag right after open):
                    // treat as shared flag, stay ready for the next frame.
                    continue;
                }
                return (i + 1, self.close_frame());
            }

            let value = if self.escape {
                self.escape = false;
                byte ^ ESCAPE_XOR
            } else if byte == ESCAPE {
                self.escape = true;
                continue;
            } else {
                byte
            };

            self.fcs.step(value);
            if self.dest.len() >= self.max_dest_len {
                self.reset();
                return (i + 1, Err(CodecError::Checksum));
            }
            self.dest.push(value);
        }
        (src.len(), Err(CodecError::NoMessage))
    }

    fn close_frame(&mut self) -> Result<DecodedFrame, CodecError> {
        // dest holds ADDR, CTRL, payload..., FCS_lo, FCS_hi.
        if self.dest.len() < 4 {
            self.reset();
            return Err(CodecError::Checksum);
        }
        if self.fcs.value() != FCS_GOOD_VALUE {
            self.reset();
            return Err(CodecError::Checksum);
        }
        let control = Control::from_byte(self.dest[1]);
        let payload = self.dest[2..self.dest.len() - 2].to_vec();
        self.reset();
        Ok(DecodedFrame { control, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameKind;

    fn feed_all(decoder: &mut Decoder, mut src: &[u8]) -> Vec<Result<DecodedFrame, CodecError>> {
        let mut out = Vec::new();
        while !src.is_empty() {
            let (consumed, outcome) = decoder.feed(src);
            let is_no_message = matches!(outcome, Err(CodecError::NoMessage));
            out.push(outcome);
            src = &src[consumed..];
            if is_no_message {
                break;
            }
        }
        out
    }

    #[test]
    fn round_trips_data_frame() {
        let wire = encode(Control::data(1, 2), b"hello");
        let mut decoder = Decoder::new(2000);
        let results = feed_all(&mut decoder, &wire);
        assert_eq!(results.len(), 1);
        let frame = results[0].as_ref().unwrap();
        assert_eq!(frame.control.kind, FrameKind::Data);
        assert_eq!(frame.control.send_seq, 1);
        assert_eq!(frame.control.recv_seq, 2);
        assert_eq!(frame.payload, b"hello");
    }

    #[test]
    fn escape_correctness_matches_spec_length() {
        let payload = [0x7E, 0x11, 0x7D];
        let wire = encode(Control::ui(), &payload);
        assert_eq!(wire.len(), 6 + 3 + 2);
        let mut decoder = Decoder::new(2000);
        let results = feed_all(&mut decoder, &wire);
        assert_eq!(results[0].as_ref().unwrap().payload, payload);
    }

    #[test]
    fn multi_frame_in_one_buffer_decodes_in_order() {
        let mut wire = Vec::new();
        wire.extend(encode(Control::data(0, 0), b"one"));
        wire.extend(encode(Control::data(1, 0), b"two"));
        wire.extend(encode(Control::data(2, 0), b"three"));
        let mut decoder = Decoder::new(2000);
        let mut src: &[u8] = &wire;
        let mut payloads = Vec::new();
        loop {
            let (consumed, outcome) = decoder.feed(src);
            match outcome {
                Ok(frame) => payloads.push(frame.payload),
                Err(CodecError::NoMessage) => break,
                Err(e) => panic!("unexpected error {e:?}"),
            }
            src = &src[consumed..];
            if src.is_empty() {
                break;
            }
        }
        assert_eq!(payloads, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn corrupting_payload_byte_yields_checksum_and_resumes() {
        let mut wire = encode(Control::data(0, 0), b"hello");
        let good = encode(Control::data(1, 0), b"world");
        wire[3] ^= 0x01; // corrupt a payload byte, not a FLAG
        wire.extend(good);

        let mut decoder = Decoder::new(2000);
        let (consumed, first) = decoder.feed(&wire);
        assert_eq!(first, Err(CodecError::Checksum));

        let rest = &wire[consumed..];
        let (_, second) = decoder.feed(rest);
        let frame = second.unwrap();
        assert_eq!(frame.payload, b"world");
    }

    #[test]
    fn partial_frame_across_feeds_reports_no_message() {
        let wire = encode(Control::data(0, 0), b"partial");
        let mut decoder = Decoder::new(2000);
        let (consumed, outcome) = decoder.feed(&wire[..wire.len() - 2]);
        assert_eq!(outcome, Err(CodecError::NoMessage));
        assert_eq!(consumed, wire.len() - 2);

        let (_, outcome) = decoder.feed(&wire[wire.len() - 2..]);
        assert_eq!(outcome.unwrap().payload, b"partial");
    }

    #[test]
    fn destination_overflow_is_safe_and_recovers() {
        let big_payload = vec![FLAG; 16];
        let wire = encode(Control::data(0, 0), &big_payload);
        let good = encode(Control::data(1, 0), b"ok");

        let mut decoder = Decoder::new(4); // max_dest_len = 6, smaller than payload+fcs
        let mut buf = wire.clone();
        buf.extend(good);
        let mut src: &[u8] = &buf;
        let mut saw_checksum = false;
        let mut recovered = None;
        loop {
            let (consumed, outcome) = decoder.feed(src);
            match outcome {
                Err(CodecError::Checksum) => saw_checksum = true,
                Ok(frame) => recovered = Some(frame.payload),
                Err(CodecError::NoMessage) => break,
                _ => {}
            }
            src = &src[consumed..];
            if src.is_empty() {
                break;
            }
        }
        assert!(saw_checksum);
        assert_eq!(recovered, Some(b"ok".to_vec()));
    }
}
