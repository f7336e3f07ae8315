//! A reliable, in-order, bidirectional framed datagram link layer over a
//! byte-oriented transport.
//!
//! The two pieces that matter:
//!
//! - [`codec`] — stateless frame encoding and a stateful, incremental,
//!   byte-stuffing decoder ([`codec::Decoder`]).
//! - [`controller::Controller`] — the data-link controller: send window,
//!   receive sequencing, piggybacked ack/nack, retransmit timer,
//!   keep-alive, and the `SABM`/`UA` reset handshake.
//!
//! ```no_run
//! use hdlc_link::callbacks::{LinkCallbacks, LinkTimer, ResetCause, Transport};
//! use hdlc_link::config::Config;
//! use hdlc_link::controller::Controller;
//!
//! struct MyTransport;
//! impl Transport for MyTransport {
//!     fn send(&self, bytes: &[u8]) -> std::io::Result<usize> {
//!         Ok(bytes.len()) // write to a serial port, socket, etc.
//!     }
//! }
//!
//! struct MyTimer;
//! impl LinkTimer for MyTimer {
//!     fn start(&self) {}
//!     fn stop(&self) {}
//! }
//!
//! struct MyCallbacks;
//! impl LinkCallbacks for MyCallbacks {
//!     fn on_recv(&self, _payload: &[u8]) {}
//!     fn on_sent(&self, _payload: Vec<u8>) {}
//!     fn on_reset(&self, _cause: ResetCause) {}
//!     fn on_connected(&self) {}
//! }
//!
//! let link = Controller::new(MyTransport, MyTimer, MyCallbacks, Config::default());
//! link.send_frame(b"hello".to_vec()).ok();
//! ```

pub mod callbacks;
pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod fcs;
pub mod frame;
pub mod stats;
pub mod txqueue;

pub use callbacks::{LinkCallbacks, LinkTimer, ResetCause, Transport};
pub use codec::{encode, DecodedFrame, Decoder};
pub use config::Config;
pub use controller::Controller;
pub use error::LinkError;
pub use frame::{Control, FrameKind};
pub use stats::Stats;
