//! Two controllers wired back-to-back over channels, exchanging one
//! reliable frame and one best-effort frame.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use env_logger;
use log::LevelFilter;

use hdlc_link::callbacks::{LinkCallbacks, LinkTimer, ResetCause, Transport};
use hdlc_link::config::Config;
use hdlc_link::controller::Controller;

struct ChannelTransport {
    name: &'static str,
    tx: Mutex<Sender<u8>>,
}

impl Transport for ChannelTransport {
    fn send(&self, bytes: &[u8]) -> std::io::Result<usize> {
        print!("{}: tx [", self.name);
        let sender = self.tx.lock().unwrap();
        for &b in bytes {
            print!(" {b:02x}");
            sender
                .send(b)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))?;
        }
        println!(" ]");
        Ok(bytes.len())
    }
}

struct NoopTimer;
impl LinkTimer for NoopTimer {
    fn start(&self) {}
    fn stop(&self) {}
}

struct PrintCallbacks {
    name: &'static str,
}
impl LinkCallbacks for PrintCallbacks {
    fn on_recv(&self, payload: &[u8]) {
        println!("{}: received {} bytes: {:?}", self.name, payload.len(), payload);
    }
    fn on_sent(&self, payload: Vec<u8>) {
        println!("{}: peer acked {} bytes", self.name, payload.len());
    }
    fn on_reset(&self, cause: ResetCause) {
        println!("{}: reset ({:?})", self.name, cause);
    }
    fn on_connected(&self) {
        println!("{}: connected", self.name);
    }
}

type Link = Arc<Controller<ChannelTransport, NoopTimer, PrintCallbacks>>;

fn pump(link: Link, rx: Receiver<u8>) {
    thread::spawn(move || {
        for byte in rx.iter() {
            link.on_rx(&[byte]);
        }
    });
}

fn main() {
    log::set_max_level(LevelFilter::Info);
    env_logger::init();

    let (tx_a_to_b, rx_a_to_b) = channel();
    let (tx_b_to_a, rx_b_to_a) = channel();

    let link_a = Arc::new(Controller::new(
        ChannelTransport { name: "a", tx: Mutex::new(tx_a_to_b) },
        NoopTimer,
        PrintCallbacks { name: "a" },
        Config::default(),
    ));
    let link_b = Arc::new(Controller::new(
        ChannelTransport { name: "b", tx: Mutex::new(tx_b_to_a) },
        NoopTimer,
        PrintCallbacks { name: "b" },
        Config::default(),
    ));

    pump(link_a.clone(), rx_b_to_a);
    pump(link_b.clone(), rx_a_to_b);

    // Let the SABM/UA handshake settle.
    thread::sleep(Duration::from_millis(50));

    link_a.send_frame(b"hello from a".to_vec()).expect("connected");
    link_b.send_frame_unacknowledged(b"best effort from b").expect("connected");

    thread::sleep(Duration::from_millis(50));
    link_a.shutdown();
    link_b.shutdown();
}
