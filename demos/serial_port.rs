//! Drives a real OS serial port: opens it, spawns a read-poll loop and a
//! periodic retransmit/keep-alive timer, and sends one reliable frame.

use std::env;
use std::io::{Read, Write};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use env_logger;
use log::{info, warn, LevelFilter};

use hdlc_link::callbacks::{LinkCallbacks, LinkTimer, ResetCause, Transport};
use hdlc_link::config::Config;
use hdlc_link::controller::Controller;

const DEFAULT_PORT: &str = "/dev/ttyUSB0";
const BAUD_RATE: u32 = 115_200;

struct SerialTransport {
    port: Mutex<Box<dyn serialport::SerialPort>>,
}

impl Transport for SerialTransport {
    fn send(&self, bytes: &[u8]) -> std::io::Result<usize> {
        self.port.lock().unwrap().write(bytes)
    }
}

/// The core only asks for start/stop; arming a real OS timer is left to
/// the integration. Here a background thread ticks `on_timer` at the
/// configured period, so `start`/`stop` are no-ops.
struct PeriodicTimer;
impl LinkTimer for PeriodicTimer {
    fn start(&self) {}
    fn stop(&self) {}
}

struct LoggingCallbacks;
impl LinkCallbacks for LoggingCallbacks {
    fn on_recv(&self, payload: &[u8]) {
        info!("received {} bytes: {:?}", payload.len(), payload);
    }
    fn on_sent(&self, payload: Vec<u8>) {
        info!("peer acked {} bytes", payload.len());
    }
    fn on_reset(&self, cause: ResetCause) {
        warn!("link reset: {cause:?}");
    }
    fn on_connected(&self) {
        info!("link connected");
    }
}

fn main() {
    log::set_max_level(LevelFilter::Info);
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_PORT.to_string());
    let port = serialport::new(path.as_str(), BAUD_RATE)
        .timeout(Duration::from_millis(200))
        .open()
        .expect("failed to open serial port");

    let config = Config::default();
    let controller = std::sync::Arc::new(Controller::new(
        SerialTransport { port: Mutex::new(port.try_clone().expect("clone port for tx")) },
        PeriodicTimer,
        LoggingCallbacks,
        config,
    ));

    {
        let controller = controller.clone();
        let period = config.timer_period;
        thread::spawn(move || loop {
            thread::sleep(period);
            controller.on_timer();
        });
    }

    {
        let controller = controller.clone();
        let mut rx_port = port;
        thread::spawn(move || {
            let mut buf = [0u8; 256];
            loop {
                match rx_port.read(&mut buf) {
                    Ok(0) => {}
                    Ok(n) => controller.on_rx(&buf[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) => {
                        warn!("serial read error: {e}");
                        break;
                    }
                }
            }
        });
    }

    thread::sleep(Duration::from_millis(500));
    controller
        .send_frame(b"hello over the wire".to_vec())
        .expect("link connected");

    thread::sleep(Duration::from_secs(2));
}
