//! Battery telemetry polling and link liveness.
//!
//! The poller runs on its own thread because each round blocks on the
//! socket for up to the receive timeout, which must never stall the
//! control loop. It is the single owner of the receive capability
//! ([`crate::transport::TelemetryIo`]) and the single writer of the shared
//! [`TelemetrySample`].

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use kart_messages::{TELEMETRY_REQUEST, parse_battery_reply};

use crate::transport::{TelemetryIo, TransportError};

// Granularity of shutdown-flag checks while waiting out the poll period.
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Last known battery reading and when it arrived.
///
/// Only a successful, well-formed reply advances `last_reply_at`; a stale
/// battery value is kept in preference to none at all.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySample {
    battery: Option<String>,
    last_reply_at: Option<Instant>,
}

impl TelemetrySample {
    /// Battery percentage for display, `"N/A"` before the first reply.
    pub fn battery_display(&self) -> &str {
        self.battery.as_deref().unwrap_or("N/A")
    }

    /// Connection state, derived on demand from reply recency. The link
    /// counts as down once the liveness window elapses with no reply, and
    /// comes back only on the next successful reply.
    pub fn is_connected(&self, now: Instant, liveness_window: Duration) -> bool {
        match self.last_reply_at {
            Some(reply_at) => now.duration_since(reply_at) < liveness_window,
            None => false,
        }
    }

    fn record_reply(&mut self, battery: String, now: Instant) {
        self.battery = Some(battery);
        self.last_reply_at = Some(now);
    }
}

/// Handle for reading the poller's latest sample from other threads.
pub type SharedTelemetry = Arc<Mutex<TelemetrySample>>;

/// Periodic battery poller over the telemetry half of the link.
pub struct BatteryPoller {
    io: TelemetryIo,
    sample: SharedTelemetry,
    poll_period: Duration,
}

impl BatteryPoller {
    pub fn new(io: TelemetryIo, poll_period: Duration) -> Self {
        Self {
            io,
            sample: SharedTelemetry::default(),
            poll_period,
        }
    }

    /// Shared handle to the sample this poller updates.
    pub fn sample(&self) -> SharedTelemetry {
        Arc::clone(&self.sample)
    }

    /// Start the poll loop on a named background thread.
    pub fn spawn(self) -> io::Result<PollerHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("battery-poller".into())
            .spawn(move || self.run(&stop_flag))?;
        Ok(PollerHandle { stop, handle })
    }

    fn run(self, stop: &AtomicBool) {
        info!(period = ?self.poll_period, "battery poller started");
        let mut buf = [0u8; 64];
        while !stop.load(Ordering::Relaxed) {
            self.poll_once(&mut buf);

            // Wait out the period in slices so shutdown stays prompt.
            let mut waited = Duration::ZERO;
            while waited < self.poll_period && !stop.load(Ordering::Relaxed) {
                let slice = SHUTDOWN_CHECK_INTERVAL.min(self.poll_period - waited);
                thread::sleep(slice);
                waited += slice;
            }
        }
        info!("battery poller stopped");
    }

    /// One request/await-reply round. Every failure mode is handled here;
    /// a failed round never terminates the loop.
    fn poll_once(&self, buf: &mut [u8]) {
        if let Err(err) = self.io.send(&[TELEMETRY_REQUEST]) {
            warn!("battery request failed: {err}");
            return;
        }
        match self.io.recv(buf) {
            Ok(len) => match parse_battery_reply(&buf[..len]) {
                Ok(battery) => {
                    debug!(%battery, "battery reply");
                    self.sample
                        .lock()
                        .unwrap()
                        .record_reply(battery, Instant::now());
                }
                Err(err) => warn!("discarding battery reply: {err}"),
            },
            // No reply this round; the previous value stands and liveness
            // is left to age out.
            Err(TransportError::Timeout) => {}
            Err(err) => warn!("battery receive failed: {err}"),
        }
    }
}

/// Cancellation + join handle for the poller thread.
pub struct PollerHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the poller to stop and wait for its thread to exit. Call
    /// before dropping whatever owns the socket's command half.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.handle.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;

    use crate::transport::UdpLink;

    const WINDOW: Duration = Duration::from_secs(6);

    #[test]
    fn sample_starts_disconnected_with_no_reading() {
        let sample = TelemetrySample::default();
        assert_eq!(sample.battery_display(), "N/A");
        assert!(!sample.is_connected(Instant::now(), WINDOW));
    }

    #[test]
    fn liveness_ages_out_and_recovers() {
        let mut sample = TelemetrySample::default();
        let start = Instant::now();

        sample.record_reply("87".to_owned(), start);
        assert!(sample.is_connected(start + Duration::from_secs(5), WINDOW));
        // Window elapsed with no further reply: down, value retained.
        assert!(!sample.is_connected(start + Duration::from_secs(6), WINDOW));
        assert_eq!(sample.battery_display(), "87");

        // Back up strictly after the next successful reply.
        sample.record_reply("86".to_owned(), start + Duration::from_secs(10));
        assert!(sample.is_connected(start + Duration::from_secs(11), WINDOW));
    }

    #[test]
    fn poll_round_updates_the_shared_sample() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        vehicle
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let link = UdpLink::bind(vehicle.local_addr().unwrap(), Duration::from_millis(500)).unwrap();
        let (_command_tx, telemetry_io) = link.split();

        let poller = BatteryPoller::new(telemetry_io, Duration::from_secs(3));
        let sample = poller.sample();

        let responder = thread::spawn(move || {
            let mut buf = [0u8; 16];
            let (len, src) = vehicle.recv_from(&mut buf).unwrap();
            assert_eq!(&buf[..len], b"V");
            vehicle.send_to(b"87%", src).unwrap();
        });

        let mut buf = [0u8; 64];
        poller.poll_once(&mut buf);
        responder.join().unwrap();

        let sample = sample.lock().unwrap();
        assert_eq!(sample.battery_display(), "87");
        assert!(sample.is_connected(Instant::now(), WINDOW));
    }

    #[test]
    fn timeout_round_leaves_sample_untouched() {
        // Peer that never answers.
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        let link = UdpLink::bind(vehicle.local_addr().unwrap(), Duration::from_millis(50)).unwrap();
        let (_command_tx, telemetry_io) = link.split();

        let poller = BatteryPoller::new(telemetry_io, Duration::from_secs(3));
        let sample = poller.sample();

        let mut buf = [0u8; 64];
        poller.poll_once(&mut buf);

        let sample = sample.lock().unwrap();
        assert_eq!(sample.battery_display(), "N/A");
        assert!(sample.last_reply_at.is_none());
    }

    #[test]
    fn malformed_reply_updates_neither_value_nor_liveness() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        vehicle
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let link = UdpLink::bind(vehicle.local_addr().unwrap(), Duration::from_millis(500)).unwrap();
        let (_command_tx, telemetry_io) = link.split();

        let poller = BatteryPoller::new(telemetry_io, Duration::from_secs(3));
        let sample = poller.sample();

        let responder = thread::spawn(move || {
            let mut buf = [0u8; 16];
            let (_, src) = vehicle.recv_from(&mut buf).unwrap();
            vehicle.send_to(b"xx", src).unwrap();
        });

        let mut buf = [0u8; 64];
        poller.poll_once(&mut buf);
        responder.join().unwrap();

        let sample = sample.lock().unwrap();
        assert_eq!(sample.battery_display(), "N/A");
        assert!(sample.last_reply_at.is_none());
    }

    #[test]
    fn shutdown_signals_and_joins() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        let link = UdpLink::bind(vehicle.local_addr().unwrap(), Duration::from_millis(50)).unwrap();
        let (_command_tx, telemetry_io) = link.split();

        let poller = BatteryPoller::new(telemetry_io, Duration::from_secs(3));
        let handle = poller.spawn().unwrap();
        // Returns promptly even though the poll period is long.
        handle.shutdown();
    }
}
