//! Per-tick orchestration.
//!
//! The presentation layer drives one tick per frame or UI event, feeding in
//! exactly one input source and reading back a snapshot of command, battery
//! and connection state. The controller never blocks: command sends are
//! fire-and-forget and the telemetry sample is read from the poller's
//! shared state.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use tracing::warn;

use kart_messages::Command;

use crate::arbiter::CommandArbiter;
use crate::classifier::{Hand, classify};
use crate::config::DriverConfig;
use crate::telemetry::SharedTelemetry;
use crate::transport::CommandTx;

const SPEED_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

/// One tick's input, resolved from exactly one source. Gesture and manual
/// control are never blended; the caller owns the mode selection and builds
/// the matching variant.
pub enum ControlInput {
    /// Hands detected this frame (possibly none). Classified on tick.
    Gesture(Vec<Hand>),
    /// A command picked directly by the user.
    Manual(Command),
}

/// Snapshot handed to the presentation layer after each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The command this tick resolved to.
    pub command: Command,
    /// Set when a packet actually went out (for feedback animation).
    pub sent: Option<Command>,
    /// Battery percentage for display, `"N/A"` before the first reply.
    pub battery: String,
    pub connected: bool,
}

/// Ties the command path, the poller's shared sample and the session
/// configuration together behind a single tick entry point.
pub struct Controller {
    arbiter: CommandArbiter,
    telemetry: SharedTelemetry,
    config: DriverConfig,
}

impl Controller {
    pub fn new(tx: CommandTx, telemetry: SharedTelemetry, config: DriverConfig) -> Self {
        Self {
            arbiter: CommandArbiter::new(tx, config.throttle),
            telemetry,
            config,
        }
    }

    /// Resolve the input to a command, run the transmission policy and
    /// report current state. Transport failures are logged and surface only
    /// as `sent: None`; the next tick retries.
    pub fn tick(&mut self, input: ControlInput, now: Instant) -> TickReport {
        let command = match input {
            ControlInput::Gesture(hands) => classify(&hands),
            ControlInput::Manual(command) => command,
        };

        let sent = match self.arbiter.tick(command, now) {
            Ok(sent) => sent,
            Err(err) => {
                warn!("command send failed: {err}");
                None
            }
        };

        let sample = self.telemetry.lock().unwrap().clone();
        TickReport {
            command,
            sent,
            battery: sample.battery_display().to_owned(),
            connected: sample.is_connected(now, self.config.liveness_window),
        }
    }

    /// Forward the user's speed setting to the vehicle's HTTP configuration
    /// endpoint, rescaled into the 100..=255 range the vehicle's own web UI
    /// uses. Best-effort: failures are logged and swallowed.
    pub fn set_speed(&self, value: u8) {
        let mapped = 100 + (u32::from(value) * 155) / 255;
        let path = format!("/setSpeed?value={mapped}");
        if let Err(err) = http_get(self.config.speed_endpoint, &path) {
            warn!("speed update failed: {err}");
        }
    }
}

// The vehicle serves a one-line HTTP interface; a plain GET request line
// over a short-timeout stream is all it needs. The response is ignored.
fn http_get(endpoint: SocketAddr, path: &str) -> io::Result<()> {
    let mut stream = TcpStream::connect_timeout(&endpoint, SPEED_REQUEST_TIMEOUT)?;
    stream.set_write_timeout(Some(SPEED_REQUEST_TIMEOUT))?;
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        endpoint.ip()
    )?;
    stream.flush()
}
