//! Command transmission policy.
//!
//! The vehicle holds whatever motion state it last heard, so the driver
//! re-announces the current command often enough to survive packet loss but
//! never floods the channel: a changed command goes out immediately, an
//! unchanged one is re-sent only once per throttle interval.

use std::time::{Duration, Instant};

use kart_messages::Command;

use crate::transport::{CommandTx, TransportError};

/// Level-triggered keep-alive sender for drive commands.
///
/// Time is passed in by the caller rather than read from the clock so the
/// policy stays deterministic under test.
pub struct CommandArbiter {
    tx: CommandTx,
    throttle: Duration,
    last_sent: Option<Command>,
    last_send_at: Option<Instant>,
}

impl CommandArbiter {
    pub fn new(tx: CommandTx, throttle: Duration) -> Self {
        Self {
            tx,
            throttle,
            last_sent: None,
            last_send_at: None,
        }
    }

    /// Transmit `command` if it differs from the last transmission or the
    /// keep-alive interval has elapsed. Returns the command when a packet
    /// actually went out.
    ///
    /// A failed send leaves the arbiter state untouched, so the next tick
    /// retries instead of silently considering the command delivered.
    pub fn tick(
        &mut self,
        command: Command,
        now: Instant,
    ) -> Result<Option<Command>, TransportError> {
        let due = match (self.last_sent, self.last_send_at) {
            (Some(last), Some(sent_at)) => {
                command != last || now.duration_since(sent_at) > self.throttle
            }
            // Nothing sent yet.
            _ => true,
        };
        if !due {
            return Ok(None);
        }
        self.tx.send(&[command.wire_code()])?;
        self.last_sent = Some(command);
        self.last_send_at = Some(now);
        Ok(Some(command))
    }
}
