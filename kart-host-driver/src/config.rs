//! Driver tuning.

use std::net::SocketAddr;
use std::time::Duration;

/// Fixed endpoints and timing constants for one driving session. Immutable
/// for the life of the process.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The vehicle's UDP control/telemetry endpoint.
    pub peer: SocketAddr,
    /// Read timeout on the shared socket.
    pub recv_timeout: Duration,
    /// Minimum interval between re-sends of an unchanged command.
    pub throttle: Duration,
    /// Battery poll period.
    pub poll_period: Duration,
    /// Maximum telemetry silence before the link counts as down.
    pub liveness_window: Duration,
    /// The vehicle's HTTP endpoint for out-of-band configuration.
    pub speed_endpoint: SocketAddr,
}

impl DriverConfig {
    /// Defaults matching the vehicle firmware's expectations: 300 ms socket
    /// timeout, 0.5 s command throttle, 3 s battery poll, 6 s liveness
    /// window, HTTP configuration on port 80 of the same host.
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            recv_timeout: Duration::from_millis(300),
            throttle: Duration::from_millis(500),
            poll_period: Duration::from_secs(3),
            liveness_window: Duration::from_secs(6),
            speed_endpoint: SocketAddr::new(peer.ip(), 80),
        }
    }
}
