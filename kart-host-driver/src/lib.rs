// Host-side driver for the kart.
//
// Turns classified hand gestures (or manual button presses) into throttled
// drive commands over UDP, polls the vehicle for battery telemetry on a
// background thread, and derives link liveness from telemetry recency. All
// socket traffic shares one datagram channel; only the battery poller ever
// receives on it. See ../examples for a runnable integration.

pub mod arbiter;
pub mod classifier;
pub mod config;
pub mod control;
pub mod telemetry;
pub mod transport;

pub use arbiter::CommandArbiter;
pub use classifier::{Hand, Landmark, classify, count_raised_fingers};
pub use config::DriverConfig;
pub use control::{ControlInput, Controller, TickReport};
pub use telemetry::{BatteryPoller, PollerHandle, SharedTelemetry, TelemetrySample};
pub use transport::{CommandTx, TelemetryIo, TransportError, UdpLink};
