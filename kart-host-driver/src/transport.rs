//! Shared UDP channel to the vehicle.
//!
//! One socket carries both fire-and-forget commands and the telemetry
//! request/reply cycle. UDP gives no request/reply correlation, so replies
//! are matched to requests purely by temporal adjacency. That only holds if
//! a single actor ever receives: [`UdpLink::split`] hands out a send-only
//! half for the command path and keeps the receive capability on the
//! telemetry half alone.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// No datagram arrived within the configured receive timeout. Expected
    /// during normal operation, simply means no data this round.
    #[error("receive timed out")]
    Timeout,
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// A bound UDP socket connected to the vehicle's fixed control endpoint.
pub struct UdpLink {
    socket: UdpSocket,
}

impl UdpLink {
    /// Bind an ephemeral local port and connect it to the peer. This is the
    /// only process-fatal failure point in the driver.
    pub fn bind(peer: SocketAddr, recv_timeout: Duration) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(peer)?;
        socket.set_read_timeout(Some(recv_timeout))?;
        Ok(Self { socket })
    }

    /// Split into the command half and the telemetry half. Both send on the
    /// same socket; only [`TelemetryIo`] can receive.
    pub fn split(self) -> (CommandTx, TelemetryIo) {
        let socket = Arc::new(self.socket);
        (
            CommandTx {
                socket: Arc::clone(&socket),
            },
            TelemetryIo { socket },
        )
    }
}

/// Send-only handle used by the command path.
pub struct CommandTx {
    socket: Arc<UdpSocket>,
}

impl CommandTx {
    /// Best-effort datagram send, no delivery guarantee.
    pub fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.socket.send(payload)?;
        Ok(())
    }
}

/// Send+receive handle owned by the battery poller.
pub struct TelemetryIo {
    socket: Arc<UdpSocket>,
}

impl TelemetryIo {
    pub fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.socket.send(payload)?;
        Ok(())
    }

    /// Blocking receive bounded by the link's configured timeout.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.socket.recv(buf) {
            Ok(len) => Ok(len),
            // WouldBlock on unix, TimedOut on windows
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Err(TransportError::Timeout)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_peer() -> (UdpSocket, SocketAddr) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let addr = peer.local_addr().unwrap();
        (peer, addr)
    }

    #[test]
    fn split_halves_share_one_socket() {
        let (peer, addr) = loopback_peer();
        let link = UdpLink::bind(addr, Duration::from_millis(100)).unwrap();
        let (command_tx, telemetry_io) = link.split();

        command_tx.send(b"F").unwrap();
        telemetry_io.send(b"V").unwrap();

        let mut buf = [0u8; 16];
        let (len, first_src) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"F");
        let (len, second_src) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"V");
        // Same local port for both halves.
        assert_eq!(first_src, second_src);
    }

    #[test]
    fn recv_round_trips_a_reply() {
        let (peer, addr) = loopback_peer();
        let link = UdpLink::bind(addr, Duration::from_millis(500)).unwrap();
        let (_command_tx, telemetry_io) = link.split();

        telemetry_io.send(b"V").unwrap();
        let mut buf = [0u8; 16];
        let (_, src) = peer.recv_from(&mut buf).unwrap();
        peer.send_to(b"87", src).unwrap();

        let len = telemetry_io.recv(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"87");
    }

    #[test]
    fn recv_times_out_when_nothing_arrives() {
        let (_peer, addr) = loopback_peer();
        let link = UdpLink::bind(addr, Duration::from_millis(50)).unwrap();
        let (_command_tx, telemetry_io) = link.split();

        let mut buf = [0u8; 16];
        assert!(matches!(
            telemetry_io.recv(&mut buf),
            Err(TransportError::Timeout)
        ));
    }
}
