// Example usage of kart-host-driver

// Drives the vehicle in manual mode from stdin. Gesture mode plugs into the
// same controller: feed ControlInput::Gesture(hands) with your hand
// detector's per-frame output instead of ControlInput::Manual.

use std::io::{self, BufRead};
use std::net::ToSocketAddrs;
use std::time::Instant;

use anyhow::Context;

use kart_host_driver::{BatteryPoller, ControlInput, Controller, DriverConfig, UdpLink};
use kart_messages::Command;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let peer = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.4.1:8888".to_owned());
    let peer = peer
        .to_socket_addrs()?
        .next()
        .context("Failed to resolve peer address")?;

    let config = DriverConfig::new(peer);
    let link = UdpLink::bind(config.peer, config.recv_timeout)?;
    let (command_tx, telemetry_io) = link.split();

    let poller = BatteryPoller::new(telemetry_io, config.poll_period);
    let telemetry = poller.sample();
    let poller = poller.spawn()?;

    let mut controller = Controller::new(command_tx, telemetry, config);

    println!("f/b/l/r/s to drive, \"speed <0-255>\" to set speed, q to quit");
    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();
        if input == "q" {
            break;
        }
        if let Some(value) = input.strip_prefix("speed ") {
            match value.trim().parse() {
                Ok(value) => controller.set_speed(value),
                Err(_) => println!("Speed must be 0-255"),
            }
            continue;
        }
        let command = match input {
            "f" => Command::Forward,
            "b" => Command::Backward,
            "l" => Command::Left,
            "r" => Command::Right,
            "s" => Command::Stop,
            _ => {
                println!("Unknown input {input:?}");
                continue;
            }
        };
        let report = controller.tick(ControlInput::Manual(command), Instant::now());
        println!(
            "{} | battery {}% | {}",
            report.command,
            report.battery,
            if report.connected {
                "connected"
            } else {
                "disconnected"
            }
        );
    }

    // Stop the poller before the socket goes away with it.
    poller.shutdown();
    Ok(())
}
