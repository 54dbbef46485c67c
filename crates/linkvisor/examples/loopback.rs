//! Two supervised links wired back to back over in-memory pipes.
//!
//! Run with:
//!   cargo run --example loopback
//!
//! Side A drops the wire half-way through. Its supervisor notices the missing
//! PONG, restarts both pipes, and the link carries payloads again.

use std::io::Read;
use std::thread;
use std::time::Duration;

use linkvisor::engine::{payload_fn, LinkConfig, LinkHandler, RestartPipes};
use linkvisor::frame::read_payload;
use linkvisor::transport::{pipe, LinkChannels};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (a_out, b_in) = pipe();
    let (b_out, a_in) = pipe();
    let wires = [a_out.control(), b_out.control()];

    let config = LinkConfig::default()
        .with_heartbeat_period(Duration::from_millis(200))
        .with_reply_deadline(Duration::from_millis(300));

    let printer = |side: &'static str| {
        payload_fn(move |_link: &LinkHandler, inbound: &mut dyn Read, size: u32| {
            let payload = read_payload(inbound, size)?;
            eprintln!("{side} received {:?}", String::from_utf8_lossy(&payload));
            Ok(())
        })
    };

    let a = LinkHandler::init(
        LinkChannels::new(a_in, a_out),
        config.clone(),
        printer("A"),
        RestartPipes::new(wires.clone()),
    )?;
    let b = LinkHandler::init(
        LinkChannels::new(b_in, b_out),
        config,
        printer("B"),
        RestartPipes::new(wires.clone()),
    )?;
    a.start()?;
    b.start()?;

    thread::sleep(Duration::from_secs(1));
    a.write(b"before the outage")?;

    eprintln!("dropping the B -> A wire");
    wires[1].stop();
    thread::sleep(Duration::from_secs(2));

    a.write(b"after the reset")?;
    thread::sleep(Duration::from_millis(500));

    eprintln!("A: {:?}", a.stats());
    eprintln!("B: {:?}", b.stats());
    a.stop()?;
    b.stop()?;
    Ok(())
}
