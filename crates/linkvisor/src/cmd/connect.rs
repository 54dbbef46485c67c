use std::time::Instant;

use linkvisor_transport::UnixDomainSocket;
use tracing::debug;

use crate::cmd::{parse_duration, session, ConnectArgs};
use crate::exit::{link_error, transport_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.to_config()?;
    let interval = parse_duration(&args.interval)?;
    let until = args
        .duration
        .as_deref()
        .map(parse_duration)
        .transpose()?
        .map(|duration| Instant::now() + duration);

    let stream = UnixDomainSocket::connect(&args.path)
        .map_err(|err| transport_error("connect failed", err))?;
    let label = args.path.display().to_string();

    let running = session::install_ctrlc_handler()?;
    let handler = session::open(stream, config, &label, format, false)?;

    let mut remaining = if args.data.is_some() { args.count } else { 0 };
    let mut next_send = Instant::now();
    let outcome = loop {
        if let Some(outcome) = session::check(&handler, &running, until) {
            break outcome;
        }
        if remaining == 0 {
            break session::wait(&handler, &running, until);
        }
        if Instant::now() >= next_send {
            if let Some(data) = &args.data {
                let sent = handler
                    .write(data.as_bytes())
                    .map_err(|err| link_error("send failed", err))?;
                debug!(size = sent, remaining = remaining - 1, "payload sent");
            }
            remaining -= 1;
            next_send = Instant::now() + interval;
        }
        std::thread::sleep(interval.min(std::time::Duration::from_millis(50)));
    };

    session::finish(handler, outcome, &label, format)
}
