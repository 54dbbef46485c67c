use linkvisor_transport::UnixDomainSocket;
use tracing::info;

use crate::cmd::{session, ServeArgs};
use crate::exit::{transport_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.link.to_config()?;
    let socket =
        UnixDomainSocket::bind(&args.path).map_err(|err| transport_error("bind failed", err))?;
    let label = args.path.display().to_string();

    info!(path = %label, "waiting for peer");
    let stream = socket
        .accept()
        .map_err(|err| transport_error("accept failed", err))?;

    let running = session::install_ctrlc_handler()?;
    let handler = session::open(stream, config, &label, format, args.echo)?;
    let outcome = session::wait(&handler, &running, None);
    session::finish(handler, outcome, &label, format)
}
