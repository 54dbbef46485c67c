use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use linkvisor_engine::LinkConfig;
use linkvisor_frame::{ByteOrder, DEFAULT_MAX_PAYLOAD};

use crate::exit::{link_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

#[cfg(unix)]
pub mod connect;
#[cfg(unix)]
pub mod serve;
#[cfg(unix)]
pub mod session;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one peer on a Unix socket and supervise the link.
    Serve(ServeArgs),
    /// Connect to a peer, send payloads and supervise the link.
    Connect(ConnectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        #[cfg(unix)]
        Command::Serve(args) => serve::run(args, format),
        #[cfg(unix)]
        Command::Connect(args) => connect::run(args, format),
        #[cfg(not(unix))]
        Command::Serve(_) | Command::Connect(_) => {
            let _ = format;
            Err(CliError::new(
                USAGE,
                "unix domain sockets are not available on this platform",
            ))
        }
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ByteOrderArg {
    Little,
    Big,
}

impl From<ByteOrderArg> for ByteOrder {
    fn from(arg: ByteOrderArg) -> Self {
        match arg {
            ByteOrderArg::Little => ByteOrder::Little,
            ByteOrderArg::Big => ByteOrder::Big,
        }
    }
}

/// Link options shared by `serve` and `connect`.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Interval between heartbeat pings (e.g. 1s, 500ms).
    #[arg(long, env = "LINKVISOR_HEARTBEAT", default_value = "1s")]
    pub heartbeat: String,
    /// How long to wait for each pong (e.g. 1s, 500ms).
    #[arg(long, env = "LINKVISOR_DEADLINE", default_value = "1s")]
    pub deadline: String,
    /// Header byte order; both peers must agree.
    #[arg(long, value_enum, default_value = "little")]
    pub byte_order: ByteOrderArg,
    /// Largest payload accepted from the peer, in bytes.
    #[arg(long, env = "LINKVISOR_MAX_PAYLOAD", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

impl LinkArgs {
    pub fn to_config(&self) -> CliResult<LinkConfig> {
        let config = LinkConfig::default()
            .with_heartbeat_period(parse_duration(&self.heartbeat)?)
            .with_reply_deadline(parse_duration(&self.deadline)?)
            .with_byte_order(self.byte_order.into())
            .with_max_payload_size(self.max_payload);
        config
            .validate()
            .map_err(|err| link_error("invalid link options", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Send every received payload back to the peer.
    #[arg(long)]
    pub echo: bool,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Payload to send.
    #[arg(long)]
    pub data: Option<String>,
    /// Number of times to send the payload.
    #[arg(long, default_value_t = 1, requires = "data")]
    pub count: usize,
    /// Delay between payloads (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Exit after this long (e.g. 10s). Default: run until Ctrl-C or link loss.
    #[arg(long)]
    pub duration: Option<String>,
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
