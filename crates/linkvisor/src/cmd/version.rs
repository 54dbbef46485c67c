use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("linkvisor {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: linkvisor");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LINKVISOR_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "defaults: heartbeat={:?} deadline={:?} mailbox={}",
        linkvisor_engine::DEFAULT_HEARTBEAT_PERIOD,
        linkvisor_engine::DEFAULT_REPLY_DEADLINE,
        linkvisor_engine::DEFAULT_MAILBOX_CAPACITY
    );
    println!("unix_sockets: {}", cfg!(unix));

    Ok(SUCCESS)
}
