use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("livelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: livelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LIVELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("default_addr: {}", livelink_transport::DEFAULT_ADDR);
    println!(
        "sentinel: {}",
        String::from_utf8_lossy(livelink_frame::DEFAULT_SENTINEL)
    );
    println!("framing: legacy, prefixed");

    Ok(SUCCESS)
}
