use tracing::info;

use crate::cmd::send::connect_writer;
use crate::cmd::{parse_duration, StopArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};

pub fn run(args: StopArgs) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut writer = connect_writer(&args.link, timeout)?;

    writer
        .send_stop()
        .and_then(|()| writer.finish())
        .map_err(|err| frame_error("stop failed", err))?;

    info!(addr = %args.link.addr, "stop request sent");
    Ok(SUCCESS)
}
