use std::fs;

use livelink_asset::plan_payload;

use crate::cmd::PlanArgs;
use crate::exit::{asset_error, io_error, CliResult, SUCCESS};
use crate::output::{print_plans, print_raw, OutputFormat};

pub fn run(args: PlanArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;

    if let OutputFormat::Raw = format {
        print_raw(&payload);
        return Ok(SUCCESS);
    }

    let plans = plan_payload(&payload).map_err(|err| asset_error("invalid payload", err))?;
    print_plans(&plans, format);
    Ok(SUCCESS)
}
