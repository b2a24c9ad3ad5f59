use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use livelink_frame::FramingMode;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod plan;
pub mod send;
pub mod serve;
pub mod stop;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Listen for asset payloads and print their import plans.
    Serve(ServeArgs),
    /// Send one payload to a listener.
    Send(SendArgs),
    /// Ask a listener to stop.
    Stop(StopArgs),
    /// Print the import plan of a payload file without a listener.
    Plan(PlanArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Stop(args) => stop::run(args),
        Command::Plan(args) => plan::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Wire format selector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Framing {
    /// Connection-delimited payloads and the `Bye Megascans` stop token.
    #[default]
    Legacy,
    /// Length-prefixed frames with an explicit stop frame.
    Prefixed,
}

impl From<Framing> for FramingMode {
    fn from(framing: Framing) -> Self {
        match framing {
            Framing::Legacy => FramingMode::Legacy,
            Framing::Prefixed => FramingMode::LengthPrefixed,
        }
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Listener address.
    #[arg(long, default_value = "127.0.0.1:28888", env = "LIVELINK_ADDR")]
    pub addr: SocketAddr,
    /// Wire format.
    #[arg(long, value_enum, default_value_t = Framing::Legacy)]
    pub framing: Framing,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Queue up to N unpolled payloads instead of keeping only the latest.
    #[arg(long, value_name = "N")]
    pub queue: Option<usize>,
    /// Scheduler poll cadence (e.g. 1s, 200ms).
    #[arg(long, default_value = "1s")]
    pub poll_interval: String,
    /// Exit after importing N payloads.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// JSON payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Connect and write timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Connect and write timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Payload file (JSON array of assets).
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
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
