use std::fs;
use std::time::Duration;

use livelink_frame::{FrameConfig, FramingMode, PayloadWriter};
use livelink_transport::{LinkStream, TcpEndpoint};
use tracing::info;

use crate::cmd::{parse_duration, LinkArgs, SendArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let payload = resolve_payload(&args)?;

    let writer = connect_writer(&args.link, timeout)?;
    deliver(writer, &payload).map_err(|err| frame_error("send failed", err))?;

    info!(
        addr = %args.link.addr,
        framing = %FramingMode::from(args.link.framing),
        size = payload.len(),
        "payload sent"
    );
    Ok(SUCCESS)
}

/// Connect to the listener with `timeout` applied to connect and writes.
pub(crate) fn connect_writer(
    link: &LinkArgs,
    timeout: Duration,
) -> CliResult<PayloadWriter<LinkStream>> {
    let stream = TcpEndpoint::connect_timeout(link.addr, timeout)
        .map_err(|err| transport_error("connect failed", err))?;
    let config = FrameConfig {
        write_timeout: Some(timeout),
        ..FrameConfig::default()
    };
    PayloadWriter::with_config_link(stream, link.framing.into(), config)
        .map_err(|err| frame_error("connect failed", err))
}

fn deliver(
    mut writer: PayloadWriter<LinkStream>,
    payload: &[u8],
) -> livelink_frame::Result<()> {
    writer.send_payload(payload)?;
    // Legacy payloads end with the connection; prefixed ones with the frame.
    writer.finish()
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    use super::*;
    use crate::cmd::Framing;

    fn args(json: Option<&str>, data: Option<&str>, file: Option<PathBuf>) -> SendArgs {
        SendArgs {
            link: LinkArgs {
                addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 28888)),
                framing: Framing::Legacy,
            },
            json: json.map(str::to_string),
            data: data.map(str::to_string),
            file,
            timeout: "1s".to_string(),
        }
    }

    #[test]
    fn resolve_payload_validates_json() {
        assert_eq!(
            resolve_payload(&args(Some(r#"[{"id":"x"}]"#), None, None)).unwrap(),
            br#"[{"id":"x"}]"#
        );
        let err = resolve_payload(&args(Some("{nope"), None, None)).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn resolve_payload_defaults_to_empty() {
        assert!(resolve_payload(&args(None, None, None)).unwrap().is_empty());
        assert_eq!(
            resolve_payload(&args(None, Some("part1part2"), None)).unwrap(),
            b"part1part2"
        );
    }

    #[test]
    fn resolve_payload_reports_missing_file() {
        let missing = std::env::temp_dir().join("livelink-send-missing.json");
        let err = resolve_payload(&args(None, None, Some(missing))).unwrap_err();
        assert!(err.message.contains("failed reading"));
    }
}
