use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use livelink_asset::plan_payload;
use livelink_ingest::{
    importer_fn, DeliveryPolicy, ImportError, IngestConfig, IngestionController, ListenerExit,
    PrimaryThreadGuard, TickScheduler,
};
use tracing::{info, warn};

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{ingest_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_plans, print_raw, OutputFormat};

/// Upper bound on one idle wait, so Ctrl-C and remote stops are noticed
/// quickly.
const IDLE_TICK: Duration = Duration::from_millis(50);

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let poll_interval = parse_duration(&args.poll_interval)?;
    let mut config = IngestConfig::default()
        .with_addr(args.link.addr)
        .with_framing(args.link.framing.into())
        .with_poll_interval(poll_interval);
    if let Some(n) = args.queue {
        config = config.with_delivery(DeliveryPolicy::Bounded(n));
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    // This thread plays the host's primary thread.
    let (_guard, liveness) = PrimaryThreadGuard::new();
    let scheduler = TickScheduler::new();
    let imported = Arc::new(AtomicUsize::new(0));
    let importer = payload_printer(format, Arc::clone(&imported));

    let mut controller = IngestionController::start(config, importer, liveness, &scheduler)
        .map_err(|err| ingest_error("serve failed", err))?;

    while running.load(Ordering::SeqCst) {
        scheduler.run_pending();

        if !controller.is_listening() {
            break;
        }
        if let Some(count) = args.count {
            if imported.load(Ordering::SeqCst) >= count {
                break;
            }
        }

        let wait = scheduler
            .next_due()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_TICK)
            .min(IDLE_TICK);
        thread::sleep(wait);
    }

    let exit = controller.stop();
    while !controller.poll_once().is_empty() {}

    match exit {
        Some(ListenerExit::RemoteStop) => info!("listener stopped by producer"),
        Some(ListenerExit::Cancelled) => info!("listener stopped"),
        None => {
            return Err(CliError::new(INTERNAL, "listener thread terminated abnormally"));
        }
    }
    Ok(SUCCESS)
}

/// Importer that prints each payload's import plans instead of building
/// scene objects.
fn payload_printer(
    format: OutputFormat,
    imported: Arc<AtomicUsize>,
) -> impl livelink_ingest::PayloadImporter {
    importer_fn(move |payload: &Bytes| {
        if let OutputFormat::Raw = format {
            print_raw(payload);
        } else {
            let plans = plan_payload(payload).map_err(|err| {
                warn!(size = payload.len(), error = %err, "payload is not an asset list");
                ImportError::rejected(err)
            })?;
            print_plans(&plans, format);
        }
        imported.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
