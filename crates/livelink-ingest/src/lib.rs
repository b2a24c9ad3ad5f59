//! Asset ingestion server for LiveLink host add-ons.
//!
//! An [`IngestionController`] owns three moving parts:
//! - a [`SessionListener`] thread that accepts one producer connection at a
//!   time and turns its bytes into complete payloads,
//! - a [`LivenessMonitor`] thread that stops the listener once the host's
//!   primary thread is gone,
//! - a [`Mailbox`] the host drains from its cooperative scheduler through
//!   [`IngestionController::poll_once`].
//!
//! Payloads are opaque here; a [`PayloadImporter`] supplied by the host turns
//! them into scene objects.

pub mod config;
pub mod controller;
pub mod error;
pub mod importer;
pub mod listener;
pub mod mailbox;
pub mod monitor;
pub mod scheduler;
pub mod shutdown;

pub use config::{DeliveryPolicy, IngestConfig};
pub use controller::{IngestionController, PollOutcome};
pub use error::{ImportError, IngestError, Result};
pub use importer::{importer_fn, FnImporter, PayloadImporter};
pub use listener::{ListenerExit, SessionListener};
pub use mailbox::Mailbox;
pub use monitor::{
    probe_fn, FnProbe, LivenessMonitor, LivenessProbe, MonitorCancel, MonitorExit,
    PrimaryLiveness, PrimaryThreadGuard,
};
pub use scheduler::{HostScheduler, RecurringCallback, TickControl, TickScheduler};
pub use shutdown::ShutdownSignal;
