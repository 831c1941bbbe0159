//! `opsdesk-desktop`
//!
//! **Responsibility:** operator-side CSV export client.
//!
//! This crate provides:
//! - the export coordinator (preview, commit, displayed counts)
//! - a `reqwest` client for the export endpoint
//! - saving committed files to disk
//!
//! The client is a **thin shell** around the opsdesk API; the server owns
//! selection and status changes.

pub mod api;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod download;
pub mod error;
pub mod notify;
pub mod types;

pub use api::{ApiResponse, ExportApi, ExportClient};
pub use config::ClientConfig;
pub use coordinator::{CommitOutcome, CoordinatorState, ExportCoordinator};
pub use download::{DirectorySink, FileSink};
pub use error::ExportError;
pub use notify::{Notifier, TerminalNotifier};
pub use types::{ExportRequest, StatusOption};
