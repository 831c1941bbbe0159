//! Export workflow: preview a filtered selection, then commit it to a file.
//!
//! The coordinator owns the operator's form state (date range, status filter)
//! and the two displayed results (preview count, last committed count). Each
//! action has its own busy flag; preview and commit may run at the same time,
//! but a second preview (or commit) while the first is still running is
//! rejected with [`ExportError::Busy`].
//!
//! Every filter change bumps a generation counter. A response that arrives
//! after the filters changed is still returned to the caller (and a committed
//! file is still saved), but it no longer updates the displayed counts.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::{ApiResponse, ExportApi};
use crate::download::{FileSink, file_name_from_disposition};
use crate::error::ExportError;
use crate::notify::Notifier;
use crate::types::{DATE_FORMAT, ExportRequest, StatusOption, default_range};

pub const EXPORTED_COUNT_HEADER: &str = "x-exported-count";
pub const LINE_COUNT_HEADER: &str = "x-line-count";
pub const CONTENT_DISPOSITION_HEADER: &str = "content-disposition";

const MISSING_DATES: &str = "start date and end date are required";
const PREVIEW_FAILED: &str = "preview failed";
const EXPORT_FAILED: &str = "CSV export failed";

/// Form state and displayed results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorState {
    pub start_date: String,
    pub end_date: String,
    pub status: StatusOption,
    /// Data rows matched by the last preview; `None` when unknown or stale.
    pub preview_count: Option<usize>,
    /// Orders marked by the last commit; `None` when stale.
    pub last_committed_count: Option<u64>,
    pub previewing: bool,
    pub committing: bool,
    generation: u64,
}

impl CoordinatorState {
    fn new(start_date: String, end_date: String) -> Self {
        Self {
            start_date,
            end_date,
            status: StatusOption::default(),
            preview_count: None,
            last_committed_count: None,
            previewing: false,
            committing: false,
            generation: 0,
        }
    }

    /// Commit is disabled only when a preview has shown there is nothing to export.
    pub fn can_commit(&self) -> bool {
        !self.committing && self.preview_count != Some(0)
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.preview_count = None;
        self.last_committed_count = None;
    }

    fn request(&self, preview: bool) -> Result<ExportRequest, ExportError> {
        let start = self.start_date.trim();
        let end = self.end_date.trim();
        if start.is_empty() || end.is_empty() {
            return Err(ExportError::validation(MISSING_DATES));
        }
        Ok(ExportRequest {
            start_date: start.to_string(),
            end_date: end.to_string(),
            status_filter: self.status.value().to_string(),
            preview: preview.then_some(true),
        })
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub file_name: String,
    pub path: PathBuf,
    pub exported_count: u64,
}

/// Body and metadata of a 2xx commit response.
struct CommittedFile {
    file_name: String,
    exported_count: u64,
    body: Vec<u8>,
}

pub struct ExportCoordinator {
    api: Arc<dyn ExportApi>,
    sink: Arc<dyn FileSink>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<CoordinatorState>,
}

impl ExportCoordinator {
    /// Start with the current month up to today and the "not exported" filter.
    pub fn new(api: Arc<dyn ExportApi>, sink: Arc<dyn FileSink>, notifier: Arc<dyn Notifier>) -> Self {
        let (start, end) = default_range(chrono::Local::now().date_naive());
        Self {
            api,
            sink,
            notifier,
            state: Mutex::new(CoordinatorState::new(
                start.format(DATE_FORMAT).to_string(),
                end.format(DATE_FORMAT).to_string(),
            )),
        }
    }

    pub async fn snapshot(&self) -> CoordinatorState {
        self.state.lock().await.clone()
    }

    pub async fn can_commit(&self) -> bool {
        self.state.lock().await.can_commit()
    }

    pub async fn set_start_date(&self, date: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.start_date = date.into();
        state.invalidate();
    }

    pub async fn set_end_date(&self, date: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.end_date = date.into();
        state.invalidate();
    }

    pub async fn set_status(&self, status: StatusOption) {
        let mut state = self.state.lock().await;
        state.status = status;
        state.invalidate();
    }

    /// Count the rows the current filters would export, without changing anything.
    pub async fn request_preview(&self) -> Result<usize, ExportError> {
        let (request, generation) = {
            let mut state = self.state.lock().await;
            if state.previewing {
                return Err(ExportError::Busy { action: "preview" });
            }
            let request = match state.request(true) {
                Ok(request) => request,
                Err(e) => {
                    self.notifier.error(&e.to_string());
                    return Err(e);
                }
            };
            state.previewing = true;
            state.last_committed_count = None;
            (request, state.generation)
        };

        let result = match self.api.export(&request).await {
            Ok(resp) => preview_count(&resp),
            Err(e) => Err(e),
        };

        {
            let mut state = self.state.lock().await;
            state.previewing = false;
            if state.generation == generation {
                state.preview_count = result.as_ref().ok().copied();
            }
        }

        match &result {
            Ok(0) => self.notifier.success("No matching orders in the selected range"),
            Ok(count) => {
                tracing::info!(count, start = %request.start_date, end = %request.end_date, "preview completed");
                self.notifier.success(&format!("{count} order lines will be exported"));
            }
            Err(e) => self.notifier.error(&e.to_string()),
        }
        result
    }

    /// Export the current selection, mark it as exported and save the file.
    ///
    /// Refused with [`ExportError::NoData`] and no request while the displayed
    /// preview count is 0 (see [`CoordinatorState::can_commit`]).
    pub async fn commit_export(&self) -> Result<CommitOutcome, ExportError> {
        let (request, generation) = {
            let mut state = self.state.lock().await;
            if state.committing {
                return Err(ExportError::Busy { action: "export" });
            }
            let request = match state.request(false) {
                Ok(request) => request,
                Err(e) => {
                    self.notifier.error(&e.to_string());
                    return Err(e);
                }
            };
            // A preview of the current filters already found nothing.
            if state.preview_count == Some(0) {
                let e = ExportError::NoData;
                self.notifier.error(&e.to_string());
                return Err(e);
            }
            state.committing = true;
            (request, state.generation)
        };

        let committed = match self.api.export(&request).await {
            Ok(resp) => committed_file(resp),
            Err(e) => Err(e),
        };
        // Orders are marked once the server answered 2xx, even if saving fails.
        let marked = committed.as_ref().ok().map(|file| file.exported_count);

        let result = committed.and_then(|file| {
            let path = self.sink.save(&file.file_name, &file.body)?;
            Ok(CommitOutcome {
                file_name: file.file_name,
                path,
                exported_count: file.exported_count,
            })
        });

        {
            let mut state = self.state.lock().await;
            state.committing = false;
            if let Some(count) = marked {
                if state.generation == generation {
                    state.last_committed_count = Some(count);
                    state.preview_count = None;
                }
            }
        }

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    file_name = %outcome.file_name,
                    exported = outcome.exported_count,
                    "export committed"
                );
                self.notifier.success(&format!(
                    "Downloaded {} ({} orders marked as exported)",
                    outcome.file_name, outcome.exported_count
                ));
            }
            Err(e) => self.notifier.error(&e.to_string()),
        }
        result
    }
}

fn preview_count(resp: &ApiResponse) -> Result<usize, ExportError> {
    if resp.status == 404 {
        return Ok(0);
    }
    if !resp.is_success() {
        return Err(request_error(resp, PREVIEW_FAILED));
    }
    if let Some(count) = resp.header(LINE_COUNT_HEADER).and_then(|v| v.trim().parse().ok()) {
        return Ok(count);
    }
    let text = String::from_utf8_lossy(&resp.body);
    Ok(text.trim().split('\n').count().saturating_sub(1))
}

fn committed_file(resp: ApiResponse) -> Result<CommittedFile, ExportError> {
    if resp.status == 404 {
        return Err(ExportError::NoData);
    }
    if !resp.is_success() {
        return Err(request_error(&resp, EXPORT_FAILED));
    }
    let exported_count = resp
        .header(EXPORTED_COUNT_HEADER)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);
    let file_name = file_name_from_disposition(resp.header(CONTENT_DISPOSITION_HEADER));
    Ok(CommittedFile {
        file_name,
        exported_count,
        body: resp.body,
    })
}

fn request_error(resp: &ApiResponse, fallback: &str) -> ExportError {
    ExportError::Request {
        status: resp.status,
        message: resp.error_message().unwrap_or_else(|| fallback.to_string()),
    }
}
