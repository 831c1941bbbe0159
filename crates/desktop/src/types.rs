//! Wire and form types shared by the coordinator, the HTTP client and the CLI.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Format used for every date sent to the API.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Status filter choices offered to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusOption {
    /// Orders not yet exported (the normal daily run).
    #[default]
    NotExported,
    /// Every order in range, including ones already exported.
    All,
    /// Only orders that were exported before.
    Exported,
}

impl StatusOption {
    pub const ALL_OPTIONS: [StatusOption; 3] =
        [StatusOption::NotExported, StatusOption::All, StatusOption::Exported];

    /// Value sent as `status_filter`.
    pub fn value(&self) -> &'static str {
        match self {
            StatusOption::NotExported => "未出力",
            StatusOption::All => "all",
            StatusOption::Exported => "CSV出力済み",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusOption::NotExported => "Not exported only",
            StatusOption::All => "All (including re-export)",
            StatusOption::Exported => "Exported only",
        }
    }
}

/// Body of `POST /api/csv/export`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub start_date: String,
    pub end_date: String,
    pub status_filter: String,
    /// `None` on commit; the server treats a missing flag as `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<bool>,
}

/// First day of `today`'s month through `today`.
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    (first, today)
}
