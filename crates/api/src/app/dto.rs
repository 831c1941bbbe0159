use serde::{Deserialize, Serialize};

use opsdesk_sales::DeliveryRecord;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /api/csv/export`.
///
/// Every field is optional at the JSON level so that missing dates produce our
/// own 400 message instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status_filter: Option<String>,
    #[serde(default)]
    pub preview: Option<bool>,
}

impl ExportRequest {
    pub fn is_preview(&self) -> bool {
        self.preview.unwrap_or(false)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryHistoryQuery {
    pub customer_code: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct DeliveryHistoryResponse {
    pub deliveries: Vec<DeliveryRecord>,
}
