//! Order and delivery-history storage abstractions.
//!
//! The stores are the only place order status is mutated. `commit_export` is
//! a single atomic unit: select, render, mark, commit. If rendering fails the
//! unit is abandoned and no order changes state.

use async_trait::async_trait;
use thiserror::Error;

use opsdesk_sales::{DeliveryRecord, ExportBatch, ExportQuery, RenderError};

pub mod in_memory;
pub mod postgres;

/// Renders a selected batch into the response body while the store still
/// holds its locks.
pub type CsvRenderer<'a> = &'a (dyn Fn(&ExportBatch) -> Result<Vec<u8>, RenderError> + Send + Sync);

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedExport {
    pub body: Vec<u8>,
    /// Number of CSV data rows in `body`.
    pub line_count: usize,
    /// Number of orders whose status was set to exported.
    pub orders_marked: u64,
}

/// Store operation error.
///
/// These are infrastructure errors; the API maps all of them to 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("order store unavailable: {0}")]
    Unavailable(String),

    #[error("export rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl StoreError {
    pub fn database(operation: &str, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Read-only selection; never mutates.
    async fn select_for_export(&self, query: &ExportQuery) -> Result<ExportBatch, StoreError>;

    /// Select, render and mark the parent orders of every selected line as
    /// exported, atomically.
    ///
    /// Returns `Ok(None)` (and changes nothing) when the selection is empty.
    async fn commit_export(
        &self,
        query: &ExportQuery,
        render: CsvRenderer<'_>,
    ) -> Result<Option<CommittedExport>, StoreError>;
}

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Up to `limit` records for `customer_code`, ascending by id.
    async fn recent_deliveries(
        &self,
        customer_code: &str,
        limit: usize,
    ) -> Result<Vec<DeliveryRecord>, StoreError>;
}
