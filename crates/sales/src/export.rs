//! CSV export selection and rendering.
//!
//! The selection rule lives here once and is shared by every caller: the
//! in-memory store evaluates [`ExportQuery::matches`] directly, and the
//! Postgres store binds [`ExportQuery::range`] / [`StatusFilter::required_status`]
//! into the equivalent SQL. Preview and commit therefore always see the same rows.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opsdesk_core::{DateRange, DomainError, DomainResult, LineId, OrderId};

use crate::order::{Order, OrderLine};
use crate::status::{OrderStatus, StatusFilter};

/// Column labels, in output order.
pub const CSV_HEADER: [&str; 11] = [
    "order_id",
    "order_date",
    "customer_code",
    "customer_name",
    "line_id",
    "product_code",
    "product_name",
    "quantity",
    "unit_price",
    "amount",
    "status",
];

/// Filter for one export call (preview or commit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportQuery {
    pub range: DateRange,
    pub status: StatusFilter,
}

impl ExportQuery {
    pub fn new(range: DateRange, status: StatusFilter) -> Self {
        Self { range, status }
    }

    /// Build a query from raw request fields.
    pub fn from_request(
        start_date: Option<&str>,
        end_date: Option<&str>,
        status_filter: Option<&str>,
    ) -> DomainResult<Self> {
        let (start, end) = match (non_blank(start_date), non_blank(end_date)) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(DomainError::validation("start_date and end_date are required")),
        };
        Ok(Self {
            range: DateRange::parse(start, end)?,
            status: StatusFilter::from_request(status_filter),
        })
    }

    /// Whether `line` (belonging to `order`) is part of the export.
    pub fn matches(&self, order: &Order, line: &OrderLine) -> bool {
        line.order_id == order.id
            && !line.is_adjustment()
            && self.range.contains(order.order_date)
            && self.status.matches(&order.status)
    }

    /// Evaluate the query over in-memory rows.
    pub fn select<'a>(
        &self,
        orders: impl IntoIterator<Item = &'a Order>,
        lines: impl IntoIterator<Item = &'a OrderLine>,
    ) -> ExportBatch {
        let orders: HashMap<OrderId, &Order> = orders.into_iter().map(|o| (o.id, o)).collect();
        let selected = lines
            .into_iter()
            .filter_map(|line| {
                let order = orders.get(&line.order_id)?;
                self.matches(order, line).then(|| ExportLine::from_parts(order, line))
            })
            .collect();
        ExportBatch::from_lines(selected)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One exported row: an order line joined with its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLine {
    pub order_id: OrderId,
    pub order_date: NaiveDate,
    pub customer_code: String,
    pub customer_name: String,
    pub line_id: LineId,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    /// Order status at selection time.
    pub status: OrderStatus,
}

impl ExportLine {
    pub fn from_parts(order: &Order, line: &OrderLine) -> Self {
        Self {
            order_id: order.id,
            order_date: order.order_date,
            customer_code: order.customer_code.clone(),
            customer_name: order.customer_name.clone(),
            line_id: line.id,
            product_code: line.product_code.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            status: order.status.clone(),
        }
    }

    pub fn amount(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }

    fn record(&self) -> [String; 11] {
        [
            self.order_id.to_string(),
            self.order_date.format(opsdesk_core::date_range::ISO_DATE_FORMAT).to_string(),
            self.customer_code.clone(),
            self.customer_name.clone(),
            self.line_id.to_string(),
            self.product_code.clone(),
            self.product_name.clone(),
            self.quantity.to_string(),
            self.unit_price.to_string(),
            self.amount().to_string(),
            self.status.as_str().to_string(),
        ]
    }
}

/// The rows selected by one export call, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportBatch {
    lines: Vec<ExportLine>,
}

impl ExportBatch {
    /// Sorts by order date, order id, line id.
    pub fn from_lines(mut lines: Vec<ExportLine>) -> Self {
        lines.sort_by(|a, b| {
            (a.order_date, a.order_id, a.line_id).cmp(&(b.order_date, b.order_id, b.line_id))
        });
        Self { lines }
    }

    pub fn lines(&self) -> &[ExportLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Distinct parent orders, ascending. These are the orders a commit marks.
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.lines
            .iter()
            .map(|l| l.order_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn render_csv(&self) -> Result<Vec<u8>, RenderError> {
        render_csv(&self.lines)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write csv record: {0}")]
    Write(#[from] csv::Error),
    #[error("failed to flush csv output: {0}")]
    Flush(String),
}

/// Render rows as CSV (header + one record per line, `\n` terminated).
pub fn render_csv(lines: &[ExportLine]) -> Result<Vec<u8>, RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for line in lines {
        writer.write_record(line.record())?;
    }
    writer
        .into_inner()
        .map_err(|e| RenderError::Flush(e.error().to_string()))
}

/// Deterministic download name for a range: `orders_YYYYMMDD_YYYYMMDD.csv`.
pub fn export_file_name(range: &DateRange) -> String {
    format!("orders_{}.csv", range.compact_label())
}
