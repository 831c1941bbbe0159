//! Sales orders domain module.
//!
//! Business rules for orders, order lines and the CSV export selection,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod delivery;
pub mod export;
pub mod order;
pub mod status;

pub use delivery::{DELIVERY_HISTORY_LIMIT, DeliveryRecord, normalize_customer_code};
pub use export::{
    CSV_HEADER, ExportBatch, ExportLine, ExportQuery, RenderError, export_file_name, render_csv,
};
pub use order::{ADJUSTMENT_PRODUCT_CODE, Order, OrderLine};
pub use status::{OrderStatus, StatusFilter};
