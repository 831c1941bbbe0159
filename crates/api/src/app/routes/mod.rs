use axum::{
    Router,
    routing::{get, post},
};

pub mod csv_export;
pub mod delivery_history;
pub mod system;

/// Router for every `/api` endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/api/csv/export", post(csv_export::export_csv))
        .route("/api/delivery-history", get(delivery_history::list_deliveries))
}
