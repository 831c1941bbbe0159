use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use opsdesk_sales::{DELIVERY_HISTORY_LIMIT, normalize_customer_code};

use crate::app::{
    dto::{DeliveryHistoryQuery, DeliveryHistoryResponse},
    errors::json_error,
    services::AppServices,
};

/// `GET /api/delivery-history?customer_code=...`
pub async fn list_deliveries(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<DeliveryHistoryQuery>,
) -> Response {
    let Some(code) = normalize_customer_code(params.customer_code.as_deref()) else {
        return Json(DeliveryHistoryResponse { deliveries: vec![] }).into_response();
    };

    match services
        .deliveries
        .recent_deliveries(code, DELIVERY_HISTORY_LIMIT)
        .await
    {
        Ok(deliveries) => Json(DeliveryHistoryResponse { deliveries }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, customer_code = code, "delivery history lookup failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "failed to load delivery history",
            )
        }
    }
}
