//! `POST /api/csv/export`: preview or commit an order-line CSV export.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use opsdesk_sales::{ExportBatch, ExportQuery, RenderError, export_file_name};

use crate::app::{
    dto::ExportRequest,
    errors::{domain_error_to_response, json_error, store_error_to_response},
    services::AppServices,
};

/// Number of orders marked as exported by a commit.
pub const EXPORTED_COUNT_HEADER: &str = "x-exported-count";
/// Number of CSV data rows in the body (preview and commit).
pub const LINE_COUNT_HEADER: &str = "x-line-count";

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const NO_DATA_MESSAGE: &str = "no orders match the requested range and status";

pub async fn export_csv(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text());
        }
    };

    let query = match ExportQuery::from_request(
        req.start_date.as_deref(),
        req.end_date.as_deref(),
        req.status_filter.as_deref(),
    ) {
        Ok(q) => q,
        Err(e) => return domain_error_to_response(e),
    };

    if req.is_preview() {
        preview(&services, &query).await
    } else {
        commit(&services, &query).await
    }
}

async fn preview(services: &AppServices, query: &ExportQuery) -> Response {
    let batch = match services.orders.select_for_export(query).await {
        Ok(batch) => batch,
        Err(e) => return store_error_to_response(e),
    };
    if batch.is_empty() {
        return json_error(StatusCode::NOT_FOUND, "no_data", NO_DATA_MESSAGE);
    }

    let body = match batch.render_csv() {
        Ok(body) => body,
        Err(e) => return store_error_to_response(e.into()),
    };

    tracing::info!(range = %query.range, status = query.status.as_str(), lines = batch.line_count(), "export previewed");

    let mut headers = csv_headers(batch.line_count());
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    (StatusCode::OK, headers, body).into_response()
}

async fn commit(services: &AppServices, query: &ExportQuery) -> Response {
    let render = |batch: &ExportBatch| -> Result<Vec<u8>, RenderError> { batch.render_csv() };

    let committed = match services.orders.commit_export(query, &render).await {
        Ok(Some(committed)) => committed,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "no_data", NO_DATA_MESSAGE),
        Err(e) => return store_error_to_response(e),
    };

    let file_name = export_file_name(&query.range);
    tracing::info!(
        range = %query.range,
        status = query.status.as_str(),
        lines = committed.line_count,
        orders_marked = committed.orders_marked,
        %file_name,
        "export committed"
    );

    let mut headers = csv_headers(committed.line_count);
    headers.insert(EXPORTED_COUNT_HEADER, HeaderValue::from(committed.orders_marked));
    match HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\"")) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => {
            // Orders are already marked; the caller must still see a failure.
            tracing::error!(error = %e, %file_name, "invalid content-disposition after commit");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "response_error",
                "export committed but the response could not be built",
            );
        }
    }

    (StatusCode::OK, headers, committed.body).into_response()
}

fn csv_headers(line_count: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CSV_CONTENT_TYPE));
    headers.insert(LINE_COUNT_HEADER, HeaderValue::from(line_count));
    headers
}
