use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use opsdesk_core::DomainError;
use opsdesk_infra::StoreError;

/// `{ "error": <message>, "code": <machine code> }` with the given status.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "code": code,
        })),
    )
        .into_response()
}

/// Domain errors are caller mistakes: always 400 with the bare message.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let code = match err {
        DomainError::Validation(_) => "validation_error",
        DomainError::InvalidId(_) => "invalid_id",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.detail())
}

/// Store failures are always 500; the detail goes to the log, not the client.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store operation failed");
    let (code, message) = match err {
        StoreError::Unavailable(_) => ("store_unavailable", "order store is unavailable"),
        StoreError::Database { .. } => ("store_error", "order store query failed"),
        StoreError::Render(_) => ("render_error", "failed to generate csv"),
    };
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, message)
}
