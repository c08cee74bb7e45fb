use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ledger_core::DomainError;
use ledger_infra::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let status = match &err {
        LedgerError::Domain(DomainError::Unauthorized) => StatusCode::FORBIDDEN,
        LedgerError::Domain(DomainError::NotFound) => StatusCode::NOT_FOUND,
        LedgerError::Domain(DomainError::AlreadySettled) => StatusCode::CONFLICT,
        LedgerError::Domain(DomainError::Validation(_) | DomainError::InvalidId(_)) => {
            StatusCode::BAD_REQUEST
        }
        LedgerError::Domain(DomainError::InvariantViolation(_)) | LedgerError::Unavailable(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    json_error(status, err.kind(), err.code(), err.to_string())
}

/// Reject a request before it reaches the ledger.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    ledger_error_to_response(LedgerError::Domain(err))
}

pub fn json_error(
    status: StatusCode,
    error: &'static str,
    code: u32,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": error,
            "code": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
