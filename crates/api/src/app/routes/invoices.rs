use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use ledger_core::DomainError;
use ledger_infra::{CallValue, LedgerCall};

use crate::app::{dto, errors};
use crate::app::services::{AppServices, Submitted};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_invoice))
        .route("/:id", get(get_invoice).delete(cancel_invoice))
        .route("/:id/paid", get(is_invoice_paid))
        .route("/:id/exists", get(invoice_exists))
        .route("/:id/mark-paid", post(mark_invoice_paid))
        .route("/:id/pay", post(pay_invoice))
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Json(body): Json<dto::CreateInvoiceRequest>,
) -> axum::response::Response {
    let counterparty = match dto::parse_principal(&body.counterparty) {
        Ok(p) => p,
        Err(res) => return res,
    };

    let call = LedgerCall::CreateInvoice {
        counterparty,
        amount: body.amount,
        description: body.description,
        due_offset: body.due_offset,
    };

    match services.submit(caller.principal_id(), call) {
        Ok(Submitted {
            block_height,
            result: Ok(CallValue::Uint(id)),
        }) => (
            StatusCode::CREATED,
            Json(dto::InvoiceCreatedResponse { id, block_height }),
        )
            .into_response(),
        Ok(Submitted { result: Ok(other), .. }) => {
            errors::domain_error_to_response(DomainError::invariant(format!(
                "create-invoice returned {other}"
            )))
        }
        Ok(Submitted { result: Err(e), .. }) | Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match dto::parse_invoice_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.ledger().get_invoice(invoice_id) {
        Some(record) => Json(dto::InvoiceResponse::from(record)).into_response(),
        None => errors::domain_error_to_response(DomainError::not_found()),
    }
}

pub async fn is_invoice_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match dto::parse_invoice_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let paid = services.ledger().is_invoice_paid(invoice_id);
    Json(serde_json::json!({ "id": invoice_id.get(), "paid": paid })).into_response()
}

pub async fn invoice_exists(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match dto::parse_invoice_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let exists = services.ledger().invoice_exists(invoice_id);
    Json(serde_json::json!({ "id": invoice_id.get(), "exists": exists })).into_response()
}

/// An empty body marks paid without a reference; any other body must be a
/// valid `MarkInvoicePaidRequest`.
pub async fn mark_invoice_paid(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let invoice_id = match dto::parse_invoice_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let body = match dto::parse_mark_invoice_paid_body(&body) {
        Ok(b) => b,
        Err(res) => return res,
    };
    let settlement_reference = match body.settlement_reference.as_deref() {
        Some(raw) => match dto::parse_settlement_reference(raw) {
            Ok(r) => Some(r),
            Err(res) => return res,
        },
        None => None,
    };

    let call = LedgerCall::MarkInvoicePaid {
        invoice_id,
        settlement_reference,
    };
    transition_response(invoice_id.get(), services.submit(caller.principal_id(), call))
}

pub async fn pay_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PayInvoiceRequest>,
) -> axum::response::Response {
    let invoice_id = match dto::parse_invoice_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let settlement_reference = match dto::parse_settlement_reference(&body.settlement_reference) {
        Ok(r) => r,
        Err(res) => return res,
    };

    let call = LedgerCall::PayInvoice {
        invoice_id,
        settlement_reference,
    };
    transition_response(invoice_id.get(), services.submit(caller.principal_id(), call))
}

pub async fn cancel_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id = match dto::parse_invoice_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let call = LedgerCall::CancelInvoice { invoice_id };
    transition_response(invoice_id.get(), services.submit(caller.principal_id(), call))
}

fn transition_response(
    id: u64,
    submitted: Result<Submitted, ledger_infra::LedgerError>,
) -> axum::response::Response {
    match submitted {
        Ok(Submitted {
            block_height,
            result: Ok(_),
        }) => Json(dto::TransitionResponse {
            id,
            ok: true,
            block_height,
        })
        .into_response(),
        Ok(Submitted { result: Err(e), .. }) | Err(e) => errors::ledger_error_to_response(e),
    }
}
