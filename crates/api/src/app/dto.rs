use serde::{Deserialize, Serialize};

use ledger_auth::PrincipalId;
use ledger_core::{BlockHeight, DomainError};
use ledger_invoicing::{InvoiceId, InvoiceRecord, SettlementReference};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub counterparty: String,
    pub amount: u64,
    pub description: String,
    pub due_offset: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkInvoicePaidRequest {
    #[serde(default)]
    pub settlement_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PayInvoiceRequest {
    pub settlement_reference: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct InvoiceCreatedResponse {
    pub id: u64,
    pub block_height: BlockHeight,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub id: u64,
    pub ok: bool,
    pub block_height: BlockHeight,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: u64,
    pub issuer: String,
    pub counterparty: String,
    pub amount: u64,
    pub description: String,
    pub due_at: BlockHeight,
    pub paid: bool,
    pub settlement_reference: Option<String>,
}

impl From<InvoiceRecord> for InvoiceResponse {
    fn from(r: InvoiceRecord) -> Self {
        Self {
            id: r.id.get(),
            issuer: r.issuer.to_string(),
            counterparty: r.counterparty.to_string(),
            amount: r.amount,
            description: r.description.into_inner(),
            due_at: r.due_at,
            paid: r.paid,
            settlement_reference: r.settlement_reference.map(|s| s.to_hex()),
        }
    }
}

// -------------------------
// Path / field parsing
// -------------------------

pub fn parse_invoice_id(raw: &str) -> Result<InvoiceId, axum::response::Response> {
    raw.parse::<u64>().map(InvoiceId::new).map_err(|_| {
        errors::domain_error_to_response(DomainError::invalid_id(format!(
            "invoice id must be an unsigned integer, got {raw:?}"
        )))
    })
}

pub fn parse_principal(raw: &str) -> Result<PrincipalId, axum::response::Response> {
    raw.parse::<PrincipalId>()
        .map_err(errors::domain_error_to_response)
}

/// Mark-paid body: empty (or whitespace) means no reference; anything else
/// must parse, so a reference the caller sent is never dropped.
pub fn parse_mark_invoice_paid_body(
    raw: &[u8],
) -> Result<MarkInvoicePaidRequest, axum::response::Response> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(MarkInvoicePaidRequest::default());
    }

    serde_json::from_slice(raw).map_err(|e| {
        errors::domain_error_to_response(DomainError::validation(format!(
            "invalid mark-paid body: {e}"
        )))
    })
}

pub fn parse_settlement_reference(
    raw: &str,
) -> Result<SettlementReference, axum::response::Response> {
    SettlementReference::from_hex(raw).map_err(errors::domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn empty_mark_paid_body_means_no_reference() {
        for raw in [&b""[..], &b"  \n"[..], &b"{}"[..]] {
            let body = parse_mark_invoice_paid_body(raw).unwrap();
            assert_eq!(body.settlement_reference, None);
        }
    }

    #[test]
    fn mark_paid_body_keeps_the_reference() {
        let body = parse_mark_invoice_paid_body(br#"{"settlement_reference":"0xabcd"}"#).unwrap();
        assert_eq!(body.settlement_reference.as_deref(), Some("0xabcd"));
    }

    #[test]
    fn malformed_mark_paid_body_is_rejected() {
        for raw in [
            &br#"{"settlement_reference": 12345}"#[..],
            &b"{not json"[..],
            &br#""0xabcd""#[..],
        ] {
            let res = parse_mark_invoice_paid_body(raw).unwrap_err();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }
}
