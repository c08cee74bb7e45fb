//! Invoicing domain module.
//!
//! Business rules for invoice records (lifecycle state machine, authorization,
//! the keyed store), implemented purely as deterministic domain logic (no IO,
//! no HTTP, no host).

pub mod invoice;
pub mod store;
pub mod values;

pub use invoice::{
    CancelInvoice, CreateInvoice, Invoice, InvoiceCancelled, InvoiceCommand, InvoiceCreated,
    InvoiceEvent, InvoiceId, InvoicePaid, InvoiceRecord, InvoiceStatus, MarkInvoicePaid,
    PayInvoice, SettlementPath, AGGREGATE_TYPE,
};
pub use store::{CallContext, InvoiceStore};
pub use values::{
    Description, SettlementReference, MAX_DESCRIPTION_CHARS, MAX_SETTLEMENT_REFERENCE_LEN,
};
