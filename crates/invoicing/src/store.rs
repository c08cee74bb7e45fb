//! The keyed invoice store.
//!
//! Owns the invoice collection and the id counter. The four mutating operations
//! below are the only way to change either; reads never fail.

use std::collections::BTreeMap;

use ledger_auth::PrincipalId;
use ledger_core::{Aggregate, BlockHeight, DomainError, DomainResult};

use crate::invoice::{
    CancelInvoice, CreateInvoice, Invoice, InvoiceCommand, InvoiceEvent, InvoiceId,
    InvoiceRecord, InvoiceStatus, MarkInvoicePaid, PayInvoice,
};
use crate::values::{Description, SettlementReference};

/// Host-supplied facts for one call: who is calling, and at what height.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: PrincipalId,
    pub height: BlockHeight,
}

impl CallContext {
    pub fn new(caller: PrincipalId, height: BlockHeight) -> Self {
        Self { caller, height }
    }
}

/// Invoice store: collection + counter + outbox of committed events.
///
/// Every mutating operation is check-then-act: a failed call leaves the
/// collection, the counter and the outbox untouched.
///
/// The outbox is unbounded and only shrinks through [`InvoiceStore::take_events`];
/// owners must drain it after each call (the ledger service does).
#[derive(Debug, Default)]
pub struct InvoiceStore {
    invoices: BTreeMap<InvoiceId, Invoice>,
    /// Last id handed out; 0 before the first create.
    last_id: u64,
    outbox: Vec<InvoiceEvent>,
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// create-invoice: allocate the next id and insert an active invoice issued
    /// by the caller.
    pub fn create_invoice(
        &mut self,
        ctx: CallContext,
        counterparty: PrincipalId,
        amount: u64,
        description: Description,
        due_offset: u64,
    ) -> DomainResult<InvoiceId> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| DomainError::invariant("invoice id counter exhausted"))?;
        let invoice_id = InvoiceId::new(next);

        let mut invoice = Invoice::empty(invoice_id);
        let events = invoice.handle(&InvoiceCommand::CreateInvoice(CreateInvoice {
            invoice_id,
            issuer: ctx.caller,
            counterparty,
            amount,
            description,
            due_offset,
            height: ctx.height,
        }))?;
        for e in &events {
            invoice.apply(e);
        }

        self.last_id = next;
        self.invoices.insert(invoice_id, invoice);
        self.outbox.extend(events);
        Ok(invoice_id)
    }

    /// get-invoice: the full record, or `None` when absent.
    pub fn get_invoice(&self, id: InvoiceId) -> Option<InvoiceRecord> {
        self.invoices.get(&id).and_then(Invoice::to_record)
    }

    /// is-invoice-paid: absent invoices read as unpaid.
    pub fn is_invoice_paid(&self, id: InvoiceId) -> bool {
        self.invoices.get(&id).is_some_and(Invoice::is_paid)
    }

    /// invoice-exists: true iff the record is currently present.
    pub fn invoice_exists(&self, id: InvoiceId) -> bool {
        self.invoices.contains_key(&id)
    }

    /// mark-invoice-paid: issuer-only, unpaid-only; reference optional.
    pub fn mark_invoice_paid(
        &mut self,
        ctx: CallContext,
        id: InvoiceId,
        settlement_reference: Option<SettlementReference>,
    ) -> DomainResult<()> {
        self.execute(
            id,
            InvoiceCommand::MarkInvoicePaid(MarkInvoicePaid {
                invoice_id: id,
                caller: ctx.caller,
                settlement_reference,
                height: ctx.height,
            }),
        )
    }

    /// pay-invoice: counterparty-only, unpaid-only; reference mandatory.
    pub fn pay_invoice(
        &mut self,
        ctx: CallContext,
        id: InvoiceId,
        settlement_reference: SettlementReference,
    ) -> DomainResult<()> {
        self.execute(
            id,
            InvoiceCommand::PayInvoice(PayInvoice {
                invoice_id: id,
                caller: ctx.caller,
                settlement_reference,
                height: ctx.height,
            }),
        )
    }

    /// cancel-invoice: issuer-only, unpaid-only; erases the record.
    pub fn cancel_invoice(&mut self, ctx: CallContext, id: InvoiceId) -> DomainResult<()> {
        self.execute(
            id,
            InvoiceCommand::CancelInvoice(CancelInvoice {
                invoice_id: id,
                caller: ctx.caller,
                height: ctx.height,
            }),
        )
    }

    /// Borrow the live aggregate (includes bookkeeping not in the record).
    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&id)
    }

    /// Last id issued, if any. Unaffected by cancellation.
    pub fn last_invoice_id(&self) -> Option<InvoiceId> {
        (self.last_id > 0).then_some(InvoiceId::new(self.last_id))
    }

    /// Number of invoices currently present.
    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Take the events committed since the last drain, in commit order,
    /// leaving the outbox empty.
    pub fn take_events(&mut self) -> Vec<InvoiceEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn execute(&mut self, id: InvoiceId, command: InvoiceCommand) -> DomainResult<()> {
        let Some(invoice) = self.invoices.get_mut(&id) else {
            return Err(DomainError::not_found());
        };

        let events = invoice.handle(&command)?;
        for e in &events {
            invoice.apply(e);
        }

        if invoice.status() == InvoiceStatus::Cancelled {
            self.invoices.remove(&id);
        }

        self.outbox.extend(events);
        Ok(())
    }
}
