//! Serialized ledger service (application-level orchestration).
//!
//! `InvoiceLedger` wraps the invoice store behind a mutex so each call runs as
//! one atomic step, then publishes the events the call committed.
//!
//! ```text
//! call
//!   ↓
//! 1. Lock store (total order across callers)
//!   ↓
//! 2. Run the store operation (check-then-act; failures change nothing)
//!   ↓
//! 3. Drain committed events, wrap in envelopes (ledger-wide sequence)
//!   ↓
//! 4. Publish to the bus (failures logged, never undo the commit)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use ledger_auth::PrincipalId;
use ledger_core::{DomainError, DomainResult};
use ledger_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};
use ledger_invoicing::{
    AGGREGATE_TYPE, CallContext, Description, InvoiceId, InvoiceRecord, InvoiceStore,
    SettlementReference,
};

use crate::receipt::CallValue;

/// Ledger wired to the in-process broadcast bus.
pub type InMemoryLedger = InvoiceLedger<Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Deterministic domain rejection (authorization, lifecycle, validation).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The ledger cannot serve calls (e.g. lock poisoned by a panicking caller).
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub const CODE_UNAVAILABLE: u32 = 500;

    pub fn code(&self) -> u32 {
        match self {
            LedgerError::Domain(e) => e.code(),
            LedgerError::Unavailable(_) => Self::CODE_UNAVAILABLE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Domain(e) => e.kind(),
            LedgerError::Unavailable(_) => "unavailable",
        }
    }
}

/// A mutating entry point with its literal argument shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    CreateInvoice {
        counterparty: PrincipalId,
        amount: u64,
        description: String,
        due_offset: u64,
    },
    MarkInvoicePaid {
        invoice_id: InvoiceId,
        settlement_reference: Option<SettlementReference>,
    },
    PayInvoice {
        invoice_id: InvoiceId,
        settlement_reference: SettlementReference,
    },
    CancelInvoice {
        invoice_id: InvoiceId,
    },
}

impl LedgerCall {
    /// Entry point name, as the host exposes it.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCall::CreateInvoice { .. } => "create-invoice",
            LedgerCall::MarkInvoicePaid { .. } => "mark-invoice-paid",
            LedgerCall::PayInvoice { .. } => "pay-invoice",
            LedgerCall::CancelInvoice { .. } => "cancel-invoice",
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    store: InvoiceStore,
    /// Last envelope sequence number published; 0 before the first event.
    sequence: u64,
}

/// The invoice store behind a serialization point, plus event publication.
#[derive(Debug)]
pub struct InvoiceLedger<B> {
    state: Mutex<LedgerState>,
    bus: B,
}

impl<B> InvoiceLedger<B> {
    pub fn new(bus: B) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            bus,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    // Reads never fail: a poisoned lock still guards a consistent store, since
    // every store operation validates before it mutates.
    fn read(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_invoice(&self, id: InvoiceId) -> Option<InvoiceRecord> {
        tracing::debug!(invoice_id = %id, "get-invoice");
        self.read().store.get_invoice(id)
    }

    pub fn is_invoice_paid(&self, id: InvoiceId) -> bool {
        tracing::debug!(invoice_id = %id, "is-invoice-paid");
        self.read().store.is_invoice_paid(id)
    }

    pub fn invoice_exists(&self, id: InvoiceId) -> bool {
        tracing::debug!(invoice_id = %id, "invoice-exists");
        self.read().store.invoice_exists(id)
    }

    pub fn last_invoice_id(&self) -> Option<InvoiceId> {
        self.read().store.last_invoice_id()
    }

    /// Number of invoices currently present.
    pub fn len(&self) -> usize {
        self.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().store.is_empty()
    }
}

impl<B> InvoiceLedger<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn create_invoice(
        &self,
        ctx: CallContext,
        counterparty: PrincipalId,
        amount: u64,
        description: Description,
        due_offset: u64,
    ) -> Result<InvoiceId, LedgerError> {
        self.transact(ctx, "create-invoice", |store| {
            store.create_invoice(ctx, counterparty, amount, description, due_offset)
        })
    }

    pub fn mark_invoice_paid(
        &self,
        ctx: CallContext,
        id: InvoiceId,
        settlement_reference: Option<SettlementReference>,
    ) -> Result<(), LedgerError> {
        self.transact(ctx, "mark-invoice-paid", |store| {
            store.mark_invoice_paid(ctx, id, settlement_reference)
        })
    }

    pub fn pay_invoice(
        &self,
        ctx: CallContext,
        id: InvoiceId,
        settlement_reference: SettlementReference,
    ) -> Result<(), LedgerError> {
        self.transact(ctx, "pay-invoice", |store| {
            store.pay_invoice(ctx, id, settlement_reference)
        })
    }

    pub fn cancel_invoice(&self, ctx: CallContext, id: InvoiceId) -> Result<(), LedgerError> {
        self.transact(ctx, "cancel-invoice", |store| store.cancel_invoice(ctx, id))
    }

    /// Dispatch a call by shape. Create yields the new id; transitions yield `true`.
    pub fn execute(&self, ctx: CallContext, call: LedgerCall) -> Result<CallValue, LedgerError> {
        let op = call.name();
        match call {
            LedgerCall::CreateInvoice {
                counterparty,
                amount,
                description,
                due_offset,
            } => self
                .transact(ctx, op, |store| {
                    let description = Description::new(description)?;
                    store.create_invoice(ctx, counterparty, amount, description, due_offset)
                })
                .map(|id| CallValue::Uint(id.get())),
            LedgerCall::MarkInvoicePaid {
                invoice_id,
                settlement_reference,
            } => self
                .mark_invoice_paid(ctx, invoice_id, settlement_reference)
                .map(|()| CallValue::Bool(true)),
            LedgerCall::PayInvoice {
                invoice_id,
                settlement_reference,
            } => self
                .pay_invoice(ctx, invoice_id, settlement_reference)
                .map(|()| CallValue::Bool(true)),
            LedgerCall::CancelInvoice { invoice_id } => self
                .cancel_invoice(ctx, invoice_id)
                .map(|()| CallValue::Bool(true)),
        }
    }

    fn transact<T>(
        &self,
        ctx: CallContext,
        op: &'static str,
        f: impl FnOnce(&mut InvoiceStore) -> DomainResult<T>,
    ) -> Result<T, LedgerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))?;

        let value = match f(&mut state.store) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    op,
                    caller = %ctx.caller,
                    height = %ctx.height,
                    code = e.code(),
                    error = %e,
                    "call rejected"
                );
                return Err(e.into());
            }
        };

        let events = state.store.take_events();
        tracing::info!(
            op,
            caller = %ctx.caller,
            height = %ctx.height,
            events = events.len(),
            "call committed"
        );

        // Publish under the lock so bus order matches sequence order.
        publish_committed(&self.bus, &mut state.sequence, &events, |e| {
            e.invoice_id().get()
        });

        Ok(value)
    }
}

/// Wrap and publish committed events. The sequence advances only for events
/// that were actually encoded, so published sequence numbers have no gaps.
fn publish_committed<B, T>(
    bus: &B,
    sequence: &mut u64,
    events: &[T],
    aggregate_id: impl Fn(&T) -> u64,
) where
    B: EventBus<EventEnvelope<JsonValue>>,
    T: Event + Serialize,
{
    for event in events {
        let next = *sequence + 1;
        let envelope =
            match EventEnvelope::from_typed(aggregate_id(event), AGGREGATE_TYPE, next, event) {
                Ok(env) => env,
                Err(e) => {
                    tracing::warn!(
                        event_type = event.event_type(),
                        error = %e,
                        "failed to encode event"
                    );
                    continue;
                }
            };
        *sequence = next;

        if let Err(e) = bus.publish(envelope) {
            tracing::warn!(sequence = next, error = ?e, "failed to publish event");
        } else {
            tracing::debug!(sequence = next, "event published");
        }
    }
}

impl InMemoryLedger {
    /// Ledger with a fresh in-memory bus.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryEventBus::new()))
    }
}
