use serde::{Deserialize, Serialize};

use ledger_auth::{Parties, PrincipalId, Relationship, authorize};
use ledger_core::{Aggregate, AggregateRoot, BlockHeight, DomainError, DomainResult};
use ledger_events::Event;

use crate::values::{Description, SettlementReference};

/// Aggregate type name used in event envelopes.
pub const AGGREGATE_TYPE: &str = "ledger.invoice";

/// Sequential invoice identifier. The first issued id is 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(u64);

impl InvoiceId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for InvoiceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Invoice status lifecycle.
///
/// `Active -> Paid` and `Active -> Cancelled`; both targets are terminal. A
/// cancelled invoice is erased from the store, so `Cancelled` is only ever
/// observed on an aggregate in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Active,
    Paid,
    Cancelled,
}

/// How an invoice reached the paid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPath {
    /// The issuer acknowledged an off-ledger settlement.
    IssuerAttested,
    /// The counterparty recorded payment with proof.
    CounterpartyPayment,
}

/// Aggregate root: Invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    parties: Option<Parties>,
    amount: u64,
    description: Option<Description>,
    due_at: BlockHeight,
    created_at: BlockHeight,
    status: InvoiceStatus,
    settlement_reference: Option<SettlementReference>,
    paid_at: Option<BlockHeight>,
    version: u64,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
            parties: None,
            amount: 0,
            description: None,
            due_at: BlockHeight::default(),
            created_at: BlockHeight::default(),
            status: InvoiceStatus::Active,
            settlement_reference: None,
            paid_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.parties.is_some()
    }

    pub fn parties(&self) -> Option<Parties> {
        self.parties
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn due_at(&self) -> BlockHeight {
        self.due_at
    }

    pub fn created_at(&self) -> BlockHeight {
        self.created_at
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn settlement_reference(&self) -> Option<&SettlementReference> {
        self.settlement_reference.as_ref()
    }

    pub fn paid_at(&self) -> Option<BlockHeight> {
        self.paid_at
    }

    /// Read-only snapshot of a created invoice.
    pub fn to_record(&self) -> Option<InvoiceRecord> {
        let parties = self.parties?;
        Some(InvoiceRecord {
            id: self.id,
            issuer: parties.issuer,
            counterparty: parties.counterparty,
            amount: self.amount,
            description: self.description.clone()?,
            due_at: self.due_at,
            paid: self.is_paid(),
            settlement_reference: self.settlement_reference.clone(),
        })
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// The full record as returned by `get-invoice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub issuer: PrincipalId,
    pub counterparty: PrincipalId,
    pub amount: u64,
    pub description: Description,
    pub due_at: BlockHeight,
    pub paid: bool,
    pub settlement_reference: Option<SettlementReference>,
}

/// Command: CreateInvoice. The issuer is the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub invoice_id: InvoiceId,
    pub issuer: PrincipalId,
    pub counterparty: PrincipalId,
    /// Opaque smallest unit; zero is accepted.
    pub amount: u64,
    pub description: Description,
    /// Added to `height` to compute the due height.
    pub due_offset: u64,
    pub height: BlockHeight,
}

/// Command: MarkInvoicePaid (issuer attestation, reference optional).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInvoicePaid {
    pub invoice_id: InvoiceId,
    pub caller: PrincipalId,
    pub settlement_reference: Option<SettlementReference>,
    pub height: BlockHeight,
}

/// Command: PayInvoice (counterparty payment, reference mandatory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayInvoice {
    pub invoice_id: InvoiceId,
    pub caller: PrincipalId,
    pub settlement_reference: SettlementReference,
    pub height: BlockHeight,
}

/// Command: CancelInvoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelInvoice {
    pub invoice_id: InvoiceId,
    pub caller: PrincipalId,
    pub height: BlockHeight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    CreateInvoice(CreateInvoice),
    MarkInvoicePaid(MarkInvoicePaid),
    PayInvoice(PayInvoice),
    CancelInvoice(CancelInvoice),
}

/// Event: InvoiceCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreated {
    pub invoice_id: InvoiceId,
    pub issuer: PrincipalId,
    pub counterparty: PrincipalId,
    pub amount: u64,
    pub description: Description,
    pub due_at: BlockHeight,
    pub created_at: BlockHeight,
}

/// Event: InvoicePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePaid {
    pub invoice_id: InvoiceId,
    pub paid_by: PrincipalId,
    pub path: SettlementPath,
    pub settlement_reference: Option<SettlementReference>,
    pub paid_at: BlockHeight,
}

/// Event: InvoiceCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCancelled {
    pub invoice_id: InvoiceId,
    pub cancelled_by: PrincipalId,
    pub cancelled_at: BlockHeight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceCreated(InvoiceCreated),
    InvoicePaid(InvoicePaid),
    InvoiceCancelled(InvoiceCancelled),
}

impl InvoiceEvent {
    pub fn invoice_id(&self) -> InvoiceId {
        match self {
            InvoiceEvent::InvoiceCreated(e) => e.invoice_id,
            InvoiceEvent::InvoicePaid(e) => e.invoice_id,
            InvoiceEvent::InvoiceCancelled(e) => e.invoice_id,
        }
    }
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceCreated(_) => "ledger.invoice.created",
            InvoiceEvent::InvoicePaid(_) => "ledger.invoice.paid",
            InvoiceEvent::InvoiceCancelled(_) => "ledger.invoice.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn recorded_at(&self) -> BlockHeight {
        match self {
            InvoiceEvent::InvoiceCreated(e) => e.created_at,
            InvoiceEvent::InvoicePaid(e) => e.paid_at,
            InvoiceEvent::InvoiceCancelled(e) => e.cancelled_at,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceCreated(e) => {
                self.id = e.invoice_id;
                self.parties = Some(Parties::new(e.issuer, e.counterparty));
                self.amount = e.amount;
                self.description = Some(e.description.clone());
                self.due_at = e.due_at;
                self.created_at = e.created_at;
                self.status = InvoiceStatus::Active;
                self.settlement_reference = None;
                self.paid_at = None;
            }
            InvoiceEvent::InvoicePaid(e) => {
                self.status = InvoiceStatus::Paid;
                self.settlement_reference = e.settlement_reference.clone();
                self.paid_at = Some(e.paid_at);
            }
            InvoiceEvent::InvoiceCancelled(_) => {
                self.status = InvoiceStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::CreateInvoice(cmd) => self.handle_create(cmd),
            InvoiceCommand::MarkInvoicePaid(cmd) => self.handle_mark_paid(cmd),
            InvoiceCommand::PayInvoice(cmd) => self.handle_pay(cmd),
            InvoiceCommand::CancelInvoice(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Invoice {
    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> DomainResult<()> {
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    /// Preconditions shared by every transition out of `Active`, checked in
    /// order: existence, caller relationship, unpaid.
    fn ensure_transition(
        &self,
        invoice_id: InvoiceId,
        caller: PrincipalId,
        required: Relationship,
    ) -> DomainResult<()> {
        self.ensure_invoice_id(invoice_id)?;

        let parties = match self.parties {
            Some(p) if self.status != InvoiceStatus::Cancelled => p,
            _ => return Err(DomainError::not_found()),
        };

        authorize(caller, &parties, required)?;

        if self.status == InvoiceStatus::Paid {
            return Err(DomainError::AlreadySettled);
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateInvoice) -> DomainResult<Vec<InvoiceEvent>> {
        self.ensure_invoice_id(cmd.invoice_id)?;
        if self.is_created() {
            return Err(DomainError::invariant("invoice already exists"));
        }

        let due_at = cmd.height.checked_offset(cmd.due_offset)?;

        Ok(vec![InvoiceEvent::InvoiceCreated(InvoiceCreated {
            invoice_id: cmd.invoice_id,
            issuer: cmd.issuer,
            counterparty: cmd.counterparty,
            amount: cmd.amount,
            description: cmd.description.clone(),
            due_at,
            created_at: cmd.height,
        })])
    }

    fn handle_mark_paid(&self, cmd: &MarkInvoicePaid) -> DomainResult<Vec<InvoiceEvent>> {
        self.ensure_transition(cmd.invoice_id, cmd.caller, Relationship::Issuer)?;

        Ok(vec![InvoiceEvent::InvoicePaid(InvoicePaid {
            invoice_id: cmd.invoice_id,
            paid_by: cmd.caller,
            path: SettlementPath::IssuerAttested,
            settlement_reference: cmd.settlement_reference.clone(),
            paid_at: cmd.height,
        })])
    }

    fn handle_pay(&self, cmd: &PayInvoice) -> DomainResult<Vec<InvoiceEvent>> {
        self.ensure_transition(cmd.invoice_id, cmd.caller, Relationship::Counterparty)?;

        Ok(vec![InvoiceEvent::InvoicePaid(InvoicePaid {
            invoice_id: cmd.invoice_id,
            paid_by: cmd.caller,
            path: SettlementPath::CounterpartyPayment,
            settlement_reference: Some(cmd.settlement_reference.clone()),
            paid_at: cmd.height,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelInvoice) -> DomainResult<Vec<InvoiceEvent>> {
        self.ensure_transition(cmd.invoice_id, cmd.caller, Relationship::Issuer)?;

        Ok(vec![InvoiceEvent::InvoiceCancelled(InvoiceCancelled {
            invoice_id: cmd.invoice_id,
            cancelled_by: cmd.caller,
            cancelled_at: cmd.height,
        })])
    }
}
