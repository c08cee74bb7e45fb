//! Integration tests for the full pipeline.
//!
//! Tests: Tx → SimulatedChain → InvoiceLedger → InvoiceStore → EventBus
//!
//! Verifies:
//! - Acceptance scenarios render the host's receipts
//! - Height-derived fields track the block the call ran in
//! - Subscribers observe committed events in sequence order

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::Value as JsonValue;

    use ledger_auth::PrincipalId;
    use ledger_core::{BlockHeight, ChainClock};
    use ledger_events::{EventBus, EventEnvelope, InMemoryEventBus};
    use ledger_invoicing::{InvoiceId, SettlementReference};

    use crate::chain::{SimulatedChain, Tx};
    use crate::config::LedgerConfig;

    type Chain = SimulatedChain<Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

    struct Accounts {
        deployer: PrincipalId,
        customer: PrincipalId,
        stranger: PrincipalId,
    }

    fn setup() -> (Chain, Accounts) {
        let chain = SimulatedChain::in_memory(&LedgerConfig::default());
        let accounts = Accounts {
            deployer: PrincipalId::new(),
            customer: PrincipalId::new(),
            stranger: PrincipalId::new(),
        };
        (chain, accounts)
    }

    /// Scenario A: one invoice from the deployer to the customer.
    fn create_first_invoice(chain: &Chain, a: &Accounts) -> InvoiceId {
        let block = chain
            .mine_block(vec![Tx::create_invoice(
                a.deployer,
                a.customer,
                1000,
                "Web development services",
                30,
            )])
            .unwrap();

        assert_eq!(block.height, BlockHeight::new(2));
        assert_eq!(block.receipts.len(), 1);
        assert_eq!(block.receipts[0].result_string(), "(ok u1)");
        InvoiceId::new(1)
    }

    #[test]
    fn scenario_a_create_and_read_back() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);

        let record = chain.ledger().get_invoice(id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.issuer, a.deployer);
        assert_eq!(record.counterparty, a.customer);
        assert_eq!(record.amount, 1000);
        assert_eq!(record.description.as_str(), "Web development services");
        assert_eq!(record.due_at, BlockHeight::new(32));
        assert!(!record.paid);
        assert_eq!(record.settlement_reference, None);
    }

    #[test]
    fn scenario_b_issuer_marks_paid() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);

        let block = chain
            .mine_block(vec![Tx::mark_invoice_paid(a.deployer, id, None)])
            .unwrap();

        assert_eq!(block.receipts[0].result_string(), "(ok true)");
        assert!(chain.ledger().is_invoice_paid(id));
    }

    #[test]
    fn scenario_c_stranger_cannot_mark_paid() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);

        let block = chain
            .mine_block(vec![Tx::mark_invoice_paid(a.stranger, id, None)])
            .unwrap();

        assert_eq!(block.receipts[0].result_string(), "(err u100)");
        assert!(!chain.ledger().is_invoice_paid(id));
    }

    #[test]
    fn scenario_d_counterparty_pays_with_reference() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);
        let txref = SettlementReference::from_hex("0x1234567890abcdef").unwrap();

        let block = chain
            .mine_block(vec![Tx::pay_invoice(a.customer, id, txref.clone())])
            .unwrap();

        assert_eq!(block.receipts[0].result_string(), "(ok true)");
        assert!(chain.ledger().is_invoice_paid(id));
        let record = chain.ledger().get_invoice(id).unwrap();
        assert_eq!(record.settlement_reference, Some(txref));
    }

    #[test]
    fn scenario_e_issuer_cancels() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);

        let block = chain
            .mine_block(vec![Tx::cancel_invoice(a.deployer, id)])
            .unwrap();

        assert_eq!(block.receipts[0].result_string(), "(ok true)");
        assert!(!chain.ledger().invoice_exists(id));
        assert_eq!(chain.ledger().get_invoice(id), None);
    }

    #[test]
    fn settled_invoice_rejects_every_transition() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);
        let txref = SettlementReference::new(b"tx".to_vec()).unwrap();

        let block = chain
            .mine_block(vec![
                Tx::mark_invoice_paid(a.deployer, id, None),
                Tx::mark_invoice_paid(a.deployer, id, None),
                Tx::pay_invoice(a.customer, id, txref),
                Tx::cancel_invoice(a.deployer, id),
            ])
            .unwrap();

        let rendered: Vec<String> = block.receipts.iter().map(|r| r.result_string()).collect();
        assert_eq!(
            rendered,
            vec!["(ok true)", "(err u102)", "(err u102)", "(err u102)"]
        );
        assert!(chain.ledger().invoice_exists(id));
    }

    #[test]
    fn cancelled_id_is_not_reused() {
        let (chain, a) = setup();
        let id = create_first_invoice(&chain, &a);
        chain
            .mine_block(vec![Tx::cancel_invoice(a.deployer, id)])
            .unwrap();

        let block = chain
            .mine_block(vec![
                Tx::create_invoice(a.deployer, a.customer, 1, "again", 0),
                Tx::mark_invoice_paid(a.deployer, id, None),
            ])
            .unwrap();

        assert_eq!(block.receipts[0].result_string(), "(ok u2)");
        assert_eq!(block.receipts[1].result_string(), "(err u101)");
    }

    #[test]
    fn due_at_tracks_the_block_the_create_ran_in() {
        let (chain, a) = setup();
        chain.advance(98).unwrap();
        assert_eq!(chain.current_height(), BlockHeight::new(99));

        chain
            .mine_block(vec![Tx::create_invoice(a.deployer, a.customer, 7, "late", 1)])
            .unwrap();

        let record = chain.ledger().get_invoice(InvoiceId::new(1)).unwrap();
        assert_eq!(record.due_at, BlockHeight::new(101));
    }

    #[test]
    fn subscriber_sees_lifecycle_in_sequence_order() {
        let (chain, a) = setup();
        let sub = chain.ledger().bus().subscribe();

        let id = create_first_invoice(&chain, &a);
        chain
            .mine_block(vec![
                Tx::mark_invoice_paid(a.stranger, id, None),
                Tx::pay_invoice(
                    a.customer,
                    id,
                    SettlementReference::from_hex("abcd").unwrap(),
                ),
            ])
            .unwrap();
        chain
            .mine_block(vec![Tx::create_invoice(a.customer, a.deployer, 3, "refund", 2)])
            .unwrap();

        let mut received = Vec::new();
        while let Ok(env) = sub.recv_timeout(Duration::from_millis(50)) {
            received.push(env);
        }

        let summary: Vec<(u64, &str, u64, u64)> = received
            .iter()
            .map(|e| {
                (
                    e.sequence_number(),
                    e.event_type(),
                    e.aggregate_id(),
                    e.block_height().get(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "ledger.invoice.created", 1, 2),
                (2, "ledger.invoice.paid", 1, 3),
                (3, "ledger.invoice.created", 2, 4),
            ]
        );
        assert_eq!(received[1].payload()["InvoicePaid"]["settlement_reference"], "0xabcd");
    }
}
