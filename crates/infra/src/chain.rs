//! Simulated host chain.
//!
//! Stands in for the blockchain host: it owns the block height, mines blocks,
//! and runs each block's transactions against the ledger in order, at the new
//! block's height, with the transaction sender as the authenticated caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use ledger_auth::PrincipalId;
use ledger_core::{BlockHeight, ChainClock};
use ledger_events::{EventBus, EventEnvelope, InMemoryEventBus};
use ledger_invoicing::{CallContext, InvoiceId, SettlementReference};

use crate::config::LedgerConfig;
use crate::ledger::{InvoiceLedger, LedgerCall, LedgerError};
use crate::receipt::Receipt;

/// A signed call: the sender is the caller the ledger sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub sender: PrincipalId,
    pub call: LedgerCall,
}

impl Tx {
    pub fn new(sender: PrincipalId, call: LedgerCall) -> Self {
        Self { sender, call }
    }

    pub fn create_invoice(
        sender: PrincipalId,
        counterparty: PrincipalId,
        amount: u64,
        description: impl Into<String>,
        due_offset: u64,
    ) -> Self {
        Self::new(
            sender,
            LedgerCall::CreateInvoice {
                counterparty,
                amount,
                description: description.into(),
                due_offset,
            },
        )
    }

    pub fn mark_invoice_paid(
        sender: PrincipalId,
        invoice_id: InvoiceId,
        settlement_reference: Option<SettlementReference>,
    ) -> Self {
        Self::new(
            sender,
            LedgerCall::MarkInvoicePaid {
                invoice_id,
                settlement_reference,
            },
        )
    }

    pub fn pay_invoice(
        sender: PrincipalId,
        invoice_id: InvoiceId,
        settlement_reference: SettlementReference,
    ) -> Self {
        Self::new(
            sender,
            LedgerCall::PayInvoice {
                invoice_id,
                settlement_reference,
            },
        )
    }

    pub fn cancel_invoice(sender: PrincipalId, invoice_id: InvoiceId) -> Self {
        Self::new(sender, LedgerCall::CancelInvoice { invoice_id })
    }
}

/// A mined block and the receipts of the transactions it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: BlockHeight,
    pub mined_at: DateTime<Utc>,
    pub receipts: Vec<Receipt>,
}

impl Block {
    pub fn receipt(&self, tx_index: usize) -> Option<&Receipt> {
        self.receipts.get(tx_index)
    }
}

/// Single-process chain with a ledger deployed on it.
#[derive(Debug)]
pub struct SimulatedChain<B> {
    // Serializes mining; `tip` mirrors it for lock-free height reads and only
    // advances after a block's transactions have executed.
    mining: Mutex<BlockHeight>,
    tip: AtomicU64,
    ledger: InvoiceLedger<B>,
}

impl<B> SimulatedChain<B> {
    pub fn new(config: &LedgerConfig, bus: B) -> Self {
        Self {
            mining: Mutex::new(config.genesis_height),
            tip: AtomicU64::new(config.genesis_height.get()),
            ledger: InvoiceLedger::new(bus),
        }
    }

    pub fn ledger(&self) -> &InvoiceLedger<B> {
        &self.ledger
    }
}

impl SimulatedChain<Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>> {
    pub fn in_memory(config: &LedgerConfig) -> Self {
        Self::new(config, Arc::new(InMemoryEventBus::new()))
    }
}

impl<B> SimulatedChain<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Mine one block containing `txs`, executed in order at the new height.
    ///
    /// A rejected transaction yields an error receipt; it never aborts the block.
    pub fn mine_block(&self, txs: Vec<Tx>) -> Result<Block, LedgerError> {
        let mut tip = self
            .mining
            .lock()
            .map_err(|_| LedgerError::Unavailable("chain lock poisoned".to_string()))?;

        let height = tip.next()?;

        let receipts: Vec<Receipt> = txs
            .into_iter()
            .enumerate()
            .map(|(tx_index, tx)| Receipt {
                tx_index,
                sender: tx.sender,
                result: self
                    .ledger
                    .execute(CallContext::new(tx.sender, height), tx.call),
            })
            .collect();

        // Publish the new height only once its transactions have run.
        *tip = height;
        self.tip.store(height.get(), Ordering::SeqCst);

        tracing::info!(
            height = %height,
            txs = receipts.len(),
            rejected = receipts.iter().filter(|r| !r.is_ok()).count(),
            "block mined"
        );

        Ok(Block {
            height,
            mined_at: Utc::now(),
            receipts,
        })
    }

    /// Mine `blocks` empty blocks; returns the resulting height.
    pub fn advance(&self, blocks: u64) -> Result<BlockHeight, LedgerError> {
        for _ in 0..blocks {
            self.mine_block(Vec::new())?;
        }
        Ok(self.current_height())
    }
}

impl<B> ChainClock for SimulatedChain<B>
where
    B: Send + Sync,
{
    fn current_height(&self) -> BlockHeight {
        BlockHeight::new(self.tip.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;
    use std::sync::{OnceLock, Weak};

    use ledger_events::Subscription;

    #[test]
    fn first_mined_block_follows_genesis() {
        let chain = SimulatedChain::in_memory(&LedgerConfig::default());
        assert_eq!(chain.current_height(), BlockHeight::new(1));

        let block = chain.mine_block(Vec::new()).unwrap();
        assert_eq!(block.height, BlockHeight::new(2));
        assert!(block.receipts.is_empty());
        assert_eq!(chain.current_height(), BlockHeight::new(2));
    }

    #[test]
    fn advance_mines_empty_blocks() {
        let chain = SimulatedChain::in_memory(&LedgerConfig {
            genesis_height: BlockHeight::new(10),
        });
        assert_eq!(chain.advance(5).unwrap(), BlockHeight::new(15));
        assert_eq!(chain.advance(0).unwrap(), BlockHeight::new(15));
    }

    #[test]
    fn mining_past_max_height_is_rejected() {
        let chain = SimulatedChain::in_memory(&LedgerConfig {
            genesis_height: BlockHeight::new(u64::MAX),
        });
        let err = chain.mine_block(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(chain.current_height(), BlockHeight::new(u64::MAX));
    }

    #[test]
    fn rejected_tx_does_not_abort_block() {
        let chain = SimulatedChain::in_memory(&LedgerConfig::default());
        let issuer = PrincipalId::new();
        let stranger = PrincipalId::new();

        let block = chain
            .mine_block(vec![
                Tx::cancel_invoice(stranger, InvoiceId::new(1)),
                Tx::create_invoice(issuer, stranger, 10, "consulting", 5),
            ])
            .unwrap();

        assert_eq!(block.receipt(0).unwrap().result_string(), "(err u101)");
        assert_eq!(block.receipt(1).unwrap().result_string(), "(ok u1)");
        assert_eq!(block.receipt(1).unwrap().sender, issuer);
        assert!(block.receipt(2).is_none());
    }

    /// Records the chain height observed while events are being published.
    #[derive(Default)]
    struct HeightRecordingBus {
        chain: OnceLock<Weak<SimulatedChain<Arc<HeightRecordingBus>>>>,
        seen: Mutex<Vec<u64>>,
    }

    impl EventBus<EventEnvelope<JsonValue>> for HeightRecordingBus {
        type Error = Infallible;

        fn publish(&self, _message: EventEnvelope<JsonValue>) -> Result<(), Self::Error> {
            if let Some(chain) = self.chain.get().and_then(Weak::upgrade) {
                self.seen.lock().unwrap().push(chain.current_height().get());
            }
            Ok(())
        }

        fn subscribe(&self) -> Subscription<EventEnvelope<JsonValue>> {
            Subscription::new(std::sync::mpsc::channel().1)
        }
    }

    #[test]
    fn height_advances_only_after_the_block_executes() {
        let bus = Arc::new(HeightRecordingBus::default());
        let chain = Arc::new(SimulatedChain::new(&LedgerConfig::default(), bus.clone()));
        assert!(bus.chain.set(Arc::downgrade(&chain)).is_ok());
        let issuer = PrincipalId::new();

        let block = chain
            .mine_block(vec![Tx::create_invoice(issuer, issuer, 1, "x", 0)])
            .unwrap();

        assert_eq!(block.height, BlockHeight::new(2));
        assert_eq!(*bus.seen.lock().unwrap(), vec![1]);
        assert_eq!(chain.current_height(), BlockHeight::new(2));
    }
}
