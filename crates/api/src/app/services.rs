use std::sync::Arc;

use serde_json::Value as JsonValue;

use ledger_auth::PrincipalId;
use ledger_core::{BlockHeight, ChainClock};
use ledger_events::{EventEnvelope, InMemoryEventBus};
use ledger_infra::{
    CallValue, InvoiceLedger, LedgerCall, LedgerConfig, LedgerError, SimulatedChain, Tx,
};

pub type AppBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

/// Application services shared by every handler.
#[derive(Debug)]
pub struct AppServices {
    chain: SimulatedChain<AppBus>,
}

/// Outcome of a call mined in its own block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub block_height: BlockHeight,
    pub result: Result<CallValue, LedgerError>,
}

impl AppServices {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            chain: SimulatedChain::in_memory(config),
        }
    }

    pub fn ledger(&self) -> &InvoiceLedger<AppBus> {
        self.chain.ledger()
    }

    pub fn current_height(&self) -> BlockHeight {
        self.chain.current_height()
    }

    /// Mine `call` as a one-transaction block with `caller` as sender.
    pub fn submit(&self, caller: PrincipalId, call: LedgerCall) -> Result<Submitted, LedgerError> {
        let block = self.chain.mine_block(vec![Tx::new(caller, call)])?;
        let receipt = block
            .receipts
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::Unavailable("block carried no receipt".to_string()))?;

        Ok(Submitted {
            block_height: block.height,
            result: receipt.result,
        })
    }
}
