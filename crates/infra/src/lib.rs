//! Infrastructure layer: configuration, the serialized ledger service, and the
//! simulated host that drives it.

pub mod chain;
pub mod config;
pub mod ledger;
pub mod receipt;

mod integration_tests;

pub use chain::{Block, SimulatedChain, Tx};
pub use config::LedgerConfig;
pub use ledger::{InMemoryLedger, InvoiceLedger, LedgerCall, LedgerError};
pub use receipt::{CallValue, Receipt};
