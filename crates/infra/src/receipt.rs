//! Call receipts in the host's textual form.
//!
//! `(ok u1)` for a created id, `(ok true)` for a completed transition,
//! `(err u100)` for a rejected call.

use serde::Serialize;

use ledger_auth::PrincipalId;

use crate::ledger::LedgerError;

/// Value returned by a successful call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallValue {
    Uint(u64),
    Bool(bool),
}

impl core::fmt::Display for CallValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CallValue::Uint(v) => write!(f, "u{v}"),
            CallValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Outcome of one transaction in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_index: usize,
    pub sender: PrincipalId,
    pub result: Result<CallValue, LedgerError>,
}

impl Receipt {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The error code, when the call was rejected.
    pub fn error_code(&self) -> Option<u32> {
        self.result.as_ref().err().map(LedgerError::code)
    }

    /// Host textual rendering (`(ok u1)`, `(err u100)`).
    pub fn result_string(&self) -> String {
        self.to_string()
    }
}

impl core::fmt::Display for Receipt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.result {
            Ok(v) => write!(f, "(ok {v})"),
            Err(e) => write!(f, "(err u{})", e.code()),
        }
    }
}
