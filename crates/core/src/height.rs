//! Host-supplied height counter.
//!
//! The ledger never advances height itself; it only reads it from the host
//! through [`ChainClock`].

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Absolute position on the host's monotonically increasing height counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Height `offset` blocks after `self`.
    pub fn checked_offset(self, offset: u64) -> DomainResult<Self> {
        self.0
            .checked_add(offset)
            .map(Self)
            .ok_or_else(|| DomainError::validation("height offset overflows the height counter"))
    }

    /// The next height.
    pub fn next(self) -> DomainResult<Self> {
        self.checked_offset(1)
    }
}

impl core::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<BlockHeight> for u64 {
    fn from(value: BlockHeight) -> Self {
        value.0
    }
}

/// Read access to the host's current height.
///
/// Implemented by the host (or a simulation of it). Must be monotonically
/// non-decreasing across calls.
pub trait ChainClock: Send + Sync {
    fn current_height(&self) -> BlockHeight;
}

impl<C> ChainClock for std::sync::Arc<C>
where
    C: ChainClock + ?Sized,
{
    fn current_height(&self) -> BlockHeight {
        (**self).current_height()
    }
}
