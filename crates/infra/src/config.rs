//! Configuration loading and representation.

use ledger_core::BlockHeight;

/// Environment variable holding the simulated chain's starting height.
pub const GENESIS_HEIGHT_ENV: &str = "LEDGER_GENESIS_HEIGHT";

/// Ledger/host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Height of the genesis block; the first mined block is `genesis + 1`.
    pub genesis_height: BlockHeight,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_height: BlockHeight::new(1),
        }
    }
}

impl LedgerConfig {
    /// Load from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (lets tests avoid touching the real
    /// environment). Malformed values are logged and replaced by defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(GENESIS_HEIGHT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(h) => config.genesis_height = BlockHeight::new(h),
                Err(e) => tracing::warn!(
                    key = GENESIS_HEIGHT_ENV,
                    value = %raw,
                    error = %e,
                    "ignoring malformed config value"
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_genesis_height_one() {
        let config = LedgerConfig::from_lookup(|_| None);
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.genesis_height, BlockHeight::new(1));
    }

    #[test]
    fn reads_genesis_height() {
        let config = LedgerConfig::from_lookup(|key| {
            (key == GENESIS_HEIGHT_ENV).then(|| " 100 ".to_string())
        });
        assert_eq!(config.genesis_height, BlockHeight::new(100));
    }

    #[test]
    fn malformed_value_falls_back_to_default() {
        let config = LedgerConfig::from_lookup(|_| Some("tall".to_string()));
        assert_eq!(config, LedgerConfig::default());
    }
}
