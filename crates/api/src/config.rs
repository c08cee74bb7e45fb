//! API process configuration.

use ledger_infra::LedgerConfig;

pub const BIND_ADDR_ENV: &str = "LEDGER_BIND_ADDR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub ledger: LedgerConfig,
}

impl ApiConfig {
    /// Defaults everywhere except the signing secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: jwt_secret.into(),
            ledger: LedgerConfig::default(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let jwt_secret = lookup(JWT_SECRET_ENV).unwrap_or_else(|| {
            tracing::warn!("{JWT_SECRET_ENV} not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        Self {
            bind_addr: lookup(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            ledger: LedgerConfig::from_lookup(&lookup),
        }
    }
}
