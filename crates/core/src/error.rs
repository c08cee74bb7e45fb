//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, authorization, lifecycle). Infrastructure concerns belong elsewhere.
///
/// Every variant maps to a stable numeric code (see [`DomainError::code`]) that
/// callers and hosts can match on without parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The caller lacks the relationship (issuer / counterparty) required for
    /// the requested transition.
    #[error("unauthorized")]
    Unauthorized,

    /// A requested record was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A mutation was attempted on a record that is already settled.
    #[error("already settled")]
    AlreadySettled,

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub const CODE_UNAUTHORIZED: u32 = 100;
    pub const CODE_NOT_FOUND: u32 = 101;
    pub const CODE_ALREADY_SETTLED: u32 = 102;
    pub const CODE_VALIDATION: u32 = 103;
    pub const CODE_INVARIANT: u32 = 104;
    pub const CODE_INVALID_ID: u32 = 105;

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Stable numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            DomainError::Unauthorized => Self::CODE_UNAUTHORIZED,
            DomainError::NotFound => Self::CODE_NOT_FOUND,
            DomainError::AlreadySettled => Self::CODE_ALREADY_SETTLED,
            DomainError::Validation(_) => Self::CODE_VALIDATION,
            DomainError::InvariantViolation(_) => Self::CODE_INVARIANT,
            DomainError::InvalidId(_) => Self::CODE_INVALID_ID,
        }
    }

    /// Short machine-readable kind, used in logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Unauthorized => "unauthorized",
            DomainError::NotFound => "not_found",
            DomainError::AlreadySettled => "already_settled",
            DomainError::Validation(_) => "validation_error",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_distinct() {
        let all = [
            DomainError::Unauthorized,
            DomainError::NotFound,
            DomainError::AlreadySettled,
            DomainError::validation("x"),
            DomainError::invariant("x"),
            DomainError::invalid_id("x"),
        ];

        let codes: Vec<u32> = all.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![100, 101, 102, 103, 104, 105]);
    }

    #[test]
    fn display_includes_message() {
        let err = DomainError::validation("description too long");
        assert_eq!(err.to_string(), "validation failed: description too long");
        assert_eq!(DomainError::Unauthorized.to_string(), "unauthorized");
    }
}
