use serde::{Deserialize, Serialize};
use thiserror::Error;

use ledger_core::DomainError;

use crate::PrincipalId;

/// The relationship a caller must hold to a record for a transition.
///
/// There is no hierarchy: each relationship is a plain equality check against
/// the identity captured when the record was created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// The party that created the record.
    Issuer,
    /// The party expected to pay.
    Counterparty,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Issuer => "issuer",
            Relationship::Counterparty => "counterparty",
        }
    }
}

impl core::fmt::Display for Relationship {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two parties bound to a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parties {
    pub issuer: PrincipalId,
    pub counterparty: PrincipalId,
}

impl Parties {
    pub fn new(issuer: PrincipalId, counterparty: PrincipalId) -> Self {
        Self {
            issuer,
            counterparty,
        }
    }

    /// The identity holding `relationship`.
    pub fn holder(&self, relationship: Relationship) -> PrincipalId {
        match relationship {
            Relationship::Issuer => self.issuer,
            Relationship::Counterparty => self.counterparty,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: caller {caller} is not the {required}")]
    Forbidden {
        caller: PrincipalId,
        required: Relationship,
    },
}

impl From<AuthzError> for DomainError {
    fn from(_: AuthzError) -> Self {
        DomainError::Unauthorized
    }
}

/// Check that `caller` holds `required` with respect to `parties`.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(
    caller: PrincipalId,
    parties: &Parties,
    required: Relationship,
) -> Result<(), AuthzError> {
    if parties.holder(required) == caller {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { caller, required })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_passes_issuer_check_only() {
        let issuer = PrincipalId::new();
        let counterparty = PrincipalId::new();
        let parties = Parties::new(issuer, counterparty);

        assert!(authorize(issuer, &parties, Relationship::Issuer).is_ok());
        assert!(authorize(issuer, &parties, Relationship::Counterparty).is_err());
        assert!(authorize(counterparty, &parties, Relationship::Counterparty).is_ok());
        assert!(authorize(counterparty, &parties, Relationship::Issuer).is_err());
    }

    #[test]
    fn self_billed_record_grants_both_relationships() {
        let me = PrincipalId::new();
        let parties = Parties::new(me, me);

        assert!(authorize(me, &parties, Relationship::Issuer).is_ok());
        assert!(authorize(me, &parties, Relationship::Counterparty).is_ok());
    }

    #[test]
    fn denial_maps_to_unauthorized_domain_error() {
        let parties = Parties::new(PrincipalId::new(), PrincipalId::new());
        let stranger = PrincipalId::new();

        let err = authorize(stranger, &parties, Relationship::Issuer).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                caller: stranger,
                required: Relationship::Issuer
            }
        );

        let domain: DomainError = err.into();
        assert_eq!(domain, DomainError::Unauthorized);
        assert_eq!(domain.code(), 100);
    }
}
