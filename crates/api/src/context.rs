use ledger_auth::PrincipalId;

/// Caller context for a request (the authenticated identity).
///
/// Immutable and present for every invoice route; it becomes the caller of
/// whatever ledger call the request performs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallerContext {
    principal_id: PrincipalId,
}

impl CallerContext {
    pub fn new(principal_id: PrincipalId) -> Self {
        Self { principal_id }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }
}
