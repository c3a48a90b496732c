//! Lock operation outcomes.

/// Result of releasing the server lock.
///
/// Release never aborts the caller; a failure is reported for the operator
/// to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The lock object was deleted (or was already absent).
    Released,
    /// The delete request failed; the lock may still be present.
    Failed(String),
}

impl ReleaseOutcome {
    /// Whether the release went through.
    pub fn is_released(&self) -> bool {
        matches!(self, ReleaseOutcome::Released)
    }
}
