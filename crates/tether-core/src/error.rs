#![forbid(unsafe_code)]

//! Error type for the few operations that can refuse a request.
//!
//! Absence of a value is never an error: an unset cell and a cell holding a
//! null payload are both ordinary states.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CellError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("lifecycle is destroyed; observer was not attached")]
    LifecycleDestroyed,

    #[error("event already has an active observer; only one consumer is supported")]
    EventAlreadyObserved,
}

impl CellError {
    /// Whether retrying with a fresh lifecycle or after detaching the current
    /// observer could succeed.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(self, Self::EventAlreadyObserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CellError::LifecycleDestroyed.to_string(),
            "lifecycle is destroyed; observer was not attached"
        );
        assert!(
            CellError::EventAlreadyObserved
                .to_string()
                .contains("only one consumer")
        );
    }

    #[test]
    fn recoverability() {
        assert!(!CellError::LifecycleDestroyed.is_recoverable());
        assert!(CellError::EventAlreadyObserved.is_recoverable());
    }
}
