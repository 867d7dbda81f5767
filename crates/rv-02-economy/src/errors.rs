//! Economy error types.

use shared_types::ParticipantId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EconomyError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EconomyError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Negative amount {0} not allowed")]
    NegativeAmount(i64),

    #[error("Ledger objective '{0}' does not exist")]
    ObjectiveMissing(String),

    /// The dynamically resolved provider is not loaded.
    #[error("Balance provider '{0}' is not available")]
    ProviderUnavailable(String),

    /// The backend refused the operation without saying why.
    #[error("Balance backend rejected {operation} for {participant}")]
    Rejected {
        operation: &'static str,
        participant: ParticipantId,
    },

    #[error("No backend configured for economy kind {0}")]
    BackendMissing(&'static str),
}
