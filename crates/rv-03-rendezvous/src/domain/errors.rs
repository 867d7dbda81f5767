//! Rendezvous error types.
//!
//! Every variant is recoverable by the caller. An attempted transition on a
//! terminal request is not an error: `Request::try_transition` returns
//! `false` and the call is ignored.

use rv_02_economy::EconomyError;
use shared_types::{DimensionId, ParticipantId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RendezvousError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RendezvousError {
    /// The initiator created a request too recently.
    #[error("Request cooldown active, {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: u64 },

    #[error("Requests are not allowed in dimension {dimension}")]
    DimensionDisallowed { dimension: DimensionId },

    /// The price expression could not be evaluated.
    #[error("Failed to evaluate request price: {0}")]
    PricingEvaluationFailed(String),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// The participant has no live session.
    #[error("Participant {0} is not online")]
    ParticipantUnresolvable(ParticipantId),

    /// A `RequestGuard` refused the creation.
    #[error("Request creation was vetoed")]
    CreationVetoed,

    #[error("Cannot send a request to yourself")]
    SelfRequest,

    #[error("Economy error: {0}")]
    Economy(EconomyError),
}

impl From<EconomyError> for RendezvousError {
    fn from(err: EconomyError) -> Self {
        match err {
            EconomyError::InsufficientBalance {
                required,
                available,
            } => Self::InsufficientBalance {
                required,
                available,
            },
            other => Self::Economy(other),
        }
    }
}
