//! # Inbound Port - RendezvousApi
//!
//! The driving port used by command and UI layers.
//!
//! | Method | Caller | Effect |
//! |--------|--------|--------|
//! | `create_request` | initiator | cooldown, price, register, offer choice |
//! | `accept` / `deny` | target | refresh, veto hooks, terminal transition |
//! | `cancel` | initiator | refresh, terminal transition |
//! | `resolve_incoming` / `cancel_outgoing` | either | resolve the only matching request |
//! | `participant_disconnected` | host | immediate offline sweep |

use crate::domain::{Request, Result};
use async_trait::async_trait;
use shared_types::{Direction, ParticipantId, RequestSnapshot};
use std::sync::Arc;

/// What the target wants done with an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Deny,
}

/// Outcome of resolving "the" request when the caller named no counterpart.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// Nothing outstanding.
    None,
    /// Exactly one request matched; its state after the attempt.
    Resolved(RequestSnapshot),
    /// Several matched; the caller must pick one of these counterparts.
    Ambiguous(Vec<ParticipantId>),
}

#[async_trait]
pub trait RendezvousApi: Send + Sync {
    /// Run the creation checks and register a new request.
    ///
    /// # Errors
    /// - `SelfRequest`: initiator and target are the same participant
    /// - `ParticipantUnresolvable`: either side is offline
    /// - `CreationVetoed`: a `RequestGuard` refused
    /// - `DimensionDisallowed`: the initiator stands in a blocked dimension
    /// - `CooldownActive`: the initiator created a request too recently
    /// - `PricingEvaluationFailed`: the price expression did not evaluate
    /// - `InsufficientBalance` / `Economy`: the debit failed
    async fn create_request(
        &self,
        initiator: ParticipantId,
        target: ParticipantId,
        direction: Direction,
    ) -> Result<Arc<Request>>;

    /// Accept on the target's behalf. `false` if the request was no longer
    /// available, was vetoed, or another resolution won.
    async fn accept(&self, request: &Arc<Request>) -> bool;

    /// Deny on the target's behalf.
    async fn deny(&self, request: &Arc<Request>) -> bool;

    /// Withdraw on the initiator's behalf.
    async fn cancel(&self, request: &Arc<Request>) -> bool;

    fn find_request(&self, initiator: &ParticipantId, target: &ParticipantId)
        -> Option<Arc<Request>>;

    /// Initiators with a request outstanding towards `target`.
    fn list_incoming(&self, target: &ParticipantId) -> Vec<ParticipantId>;

    /// Requests `initiator` has outstanding.
    fn list_outgoing(&self, initiator: &ParticipantId) -> Vec<Arc<Request>>;

    async fn resolve_incoming(&self, target: ParticipantId, resolution: Resolution)
        -> ResolveOutcome;

    async fn cancel_outgoing(&self, initiator: ParticipantId) -> ResolveOutcome;

    /// Sweep every request `participant` is part of. Returns how many were
    /// invalidated.
    async fn participant_disconnected(&self, participant: ParticipantId) -> usize;
}
