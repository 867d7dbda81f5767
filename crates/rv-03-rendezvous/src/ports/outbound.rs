//! Outbound (Driven) ports.
//!
//! Everything the core needs from its host: who is online and where, how to
//! move someone, how to ask the target, how to price a request, and who may
//! veto a lifecycle step.

use crate::domain::{RendezvousError, Result};
use shared_types::{Direction, Location, ParticipantId, RequestSnapshot};

/// A live participant session as seen at lookup time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSession {
    pub id: ParticipantId,
    pub name: String,
    pub location: Location,
}

/// Online lookup by stable identity.
///
/// Holding a `ParticipantId` never keeps a session alive; "not found" means
/// offline and is never an error.
pub trait ParticipantDirectory: Send + Sync {
    fn lookup(&self, id: &ParticipantId) -> Option<ParticipantSession>;

    fn is_online(&self, id: &ParticipantId) -> bool {
        self.lookup(id).is_some()
    }
}

/// Performs the rendezvous effect.
pub trait Teleporter: Send + Sync {
    /// Move `who` to `destination`.
    ///
    /// # Errors
    /// `ParticipantUnresolvable` if `who` went offline.
    fn teleport(&self, who: &ParticipantId, destination: Location) -> Result<()>;
}

/// Renders choices and messages to participants.
pub trait Presenter: Send + Sync {
    /// Show the target an accept / deny / ignore choice for `request`.
    fn offer_choice(&self, target: &ParticipantId, request: &RequestSnapshot, expires: &str);

    /// Tell `who` about the outcome of a request they are part of.
    fn notify(&self, who: &ParticipantId, request: &RequestSnapshot);
}

/// Evaluates the configured price expression.
pub trait PriceEvaluator: Send + Sync {
    /// Price for `initiator` to create one request.
    ///
    /// # Errors
    /// A message describing why `expression` could not be evaluated.
    fn evaluate(
        &self,
        expression: &str,
        initiator: &ParticipantSession,
    ) -> std::result::Result<i64, String>;
}

/// Accepts a plain numeric literal; fractional prices are truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralPriceEvaluator;

impl PriceEvaluator for LiteralPriceEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        _initiator: &ParticipantSession,
    ) -> std::result::Result<i64, String> {
        let trimmed = expression.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Ok(value);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value.trunc() as i64),
            _ => Err(format!("not a number: '{expression}'")),
        }
    }
}

/// Vetoes lifecycle steps. Every hook returns `true` to allow.
///
/// Guards run synchronously on the caller's context, before anything is
/// committed.
pub trait RequestGuard: Send + Sync {
    fn on_creating(
        &self,
        _initiator: &ParticipantId,
        _target: &ParticipantId,
        _direction: Direction,
    ) -> bool {
        true
    }

    fn on_accepting(&self, _request: &RequestSnapshot) -> bool {
        true
    }

    fn on_denying(&self, _request: &RequestSnapshot) -> bool {
        true
    }
}

/// Presenter that shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresenter;

impl Presenter for SilentPresenter {
    fn offer_choice(&self, _target: &ParticipantId, _request: &RequestSnapshot, _expires: &str) {}

    fn notify(&self, _who: &ParticipantId, _request: &RequestSnapshot) {}
}

/// Teleporter for hosts without a world; always reports the mover offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedTeleporter;

impl Teleporter for UnsupportedTeleporter {
    fn teleport(&self, who: &ParticipantId, _destination: Location) -> Result<()> {
        Err(RendezvousError::ParticipantUnresolvable(*who))
    }
}

/// Presenter recording every call, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingPresenter {
    pub offers: parking_lot::Mutex<Vec<(ParticipantId, RequestSnapshot, String)>>,
    pub notices: parking_lot::Mutex<Vec<(ParticipantId, RequestSnapshot)>>,
}

#[cfg(test)]
impl Presenter for RecordingPresenter {
    fn offer_choice(&self, target: &ParticipantId, request: &RequestSnapshot, expires: &str) {
        self.offers
            .lock()
            .push((*target, request.clone(), expires.to_string()));
    }

    fn notify(&self, who: &ParticipantId, request: &RequestSnapshot) {
        self.notices.lock().push((*who, request.clone()));
    }
}

/// Guard that vetoes the steps it is told to, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct VetoGuard {
    pub creating: bool,
    pub accepting: bool,
    pub denying: bool,
}

#[cfg(test)]
impl RequestGuard for VetoGuard {
    fn on_creating(&self, _: &ParticipantId, _: &ParticipantId, _: Direction) -> bool {
        !self.creating
    }

    fn on_accepting(&self, _: &RequestSnapshot) -> bool {
        !self.accepting
    }

    fn on_denying(&self, _: &RequestSnapshot) -> bool {
        !self.denying
    }
}
