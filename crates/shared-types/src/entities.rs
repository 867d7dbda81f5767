//! # Core Entities
//!
//! ## Clusters
//!
//! - **Identity**: `ParticipantId`, `RequestId`
//! - **World**: `DimensionId`, `Position`, `Location`
//! - **Requests**: `Direction`, `RequestState`, `RequestSnapshot`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Stable identity of a participant.
///
/// Survives disconnects; never used to keep a session alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Generate a fresh random identity.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of one request instance.
///
/// Two requests for the same ordered pair always have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// CLUSTER B: WORLD
// =============================================================================

/// Identifier of the dimension (world partition) a participant is in.
pub type DimensionId = i32;

/// A point in a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Where a participant currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub dimension: DimensionId,
    pub position: Position,
}

// =============================================================================
// CLUSTER C: REQUESTS
// =============================================================================

/// Which party physically moves when a request is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The initiator moves to the target.
    ToTarget,
    /// The target moves to the initiator.
    ToInitiator,
}

impl Direction {
    /// The command name players know this direction by.
    #[must_use]
    pub fn command_name(self) -> &'static str {
        match self {
            Self::ToTarget => "tpa",
            Self::ToInitiator => "tpahere",
        }
    }
}

/// Lifecycle state of a request.
///
/// `Available` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestState {
    Available = 0,
    Accepted = 1,
    Denied = 2,
    Cancelled = 3,
    Expired = 4,
    InitiatorOffline = 5,
    TargetOffline = 6,
}

impl RequestState {
    /// Decode from the `repr(u8)` discriminant.
    #[must_use]
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Available),
            1 => Some(Self::Accepted),
            2 => Some(Self::Denied),
            3 => Some(Self::Cancelled),
            4 => Some(Self::Expired),
            5 => Some(Self::InitiatorOffline),
            6 => Some(Self::TargetOffline),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Available
    }

    /// Human-readable description shown to participants.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Available => "Request is available",
            Self::Accepted => "Request was accepted",
            Self::Denied => "Request was denied",
            Self::Cancelled => "Request was cancelled",
            Self::Expired => "Request has expired",
            Self::InitiatorOffline => "Initiator went offline",
            Self::TargetOffline => "Target went offline",
        }
    }
}

/// Immutable view of a request at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub id: RequestId,
    pub initiator: ParticipantId,
    pub target: ParticipantId,
    pub direction: Direction,
    pub state: RequestState,
    /// Wall-clock creation time, display only.
    pub created_at: DateTime<Utc>,
    /// Wall-clock instant the request lapses, display only.
    pub expires_at_wall: DateTime<Utc>,
}
