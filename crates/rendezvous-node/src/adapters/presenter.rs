//! Presenter that renders choices and outcomes as log lines.

use rv_03_rendezvous::Presenter;
use shared_types::{ParticipantId, RequestSnapshot};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPresenter;

impl Presenter for LoggingPresenter {
    fn offer_choice(&self, target: &ParticipantId, request: &RequestSnapshot, expires: &str) {
        info!(
            target_participant = %target,
            initiator = %request.initiator,
            command = request.direction.command_name(),
            expires,
            "[accept] [deny] [ignore]"
        );
    }

    fn notify(&self, who: &ParticipantId, request: &RequestSnapshot) {
        info!(
            participant = %who,
            request = %request.id,
            "{}",
            request.state.description()
        );
    }
}
