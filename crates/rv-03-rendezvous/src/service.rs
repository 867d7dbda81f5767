//! Rendezvous Service - creation, resolution and queries.

use crate::config::{ConfigError, RendezvousConfig};
use crate::controller::RegistryController;
use crate::domain::{Cooldown, RendezvousError, Request, RequestRegistry, Result};
use crate::ports::inbound::{RendezvousApi, Resolution, ResolveOutcome};
use crate::ports::outbound::{
    LiteralPriceEvaluator, ParticipantDirectory, Presenter, PriceEvaluator, RequestGuard,
    SilentPresenter, Teleporter,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use rv_01_expiry_scheduler::{Clock, MonotonicClock, SchedulerError};
use rv_02_economy::EconomySystem;
use shared_bus::{InMemoryEventBus, RendezvousEvent};
use shared_types::{Direction, ParticipantId, RequestSnapshot, RequestState};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Collaborators the service calls into.
#[derive(Clone)]
pub struct RendezvousPorts {
    pub directory: Arc<dyn ParticipantDirectory>,
    pub teleporter: Arc<dyn Teleporter>,
    pub economy: Arc<dyn EconomySystem>,
    pub presenter: Arc<dyn Presenter>,
    pub pricing: Arc<dyn PriceEvaluator>,
}

impl RendezvousPorts {
    /// Ports with a silent presenter and literal pricing.
    pub fn new(
        directory: Arc<dyn ParticipantDirectory>,
        teleporter: Arc<dyn Teleporter>,
        economy: Arc<dyn EconomySystem>,
    ) -> Self {
        Self {
            directory,
            teleporter,
            economy,
            presenter: Arc::new(SilentPresenter),
            pricing: Arc::new(LiteralPriceEvaluator),
        }
    }

    #[must_use]
    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    #[must_use]
    pub fn with_pricing(mut self, pricing: Arc<dyn PriceEvaluator>) -> Self {
        self.pricing = pricing;
        self
    }
}

pub struct RendezvousService {
    config: RwLock<RendezvousConfig>,
    controller: RegistryController,
    cooldown: Cooldown,
    ports: RendezvousPorts,
    guards: RwLock<Vec<Arc<dyn RequestGuard>>>,
    clock: Arc<dyn Clock>,
}

impl RendezvousService {
    /// Service on the process' monotonic clock.
    ///
    /// Notifications are published on `runtime`.
    pub fn new(
        config: RendezvousConfig,
        ports: RendezvousPorts,
        bus: Arc<InMemoryEventBus>,
        runtime: Handle,
    ) -> Self {
        Self::with_clock(config, ports, bus, runtime, Arc::new(MonotonicClock))
    }

    pub fn with_clock(
        config: RendezvousConfig,
        ports: RendezvousPorts,
        bus: Arc<InMemoryEventBus>,
        runtime: Handle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let controller = RegistryController::new(
            bus,
            runtime,
            ports.directory.clone(),
            ports.presenter.clone(),
            clock.clone(),
            config.poll_interval(),
        );
        Self {
            config: RwLock::new(config),
            controller,
            cooldown: Cooldown::new(),
            ports,
            guards: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// Start the expiry worker and the signal listener.
    pub fn start(&self) -> std::result::Result<(), SchedulerError> {
        self.controller.start()
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn add_guard(&self, guard: Arc<dyn RequestGuard>) {
        self.guards.write().push(guard);
    }

    #[must_use]
    pub fn config(&self) -> RendezvousConfig {
        self.config.read().clone()
    }

    /// Replace the configuration for future creations.
    ///
    /// Outstanding requests keep the TTL they were created with, and the
    /// running scheduler keeps its poll interval.
    pub fn reload_config(&self, config: RendezvousConfig) -> std::result::Result<(), ConfigError> {
        config.validate()?;
        *self.config.write() = config;
        info!("Rendezvous configuration reloaded");
        Ok(())
    }

    #[must_use]
    pub fn controller(&self) -> &RegistryController {
        &self.controller
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<RequestRegistry> {
        self.controller.registry()
    }

    #[must_use]
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    fn guards_allow(&self, check: impl Fn(&dyn RequestGuard) -> bool) -> bool {
        self.guards.read().iter().all(|guard| check(guard.as_ref()))
    }

    /// Refresh before an explicit action; settles the request if the
    /// refresh itself resolved it.
    async fn still_available(&self, request: &Arc<Request>) -> bool {
        if let Some(state) = request.refresh(self.ports.directory.as_ref(), self.clock.now()) {
            debug!(request = %request.id(), state = ?state, "Request lapsed before action");
            self.settle(request).await;
        }
        request.is_available()
    }

    /// Unlink, tell both parties, publish. Called once, by the path that
    /// committed the terminal state.
    async fn settle(&self, request: &Arc<Request>) {
        self.controller.resolved(request);
        if let Some(event) = resolution_event(request.snapshot()) {
            self.controller.publisher().publish(event).await;
        }
    }

    fn apply_effect(&self, request: &Request) {
        let (mover, anchor) = request.mover_and_anchor();
        let Some(destination) = self.ports.directory.lookup(&anchor) else {
            warn!(request = %request.id(), anchor = %anchor, "Rendezvous anchor went offline after accept");
            return;
        };
        if let Err(e) = self.ports.teleporter.teleport(&mover, destination.location) {
            warn!(request = %request.id(), mover = %mover, error = %e, "Rendezvous effect failed");
        }
    }
}

fn resolution_event(snapshot: RequestSnapshot) -> Option<RendezvousEvent> {
    let event = match snapshot.state {
        RequestState::Available => return None,
        RequestState::Accepted => RendezvousEvent::RequestAccepted(snapshot),
        RequestState::Denied => RendezvousEvent::RequestDenied(snapshot),
        RequestState::Cancelled => RendezvousEvent::RequestCancelled(snapshot),
        RequestState::Expired => RendezvousEvent::RequestExpired(snapshot),
        RequestState::InitiatorOffline | RequestState::TargetOffline => {
            RendezvousEvent::RequestInvalidated(snapshot)
        }
    };
    Some(event)
}

fn whole_secs_ceil(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[async_trait]
impl RendezvousApi for RendezvousService {
    async fn create_request(
        &self,
        initiator: ParticipantId,
        target: ParticipantId,
        direction: Direction,
    ) -> Result<Arc<Request>> {
        if initiator == target {
            return Err(RendezvousError::SelfRequest);
        }
        let config = self.config();

        let session = self
            .ports
            .directory
            .lookup(&initiator)
            .ok_or(RendezvousError::ParticipantUnresolvable(initiator))?;
        if !self.ports.directory.is_online(&target) {
            return Err(RendezvousError::ParticipantUnresolvable(target));
        }

        if !self.guards_allow(|g| g.on_creating(&initiator, &target, direction)) {
            debug!(initiator = %initiator, target = %target, "Request creation vetoed");
            return Err(RendezvousError::CreationVetoed);
        }

        let dimension = session.location.dimension;
        if config.is_dimension_disallowed(dimension) {
            return Err(RendezvousError::DimensionDisallowed { dimension });
        }

        // The cooldown stays consumed even if pricing or the debit fails below.
        let now = self.clock.now();
        if let Err(left) = self.cooldown.try_begin(&initiator, config.cooldown(), now) {
            return Err(RendezvousError::CooldownActive {
                remaining_secs: whole_secs_ceil(left),
            });
        }

        let price = self
            .ports
            .pricing
            .evaluate(&config.create_request_price, &session)
            .map_err(|reason| {
                error!(
                    expression = %config.create_request_price,
                    reason = %reason,
                    "Failed to evaluate request price; check the configuration"
                );
                RendezvousError::PricingEvaluationFailed(reason)
            })?;
        if price != 0 {
            self.ports.economy.reduce(&initiator, price)?;
        }

        let request = Arc::new(Request::new(
            initiator,
            target,
            direction,
            config.request_ttl(),
            now,
        ));
        self.registry().insert(request.clone());

        let snapshot = request.snapshot();
        self.ports
            .presenter
            .offer_choice(&target, &snapshot, &request.expiration_display());
        self.controller
            .publisher()
            .publish(RendezvousEvent::RequestCreated(snapshot))
            .await;

        info!(
            request = %request.id(),
            initiator = %initiator,
            target = %target,
            command = direction.command_name(),
            price,
            "Request created"
        );
        Ok(request)
    }

    async fn accept(&self, request: &Arc<Request>) -> bool {
        if !self.still_available(request).await {
            return false;
        }
        if !self.guards_allow(|g| g.on_accepting(&request.snapshot())) {
            debug!(request = %request.id(), "Accept vetoed");
            return false;
        }
        if !request.transition(RequestState::Accepted).is_committed() {
            return false;
        }

        self.apply_effect(request);
        self.settle(request).await;
        true
    }

    async fn deny(&self, request: &Arc<Request>) -> bool {
        if !self.still_available(request).await {
            return false;
        }
        if !self.guards_allow(|g| g.on_denying(&request.snapshot())) {
            debug!(request = %request.id(), "Deny vetoed");
            return false;
        }
        if !request.transition(RequestState::Denied).is_committed() {
            return false;
        }

        self.settle(request).await;
        true
    }

    async fn cancel(&self, request: &Arc<Request>) -> bool {
        if !self.still_available(request).await {
            return false;
        }
        if !request.transition(RequestState::Cancelled).is_committed() {
            return false;
        }

        self.settle(request).await;
        true
    }

    fn find_request(
        &self,
        initiator: &ParticipantId,
        target: &ParticipantId,
    ) -> Option<Arc<Request>> {
        self.registry().lookup(initiator, target)
    }

    fn list_incoming(&self, target: &ParticipantId) -> Vec<ParticipantId> {
        self.registry().list_senders_to(target)
    }

    fn list_outgoing(&self, initiator: &ParticipantId) -> Vec<Arc<Request>> {
        self.registry().list_initiated_by(initiator)
    }

    async fn resolve_incoming(
        &self,
        target: ParticipantId,
        resolution: Resolution,
    ) -> ResolveOutcome {
        let senders = self.list_incoming(&target);
        let initiator = match senders.as_slice() {
            [] => return ResolveOutcome::None,
            [only] => *only,
            _ => return ResolveOutcome::Ambiguous(senders),
        };
        let Some(request) = self.find_request(&initiator, &target) else {
            return ResolveOutcome::None;
        };

        match resolution {
            Resolution::Accept => self.accept(&request).await,
            Resolution::Deny => self.deny(&request).await,
        };
        ResolveOutcome::Resolved(request.snapshot())
    }

    async fn cancel_outgoing(&self, initiator: ParticipantId) -> ResolveOutcome {
        let outgoing = self.list_outgoing(&initiator);
        let request = match outgoing.as_slice() {
            [] => return ResolveOutcome::None,
            [only] => only.clone(),
            many => return ResolveOutcome::Ambiguous(many.iter().map(|r| r.target()).collect()),
        };

        self.cancel(&request).await;
        ResolveOutcome::Resolved(request.snapshot())
    }

    async fn participant_disconnected(&self, participant: ParticipantId) -> usize {
        self.controller.participant_disconnected(&participant).len()
    }
}
