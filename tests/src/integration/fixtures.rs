//! Shared wiring for the integration scenarios.

use parking_lot::Mutex;
use rv_01_expiry_scheduler::ManualClock;
use rv_02_economy::EconomySystem;
use rv_03_rendezvous::{
    InMemoryDirectory, Presenter, RendezvousConfig, RendezvousPorts, RendezvousService,
};
use shared_bus::{EventFilter, InMemoryEventBus, RendezvousEvent, Subscription};
use shared_types::{Location, ParticipantId, Position, RequestSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::timeout;

/// Presenter that remembers who was told what.
#[derive(Default)]
pub struct RecordingPresenter {
    pub offers: Mutex<Vec<(ParticipantId, RequestSnapshot)>>,
    pub notices: Mutex<Vec<(ParticipantId, RequestSnapshot)>>,
}

impl Presenter for RecordingPresenter {
    fn offer_choice(&self, target: &ParticipantId, request: &RequestSnapshot, _expires: &str) {
        self.offers.lock().push((*target, request.clone()));
    }

    fn notify(&self, who: &ParticipantId, request: &RequestSnapshot) {
        self.notices.lock().push((*who, request.clone()));
    }
}

pub struct Harness {
    pub service: Arc<RendezvousService>,
    pub directory: Arc<InMemoryDirectory>,
    pub presenter: Arc<RecordingPresenter>,
    pub bus: Arc<InMemoryEventBus>,
    pub clock: Arc<ManualClock>,
    pub events: Subscription,
}

impl Harness {
    /// Build and start a service. Must run inside a multi-threaded runtime.
    pub fn start(config: RendezvousConfig, economy: Arc<dyn EconomySystem>) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let events = bus.subscribe(EventFilter::all());
        let directory = Arc::new(InMemoryDirectory::new());
        let presenter = Arc::new(RecordingPresenter::default());
        let clock = Arc::new(ManualClock::new());

        let ports = RendezvousPorts::new(directory.clone(), directory.clone(), economy)
            .with_presenter(presenter.clone());
        let service = Arc::new(RendezvousService::with_clock(
            config,
            ports,
            bus.clone(),
            Handle::current(),
            clock.clone(),
        ));
        service.start().expect("controller starts");

        Self {
            service,
            directory,
            presenter,
            bus,
            clock,
            events,
        }
    }

    /// Bring a participant online at `x` in dimension 0.
    pub fn join(&self, name: &str, x: f64) -> ParticipantId {
        let id = ParticipantId::random();
        self.directory.join(id, name, at(0, x));
        id
    }

    pub async fn next_event(&mut self) -> RendezvousEvent {
        timeout(Duration::from_secs(3), self.events.recv())
            .await
            .expect("timed out waiting for a notification")
            .expect("bus closed")
    }

    /// Skip notifications until one matches.
    pub async fn wait_for(&mut self, pred: impl Fn(&RendezvousEvent) -> bool) -> RendezvousEvent {
        loop {
            let event = self.next_event().await;
            if pred(&event) {
                return event;
            }
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.service.stop();
    }
}

pub fn at(dimension: i32, x: f64) -> Location {
    Location {
        dimension,
        position: Position { x, y: 70.0, z: 0.0 },
    }
}

/// Defaults with no cooldown and a fast expiry poll.
pub fn quick_config() -> RendezvousConfig {
    RendezvousConfig {
        cooldown_secs: 0,
        scheduler_poll_interval_ms: 20,
        ..RendezvousConfig::default()
    }
}
