//! # Registry Controller
//!
//! Wires the expiry scheduler and external lifecycle signals into registry
//! mutations, and tells the parties of every request it resolves.
//!
//! | Signal | Registry effect | Parties told | Notification |
//! |--------|-----------------|--------------|--------------|
//! | scheduler fires | `Expired`, identity-guarded removal | both, if online | `RequestExpired` |
//! | `RequestAccepted/Denied/Cancelled/Expired/Invalidated` | identity-guarded removal | none | none |
//! | `ParticipantDisconnected` | `mark_offline` sweep | the counterpart, if online | `RequestInvalidated` per swept request |

use crate::adapters::NotificationPublisher;
use crate::domain::{Request, RequestRegistry};
use crate::ports::{ParticipantDirectory, Presenter};
use parking_lot::Mutex;
use rv_01_expiry_scheduler::{Clock, ExpiryScheduler, SchedulerError};
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, RendezvousEvent};
use shared_types::{ParticipantId, RequestState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Presence-aware notification of the parties of a request.
#[derive(Clone)]
struct Announcer {
    directory: Arc<dyn ParticipantDirectory>,
    presenter: Arc<dyn Presenter>,
    publisher: NotificationPublisher,
}

impl Announcer {
    fn tell(&self, party: &ParticipantId, request: &Request) {
        if self.directory.is_online(party) {
            self.presenter.notify(party, &request.snapshot());
        }
    }

    /// Notify both parties that are still online.
    fn tell_parties(&self, request: &Request) {
        self.tell(&request.initiator(), request);
        self.tell(&request.target(), request);
    }

    /// Tell both parties and publish `RequestExpired` on the runtime,
    /// off the expiry worker.
    fn expired(&self, request: Arc<Request>) {
        let announcer = self.clone();
        self.publisher.runtime().spawn(async move {
            announcer.tell_parties(&request);
            announcer
                .publisher
                .publish(RendezvousEvent::RequestExpired(request.snapshot()))
                .await;
        });
    }

    /// Sweep `participant`, tell each counterpart, publish the invalidations.
    fn sweep(&self, registry: &RequestRegistry, participant: &ParticipantId) -> Vec<Arc<Request>> {
        let swept = registry.mark_offline(participant);
        for request in &swept {
            if let Some(other) = request.counterpart(participant) {
                self.tell(&other, request);
            }
            self.publisher
                .dispatch(RendezvousEvent::RequestInvalidated(request.snapshot()));
        }
        if !swept.is_empty() {
            info!(participant = %participant, swept = swept.len(), "Participant requests invalidated");
        }
        swept
    }
}

pub struct RegistryController {
    registry: Arc<RequestRegistry>,
    scheduler: Arc<ExpiryScheduler<Request>>,
    announcer: Announcer,
    listener: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl RegistryController {
    /// Build the scheduler and registry and install the expiry callback.
    ///
    /// Notifications are published on `runtime`; nothing runs until
    /// [`start`](Self::start).
    pub fn new(
        bus: Arc<InMemoryEventBus>,
        runtime: Handle,
        directory: Arc<dyn ParticipantDirectory>,
        presenter: Arc<dyn Presenter>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        let scheduler = Arc::new(ExpiryScheduler::with_clock(clock, poll_interval));
        let registry = Arc::new(RequestRegistry::new(scheduler.clone()));
        let announcer = Announcer {
            directory,
            presenter,
            publisher: NotificationPublisher::new(bus, runtime),
        };

        // The registry owns the scheduler, so the callback must not own the registry.
        let weak_registry: Weak<RequestRegistry> = Arc::downgrade(&registry);
        let notifier = announcer.clone();
        scheduler.set_expire_callback(Arc::new(move |request: Arc<Request>| -> anyhow::Result<()> {
            let Some(registry) = weak_registry.upgrade() else {
                return Ok(());
            };
            on_expired(&registry, &notifier, request);
            Ok(())
        }));

        Self {
            registry,
            scheduler,
            announcer,
            listener: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// Start the expiry worker and listen for bus signals.
    ///
    /// # Errors
    /// `AlreadyRunning` if started twice, `SpawnFailed` if the worker
    /// thread could not be created.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.scheduler.start()?;
        self.stopped.store(false, Ordering::Release);

        let mut signals = self
            .announcer
            .publisher
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Resolution, EventTopic::Presence]));
        let registry = self.registry.clone();
        let announcer = self.announcer.clone();

        let task = self.announcer.publisher.runtime().spawn(async move {
            while let Some(event) = signals.recv().await {
                apply_signal(&registry, &announcer, &event);
            }
            debug!("Registry signal listener finished");
        });
        *self.listener.lock() = Some(task);

        info!("Registry controller started");
        Ok(())
    }

    /// Stop the worker, drop the signal listener and empty the registry.
    ///
    /// Idempotent.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.scheduler.stop();
        if let Some(task) = self.listener.lock().take() {
            task.abort();
        }
        self.registry.clear();
        info!("Registry controller stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<RequestRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<ExpiryScheduler<Request>> {
        &self.scheduler
    }

    #[must_use]
    pub fn publisher(&self) -> &NotificationPublisher {
        &self.announcer.publisher
    }

    /// Registry bookkeeping for one resolution, then tell the online parties.
    pub fn resolved(&self, request: &Request) {
        self.registry.remove_request(request);
        self.announcer.tell_parties(request);
    }

    /// Sweep `participant` right away and notify the other parties.
    pub fn participant_disconnected(&self, participant: &ParticipantId) -> Vec<Arc<Request>> {
        self.announcer.sweep(&self.registry, participant)
    }
}

impl Drop for RegistryController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn on_expired(registry: &RequestRegistry, announcer: &Announcer, request: Arc<Request>) {
    let committed = request.transition(RequestState::Expired).is_committed();
    registry.remove_request(&request);
    if committed {
        debug!(request = %request.id(), initiator = %request.initiator(), target = %request.target(), "Request expired");
        announcer.expired(request);
    }
}

fn apply_signal(registry: &RequestRegistry, announcer: &Announcer, event: &RendezvousEvent) {
    match event {
        RendezvousEvent::ParticipantDisconnected(participant) => {
            // A session that came back before the signal arrived keeps its requests.
            if announcer.directory.is_online(participant) {
                warn!(participant = %participant, "Disconnect signal for an online participant ignored");
                return;
            }
            announcer.sweep(registry, participant);
        }
        other => {
            if let Some(snapshot) = other.request() {
                registry.remove_entry(&snapshot.initiator, &snapshot.target, snapshot.id);
            }
        }
    }
}
