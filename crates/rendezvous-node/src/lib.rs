//! # Rendezvous Node
//!
//! Host process for the rendezvous service.
//!
//! ## Modular Structure
//!
//! - `config` - configuration file discovery and loading
//! - `adapters/` - host implementations of the service's outbound ports
//! - `handlers/` - bus consumers running on the runtime
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`RENDEZVOUS_CONFIG`, default `rendezvous.toml`)
//! 2. Build the economy backend the configuration selects
//! 3. Build the service, start the expiry worker and signal listener
//! 4. Start the notification logger
//!
//! ## Shutdown Sequence
//!
//! 1. Signal the handlers to stop
//! 2. Stop the controller (scheduler joined, listener dropped, registry emptied)

pub mod adapters;
pub mod config;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use rv_01_expiry_scheduler::{Clock, MonotonicClock};
use rv_02_economy::{build_economy, EconomyBackends, InMemoryScoreLedger, ProviderSlot};
use rv_03_rendezvous::{
    InMemoryDirectory, LiteralPriceEvaluator, RendezvousConfig, RendezvousPorts,
    RendezvousService,
};
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{error, info};

use crate::adapters::LoggingPresenter;
use crate::handlers::NotificationLogger;

pub struct NodeRuntime {
    service: Arc<RendezvousService>,
    directory: Arc<InMemoryDirectory>,
    ledger: Arc<InMemoryScoreLedger>,
    legacy: Arc<ProviderSlot>,
    bus: Arc<InMemoryEventBus>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Wire the service. Must be called inside a tokio runtime.
    pub fn new(config: RendezvousConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    pub fn with_clock(config: RendezvousConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        info!("Creating rendezvous node runtime");
        let runtime = Handle::try_current().context("Node runtime requires a tokio runtime")?;

        let bus = Arc::new(InMemoryEventBus::new());
        let directory = Arc::new(InMemoryDirectory::new());
        let ledger = Arc::new(InMemoryScoreLedger::with_objective(&config.economy.objective));
        let legacy = Arc::new(ProviderSlot::new());

        let backends = EconomyBackends {
            ledger: Some(ledger.clone()),
            legacy: Some(legacy.clone()),
        };
        let economy =
            build_economy(&config.economy, &backends).context("Failed to build economy backend")?;
        info!(kind = economy.kind(), currency = %config.economy.currency_name, "Economy ready");

        let ports = RendezvousPorts::new(directory.clone(), directory.clone(), economy)
            .with_presenter(Arc::new(LoggingPresenter))
            .with_pricing(Arc::new(LiteralPriceEvaluator));
        let service = Arc::new(RendezvousService::with_clock(
            config,
            ports,
            bus.clone(),
            runtime,
            clock,
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            service,
            directory,
            ledger,
            legacy,
            bus,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Start the service and the notification logger.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Rendezvous Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.service
            .start()
            .context("Failed to start the registry controller")?;

        let logger = NotificationLogger::new(self.bus.subscribe(EventFilter::all()));
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            tokio::select! {
                logged = logger.run() => {
                    info!(logged, "Notification logger finished");
                }
                _ = shutdown.changed() => {
                    info!("Notification logger received shutdown signal");
                }
            }
        });

        let config = self.service.config();
        info!(
            ttl_secs = config.request_ttl_secs,
            cooldown_secs = config.cooldown_secs,
            price = %config.create_request_price,
            listeners = self.bus.listener_count(),
            "Rendezvous service running"
        );
        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        self.service.stop();
        info!(
            notifications = self.bus.events_published(),
            "Shutdown complete"
        );
    }

    #[must_use]
    pub fn service(&self) -> Arc<RendezvousService> {
        Arc::clone(&self.service)
    }

    #[must_use]
    pub fn directory(&self) -> Arc<InMemoryDirectory> {
        Arc::clone(&self.directory)
    }

    /// Ledger behind the ledger economy.
    #[must_use]
    pub fn ledger(&self) -> Arc<InMemoryScoreLedger> {
        Arc::clone(&self.ledger)
    }

    /// Slot an external balance provider is installed into.
    #[must_use]
    pub fn legacy_provider(&self) -> Arc<ProviderSlot> {
        Arc::clone(&self.legacy)
    }

    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }
}
