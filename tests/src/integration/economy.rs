//! # Priced Requests
//!
//! Creation pricing against each economy backend, wired the way the node
//! runtime wires them from configuration.

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use rendezvous_node::NodeRuntime;
    use rv_02_economy::{
        build_economy, BalanceProvider, EconomyBackends, EconomyConfig, EconomyError,
        EconomyKind, EconomySystem, InMemoryScoreLedger, ProviderSlot, ScoreLedger, ScoreOp,
    };
    use rv_03_rendezvous::{RendezvousApi, RendezvousConfig, RendezvousError};
    use shared_types::{Direction, Location, ParticipantId};
    use std::collections::HashMap;
    use std::sync::Arc;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    #[derive(Default)]
    struct Wallets {
        balances: Mutex<HashMap<ParticipantId, i64>>,
    }

    impl BalanceProvider for Wallets {
        fn name(&self) -> &str {
            "wallets"
        }

        fn get(&self, who: &ParticipantId) -> i64 {
            self.balances.lock().get(who).copied().unwrap_or(0)
        }

        fn set(&self, who: &ParticipantId, amount: i64) -> bool {
            self.balances.lock().insert(*who, amount);
            true
        }

        fn add(&self, who: &ParticipantId, amount: i64) -> bool {
            *self.balances.lock().entry(*who).or_insert(0) += amount;
            true
        }

        fn reduce(&self, who: &ParticipantId, amount: i64) -> bool {
            *self.balances.lock().entry(*who).or_insert(0) -= amount;
            true
        }

        fn transfer(&self, from: &ParticipantId, to: &ParticipantId, amount: i64, _note: &str) -> bool {
            self.reduce(from, amount) && self.add(to, amount)
        }
    }

    fn priced(kind: EconomyKind, price: &str) -> RendezvousConfig {
        let mut config = RendezvousConfig {
            cooldown_secs: 0,
            create_request_price: price.into(),
            ..RendezvousConfig::default()
        };
        config.economy.enabled = true;
        config.economy.kind = kind;
        config
    }

    fn join_pair(node: &NodeRuntime) -> (ParticipantId, ParticipantId) {
        let (a, b) = (ParticipantId::random(), ParticipantId::random());
        node.directory().join(a, "alice", Location::default());
        node.directory().join(b, "bob", Location::default());
        (a, b)
    }

    // =========================================================================
    // LEDGER BACKEND
    // =========================================================================

    #[test]
    fn test_ledger_debit_then_oversized_transfer() {
        let ledger = Arc::new(InMemoryScoreLedger::with_objective("money"));
        let backends = EconomyBackends {
            ledger: Some(ledger.clone()),
            legacy: None,
        };
        let config = EconomyConfig {
            enabled: true,
            ..EconomyConfig::default()
        };
        let economy = build_economy(&config, &backends).unwrap();
        assert_eq!(economy.kind(), "ledger");

        let (x, y) = (ParticipantId::random(), ParticipantId::random());
        economy.set(&x, 100).unwrap();
        economy.reduce(&x, 30).unwrap();
        assert_eq!(economy.get(&x).unwrap(), 70);

        assert!(matches!(
            economy.transfer(&x, &y, 1000),
            Err(EconomyError::InsufficientBalance { .. })
        ));
        assert_eq!(economy.get(&x).unwrap(), 70);
        assert_eq!(ledger.score("money", &y), Some(0));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_node_charges_initiator_from_ledger() {
        let node = NodeRuntime::new(priced(EconomyKind::Ledger, "25")).unwrap();
        node.start().await.unwrap();
        let (alice, bob) = join_pair(&node);
        node.ledger()
            .modify("money", &alice, ScoreOp::Set(40))
            .unwrap();

        let service = node.service();
        service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();
        assert_eq!(node.ledger().score("money", &alice), Some(15));

        let err = service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RendezvousError::InsufficientBalance {
                required: 25,
                available: 15
            }
        );
        // The first request is untouched by the refused one.
        assert!(service.find_request(&alice, &bob).is_some());
        node.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_free_requests_skip_the_economy() {
        let node = NodeRuntime::new(priced(EconomyKind::Ledger, "0")).unwrap();
        node.start().await.unwrap();
        let (alice, bob) = join_pair(&node);

        node.service()
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();
        assert_eq!(node.ledger().score("money", &alice), Some(0));
        node.shutdown().await;
    }

    // =========================================================================
    // LEGACY BRIDGE
    // =========================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_legacy_provider_installed_after_start() {
        let node = NodeRuntime::new(priced(EconomyKind::LegacyBridge, "10")).unwrap();
        node.start().await.unwrap();
        let (alice, bob) = join_pair(&node);

        let wallets = Arc::new(Wallets::default());
        wallets.set(&alice, 12);
        node.legacy_provider().install(wallets.clone());

        node.service()
            .create_request(alice, bob, Direction::ToInitiator)
            .await
            .unwrap();
        assert_eq!(wallets.get(&alice), 2);

        node.legacy_provider().unload();
        let err = node
            .service()
            .create_request(bob, alice, Direction::ToTarget)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RendezvousError::Economy(EconomyError::ProviderUnavailable(_))
        ));
        node.shutdown().await;
    }

    #[test]
    fn test_legacy_backend_must_be_wired() {
        let config = EconomyConfig {
            enabled: true,
            kind: EconomyKind::LegacyBridge,
            ..EconomyConfig::default()
        };
        let backends = EconomyBackends {
            ledger: None,
            legacy: None,
        };
        assert!(matches!(
            build_economy(&config, &backends),
            Err(EconomyError::BackendMissing(_))
        ));
    }

    #[test]
    fn test_slot_resolves_latest_provider() {
        let slot = ProviderSlot::new();
        let config = EconomyConfig {
            enabled: true,
            kind: EconomyKind::LegacyBridge,
            ..EconomyConfig::default()
        };
        let backends = EconomyBackends {
            ledger: None,
            legacy: Some(Arc::new(slot)),
        };
        let economy = build_economy(&config, &backends).unwrap();
        assert_eq!(economy.kind(), "legacy-bridge");
        assert!(matches!(
            economy.get(&ParticipantId::random()),
            Err(EconomyError::ProviderUnavailable(_))
        ));
    }
}
