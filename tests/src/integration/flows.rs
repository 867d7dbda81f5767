//! # Request Lifecycle Flows
//!
//! End-to-end scenarios through `RendezvousService`, the expiry scheduler
//! and the shared bus, with a manual clock driving time.
//!
//! ```text
//! create ──► Available ──┬── accept ──► Accepted   (mover teleported)
//!                       ├── deny ────► Denied
//!                       ├── cancel ──► Cancelled
//!                       ├── TTL ─────► Expired    (scheduler thread)
//!                       └── leave ───► *Offline   (disconnect sweep)
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{at, quick_config, Harness};
    use rv_02_economy::NoOpEconomy;
    use rv_03_rendezvous::{RendezvousApi, RendezvousConfig, Resolution, ResolveOutcome};
    use shared_bus::{EventPublisher, RendezvousEvent};
    use shared_types::{Direction, RequestState};
    use std::sync::Arc;
    use std::time::Duration;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn harness(config: RendezvousConfig) -> Harness {
        Harness::start(config, Arc::new(NoOpEconomy))
    }

    fn is_resolution(event: &RendezvousEvent) -> bool {
        !matches!(
            event,
            RendezvousEvent::RequestCreated(_) | RendezvousEvent::ParticipantDisconnected(_)
        )
    }

    // =========================================================================
    // ACCEPTANCE
    // =========================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_accept_moves_initiator_to_target() {
        let mut h = harness(quick_config());
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 250.0);

        let req = h
            .service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();
        assert!(h.service.accept(&req).await);

        assert_eq!(h.directory.location_of(&alice), Some(at(0, 250.0)));
        assert_eq!(h.directory.location_of(&bob), Some(at(0, 250.0)));
        assert!(h.service.registry().is_empty());

        match h.wait_for(is_resolution).await {
            RendezvousEvent::RequestAccepted(snapshot) => {
                assert_eq!(snapshot.id, req.id());
                assert_eq!(snapshot.state, RequestState::Accepted);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_accept_here_moves_target_to_initiator() {
        let h = harness(quick_config());
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 250.0);

        let req = h
            .service
            .create_request(alice, bob, Direction::ToInitiator)
            .await
            .unwrap();
        assert!(h.service.accept(&req).await);

        assert_eq!(h.directory.location_of(&bob), Some(at(0, 1.0)));
        assert_eq!(h.directory.location_of(&alice), Some(at(0, 1.0)));
    }

    // =========================================================================
    // SINGLE RESOLUTION
    // =========================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_second_resolution_is_refused() {
        let mut h = harness(quick_config());
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 2.0);

        let req = h
            .service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();

        assert!(h.service.deny(&req).await);
        assert!(!h.service.deny(&req).await);
        assert!(!h.service.accept(&req).await);
        assert!(!h.service.cancel(&req).await);
        assert_eq!(req.state(), RequestState::Denied);
        assert_eq!(h.directory.location_of(&alice), Some(at(0, 1.0)));

        assert!(matches!(
            h.wait_for(is_resolution).await,
            RendezvousEvent::RequestDenied(_)
        ));
        // Nothing follows the single resolution.
        assert!(
            tokio::time::timeout(Duration::from_millis(100), h.events.recv())
                .await
                .is_err()
        );

        // Both parties heard about the denial exactly once.
        let notices = h.presenter.notices.lock();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|(_, s)| s.state == RequestState::Denied));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_accept_and_cancel_settle_once() {
        for _ in 0..25 {
            let h = harness(quick_config());
            let alice = h.join("alice", 1.0);
            let bob = h.join("bob", 2.0);
            let req = h
                .service
                .create_request(alice, bob, Direction::ToTarget)
                .await
                .unwrap();

            let (s1, r1) = (h.service.clone(), req.clone());
            let (s2, r2) = (h.service.clone(), req.clone());
            let accept = tokio::spawn(async move { s1.accept(&r1).await });
            let cancel = tokio::spawn(async move { s2.cancel(&r2).await });
            let (accepted, cancelled) = (accept.await.unwrap(), cancel.await.unwrap());

            assert!(accepted ^ cancelled);
            assert!(h.service.registry().is_empty());
            assert_eq!(h.presenter.notices.lock().len(), 2);
        }
    }

    // =========================================================================
    // EXPIRY
    // =========================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_expires_request_after_ttl() {
        let mut h = harness(RendezvousConfig {
            request_ttl_secs: 5,
            ..quick_config()
        });
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 2.0);

        let req = h
            .service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(4));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(req.state(), RequestState::Available);

        h.clock.advance(Duration::from_secs(2));
        match h.wait_for(is_resolution).await {
            RendezvousEvent::RequestExpired(snapshot) => {
                assert_eq!(snapshot.id, req.id());
                assert_eq!(snapshot.state, RequestState::Expired);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(h.service.find_request(&alice, &bob).is_none());
        assert!(!h.service.accept(&req).await);

        // Both parties are told, once each, whichever path expired it.
        let notices = h.presenter.notices.lock();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|(_, s)| s.state == RequestState::Expired));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replaced_request_expiry_keeps_replacement() {
        let mut h = harness(RendezvousConfig {
            request_ttl_secs: 5,
            ..quick_config()
        });
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 2.0);

        let first = h
            .service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();
        h.clock.advance(Duration::from_secs(3));
        let second = h
            .service
            .create_request(alice, bob, Direction::ToInitiator)
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(3));
        let expired = h.wait_for(is_resolution).await;
        assert_eq!(expired.request().map(|s| s.id), Some(first.id()));

        let current = h.service.find_request(&alice, &bob).unwrap();
        assert_eq!(current.id(), second.id());
        assert_eq!(current.direction(), Direction::ToInitiator);
        assert!(h.service.registry().is_consistent());
    }

    // =========================================================================
    // PRESENCE
    // =========================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_invalidates_both_directions() {
        let mut h = harness(quick_config());
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 2.0);
        let carol = h.join("carol", 3.0);

        h.service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();
        h.service
            .create_request(bob, carol, Direction::ToTarget)
            .await
            .unwrap();

        h.directory.leave(&bob);
        assert_eq!(h.service.participant_disconnected(bob).await, 2);

        let mut states = Vec::new();
        for _ in 0..2 {
            match h.wait_for(is_resolution).await {
                RendezvousEvent::RequestInvalidated(snapshot) => states.push(snapshot.state),
                other => panic!("unexpected event {other:?}"),
            }
        }
        states.sort_by_key(|s| *s as u8);
        assert_eq!(
            states,
            vec![RequestState::InitiatorOffline, RequestState::TargetOffline]
        );
        assert!(h.service.registry().is_empty());

        // Only the parties still online are told.
        let notices = h.presenter.notices.lock();
        let told: Vec<_> = notices.iter().map(|(who, _)| *who).collect();
        assert!(told.contains(&alice));
        assert!(told.contains(&carol));
        assert!(!told.contains(&bob));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bus_disconnect_sweeps_registry() {
        let mut h = harness(quick_config());
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 2.0);

        h.service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();

        h.directory.leave(&alice);
        h.bus
            .publish(RendezvousEvent::ParticipantDisconnected(alice))
            .await;

        match h.wait_for(is_resolution).await {
            RendezvousEvent::RequestInvalidated(snapshot) => {
                assert_eq!(snapshot.state, RequestState::InitiatorOffline);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(h.service.list_incoming(&bob).is_empty());

        let notices = h.presenter.notices.lock();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, bob);
        assert_eq!(notices[0].1.state, RequestState::InitiatorOffline);
    }

    // =========================================================================
    // BATCH COMMANDS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resolve_incoming_needs_single_sender() {
        let h = harness(quick_config());
        let alice = h.join("alice", 1.0);
        let bob = h.join("bob", 2.0);
        let carol = h.join("carol", 3.0);

        assert_eq!(
            h.service.resolve_incoming(bob, Resolution::Accept).await,
            ResolveOutcome::None
        );

        h.service
            .create_request(alice, bob, Direction::ToTarget)
            .await
            .unwrap();
        h.service
            .create_request(carol, bob, Direction::ToTarget)
            .await
            .unwrap();

        match h.service.resolve_incoming(bob, Resolution::Deny).await {
            ResolveOutcome::Ambiguous(mut senders) => {
                let mut expected = vec![alice, carol];
                senders.sort();
                expected.sort();
                assert_eq!(senders, expected);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(h.service.list_incoming(&bob).len(), 2);

        let carol_req = h.service.find_request(&carol, &bob).unwrap();
        assert!(h.service.cancel(&carol_req).await);

        match h.service.resolve_incoming(bob, Resolution::Deny).await {
            ResolveOutcome::Resolved(snapshot) => {
                assert_eq!(snapshot.initiator, alice);
                assert_eq!(snapshot.state, RequestState::Denied);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
