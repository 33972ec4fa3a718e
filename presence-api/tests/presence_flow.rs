/*
 * Copyright 2026 CampusMeet Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! End-to-end exercises of the presence subsystem across its components,
//! including the randomized interleaving check for reverse-index
//! consistency.

use std::sync::Arc;
use std::time::Duration;

use campusmeet_presence_types::{HeartbeatStatus, ParticipantRole, PresenceEvent};
use presence_api::events::ChannelEventSink;
use presence_api::media_state::MediaStateRegistry;
use presence_api::presence::PresenceRegistry;
use presence_api::reconciler::TransportDisconnectReconciler;
use presence_api::sweeper::{StaleSessionSweeper, SweeperConfig};

struct Harness {
    registry: Arc<PresenceRegistry>,
    media: Arc<MediaStateRegistry>,
    reconciler: TransportDisconnectReconciler,
    sweeper: StaleSessionSweeper,
    events: tokio::sync::mpsc::UnboundedReceiver<PresenceEvent>,
}

fn harness(stale_after: Duration) -> Harness {
    let registry = Arc::new(PresenceRegistry::new());
    let media = Arc::new(MediaStateRegistry::new());
    let (sink, events) = ChannelEventSink::new();
    let sink: Arc<dyn presence_api::PresenceEventSink> = Arc::new(sink);
    let reconciler =
        TransportDisconnectReconciler::new(registry.clone(), media.clone(), sink.clone());
    let sweeper = StaleSessionSweeper::new(
        registry.clone(),
        media.clone(),
        sink,
        SweeperConfig {
            interval: Duration::from_millis(5),
            stale_after,
        },
    );
    Harness {
        registry,
        media,
        reconciler,
        sweeper,
        events,
    }
}

#[test]
fn test_full_session_lifecycle() {
    let mut h = harness(Duration::from_secs(60));

    let token = h
        .registry
        .join_or_replace(7, 100, "Alice", ParticipantRole::Host);
    h.registry.bind_transport(7, 100, "ws-1");
    h.media.update(7, 100, Some(true), Some(false), None, Some("Alice"));

    assert_eq!(
        h.registry.heartbeat(7, 100, Some(&token)),
        HeartbeatStatus::Active
    );
    assert_eq!(h.registry.list_sessions(7).len(), 1);
    assert_eq!(h.registry.find_by_transport_connection("ws-1"), Some((7, 100)));

    assert!(h.reconciler.handle_disconnect("ws-1"));
    assert!(h.registry.get_session(7, 100).is_none());
    assert!(h.media.list(7).is_empty());
    assert!(h.registry.meeting_ids().is_empty());
    assert_eq!(
        h.events.try_recv().unwrap(),
        PresenceEvent::Leave {
            meeting_id: 7,
            user_id: 100
        }
    );
    assert!(h.events.try_recv().is_err());
}

#[test]
fn test_reconnect_race_suppresses_all_stale_signals() {
    let mut h = harness(Duration::from_secs(60));

    let old_token = h
        .registry
        .join_or_replace(7, 100, "Alice", ParticipantRole::Participant);
    h.registry.bind_transport(7, 100, "ws-old");
    h.media.update(7, 100, Some(false), None, None, None);

    // new tab takes over before the old tab's signals drain
    let new_token = h
        .registry
        .join_or_replace(7, 100, "Alice", ParticipantRole::Participant);
    h.registry.bind_transport(7, 100, "ws-new");

    // the zombie tab is told to stop, the seat is untouched
    assert_eq!(
        h.registry.heartbeat(7, 100, Some(&old_token)),
        HeartbeatStatus::SessionReplaced
    );
    assert!(!h.reconciler.handle_disconnect("ws-old"));

    let session = h.registry.get_session(7, 100).unwrap();
    assert_eq!(session.session_token, new_token);
    assert_eq!(session.transport_connection_id.as_deref(), Some("ws-new"));
    // a reconnect must not erase known mute state
    assert_eq!(h.media.list(7)[0].audio, Some(false));
    assert!(h.events.try_recv().is_err());
}

#[test]
fn test_sweep_and_disconnect_paths_do_not_double_evict() {
    let mut h = harness(Duration::from_millis(20));

    h.registry
        .join_or_replace(7, 100, "Alice", ParticipantRole::Participant);
    h.registry.bind_transport(7, 100, "ws-1");
    std::thread::sleep(Duration::from_millis(40));

    assert_eq!(h.sweeper.sweep_once(), 1);
    // the transport notices afterwards; the binding is already gone
    assert!(!h.reconciler.handle_disconnect("ws-1"));

    assert_eq!(
        h.events.try_recv().unwrap(),
        PresenceEvent::Leave {
            meeting_id: 7,
            user_id: 100
        }
    );
    assert!(h.events.try_recv().is_err());
}

#[test]
fn test_reverse_index_consistent_after_random_interleavings() {
    use rand::prelude::*;

    let registry = Arc::new(PresenceRegistry::new());
    let mut handles = Vec::new();
    for worker in 0..8u64 {
        let registry = registry.clone();
        handles.push(std::thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(worker);
            for i in 0..500u32 {
                let meeting = rng.gen_range(1..4);
                let user = rng.gen_range(100..106);
                match rng.gen_range(0..5) {
                    0 => {
                        registry.join_or_replace(
                            meeting,
                            user,
                            "fuzz",
                            ParticipantRole::Participant,
                        );
                    }
                    1 => {
                        registry.bind_transport(meeting, user, &format!("conn-{worker}-{i}"));
                    }
                    2 => {
                        registry.leave(meeting, user);
                    }
                    3 => {
                        // transport disconnect for whatever is currently bound
                        if let Some(session) = registry.get_session(meeting, user) {
                            if let Some(conn) = session.transport_connection_id {
                                registry.leave_if_transport_matches(meeting, user, &conn);
                            }
                        }
                    }
                    _ => {
                        registry.heartbeat(meeting, user, None);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // every bound session maps back to itself through the reverse index,
    // and the index holds nothing else
    let mut bound = 0;
    for meeting_id in registry.meeting_ids() {
        for session in registry.list_sessions(meeting_id) {
            let Some(conn) = &session.transport_connection_id else {
                continue;
            };
            bound += 1;
            assert_eq!(
                registry.find_by_transport_connection(conn),
                Some((meeting_id, session.user_id))
            );
            let mapped = registry.get_session(meeting_id, session.user_id).unwrap();
            assert_eq!(mapped.transport_connection_id.as_deref(), Some(conn.as_str()));
        }
    }
    assert_eq!(registry.transport_binding_count(), bound);
}
