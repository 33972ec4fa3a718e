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

//! TransportDisconnectReconciler - translates a transport-level
//! "connection closed" signal into a presence leave, while rejecting
//! signals that no longer apply.
//!
//! The transport fabric owns connection lifecycle and merely calls in with
//! a connection id. Every lookup miss on this path is a legitimate race
//! (join/leave/rejoin interleave arbitrarily) and is a silent no-op, never
//! an error.

use std::sync::Arc;

use campusmeet_presence_types::PresenceEvent;
use tracing::{debug, info};

use crate::events::PresenceEventSink;
use crate::media_state::MediaStateRegistry;
use crate::metrics::{PRESENCE_EVICTIONS_TOTAL, STALE_SIGNALS_TOTAL};
use crate::presence::PresenceRegistry;

pub struct TransportDisconnectReconciler {
    registry: Arc<PresenceRegistry>,
    media: Arc<MediaStateRegistry>,
    events: Arc<dyn PresenceEventSink>,
}

impl TransportDisconnectReconciler {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        media: Arc<MediaStateRegistry>,
        events: Arc<dyn PresenceEventSink>,
    ) -> Self {
        Self {
            registry,
            media,
            events,
        }
    }

    /// React to a closed transport connection. Returns whether a session
    /// was evicted.
    ///
    /// A disconnect whose connection id no longer matches the session's
    /// current binding refers to an already-replaced session (the user
    /// reconnected before the old tab's disconnect arrived) and is
    /// discarded without mutating state.
    pub fn handle_disconnect(&self, transport_connection_id: &str) -> bool {
        let Some((meeting_id, user_id)) = self
            .registry
            .find_by_transport_connection(transport_connection_id)
        else {
            debug!(
                "disconnect for unbound transport connection: {}",
                transport_connection_id
            );
            return false;
        };

        let Some(session) = self.registry.get_session(meeting_id, user_id) else {
            debug!(
                "disconnect raced with session removal: meeting={} user={}",
                meeting_id, user_id
            );
            return false;
        };
        if session.transport_connection_id.as_deref() != Some(transport_connection_id) {
            STALE_SIGNALS_TOTAL.with_label_values(&["disconnect"]).inc();
            debug!(
                "discarding stale disconnect: meeting={} user={} connection={}",
                meeting_id, user_id, transport_connection_id
            );
            return false;
        }

        // re-checked under the roster lock; a rejoin landing here wins
        if !self
            .registry
            .leave_if_transport_matches(meeting_id, user_id, transport_connection_id)
        {
            return false;
        }

        self.media.remove(meeting_id, user_id);
        PRESENCE_EVICTIONS_TOTAL
            .with_label_values(&["disconnect"])
            .inc();
        info!(
            "session evicted on transport disconnect: meeting={} user={} connection={}",
            meeting_id, user_id, transport_connection_id
        );
        self.events.publish(PresenceEvent::Leave {
            meeting_id,
            user_id,
        });
        true
    }
}
