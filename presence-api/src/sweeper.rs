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

//! StaleSessionSweeper - backstop for clients that vanish without any
//! disconnect signal reaching the server (process kill, network partition).
//!
//! The sweeper acts purely on heartbeat age and never inspects transport
//! state, so it stays correct even if the transport layer's disconnect
//! delivery is fully broken. Staleness is bounded to one sweep interval
//! plus the TTL threshold.

use std::sync::Arc;
use std::time::Duration;

use campusmeet_presence_types::PresenceEvent;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::constants::{DEFAULT_STALE_AFTER, DEFAULT_SWEEP_INTERVAL};
use crate::events::PresenceEventSink;
use crate::media_state::MediaStateRegistry;
use crate::metrics::PRESENCE_EVICTIONS_TOTAL;
use crate::presence::PresenceRegistry;

#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    /// Fixed sweep period.
    pub interval: Duration,
    /// Sessions whose last liveness signal is older than this are evicted.
    /// Must be strictly greater than the client heartbeat interval.
    pub stale_after: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

pub struct StaleSessionSweeper {
    registry: Arc<PresenceRegistry>,
    media: Arc<MediaStateRegistry>,
    events: Arc<dyn PresenceEventSink>,
    config: SweeperConfig,
}

impl StaleSessionSweeper {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        media: Arc<MediaStateRegistry>,
        events: Arc<dyn PresenceEventSink>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            registry,
            media,
            events,
            config,
        }
    }

    /// Run the sweep loop until the task is dropped or aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "stale-session sweeper running: interval={:?} stale_after={:?}",
            self.config.interval, self.config.stale_after
        );
        tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);
            loop {
                ticker.tick().await;
                let evicted = self.sweep_once();
                if evicted > 0 {
                    debug!("sweep pass evicted {} sessions", evicted);
                }
            }
        })
    }

    /// One full scan over every tracked meeting. Eviction is guarded by the
    /// snapshotted token: a session that rejoined after the snapshot was
    /// taken is left alone regardless of its snapshotted age.
    pub fn sweep_once(&self) -> usize {
        let mut evicted = 0;
        for meeting_id in self.registry.meeting_ids() {
            for session in self.registry.list_sessions(meeting_id) {
                let age = session.last_seen_at.elapsed();
                if age <= self.config.stale_after {
                    continue;
                }
                if !self.registry.leave_if_token_matches(
                    meeting_id,
                    session.user_id,
                    &session.session_token,
                ) {
                    continue;
                }
                self.media.remove(meeting_id, session.user_id);
                PRESENCE_EVICTIONS_TOTAL.with_label_values(&["stale"]).inc();
                info!(
                    "evicted stale session: meeting={} user={} idle={:?}",
                    meeting_id, session.user_id, age
                );
                self.events.publish(PresenceEvent::Leave {
                    meeting_id,
                    user_id: session.user_id,
                });
                evicted += 1;
            }
        }
        evicted
    }
}
