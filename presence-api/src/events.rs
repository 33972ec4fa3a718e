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

//! Broadcast seam to the external messaging fabric.
//!
//! The fabric owns delivery; this module only hands events to it. Publish
//! failures are logged and dropped - presence is advisory, and a missed
//! leave broadcast is self-correcting on the next sync or sweep cycle.

use bytes::Bytes;
use campusmeet_presence_types::PresenceEvent;
use tokio::sync::mpsc;
use tracing::warn;

/// Sink for presence events, one per eviction path consumer. Implemented
/// over NATS in production and over an in-process channel in tests and
/// embedded setups.
pub trait PresenceEventSink: Send + Sync {
    fn publish(&self, event: PresenceEvent);
}

/// Publishes JSON-encoded events to the meeting-scoped subject
/// `{prefix}.{meeting_id}.presence`, fire and forget.
pub struct NatsEventSink {
    client: async_nats::Client,
    subject_prefix: String,
}

impl NatsEventSink {
    pub fn new(client: async_nats::Client, subject_prefix: impl Into<String>) -> Self {
        Self {
            client,
            subject_prefix: subject_prefix.into(),
        }
    }
}

impl PresenceEventSink for NatsEventSink {
    fn publish(&self, event: PresenceEvent) {
        let subject = format!("{}.{}.presence", self.subject_prefix, event.meeting_id());
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("failed to encode presence event: {}", e);
                return;
            }
        };
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = client.publish(subject, Bytes::from(payload)).await {
                warn!("failed to publish presence event: {}", e);
            }
        });
    }
}

/// In-process sink over an unbounded channel, for embedders that fan out
/// themselves and for observing events in tests.
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<PresenceEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresenceEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl PresenceEventSink for ChannelEventSink {
    fn publish(&self, event: PresenceEvent) {
        // receiver dropped means nobody is listening anymore
        let _ = self.sender.send(event);
    }
}
