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

//! Compiled defaults for policy parameters. Every value here can be
//! overridden through the environment, see [`crate::config`].

use std::time::Duration;

/// How often the stale-session sweeper scans the registry.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Age of the last accepted liveness signal beyond which a session is
/// evicted. Must stay comfortably above the client heartbeat cadence or
/// briefly-delayed clients get evicted while still live.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

pub const DEFAULT_PRESENCE_PORT: u16 = 8080;

pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// Presence events are published to `{prefix}.{meeting_id}.presence`.
pub const DEFAULT_SUBJECT_PREFIX: &str = "meeting";

/// Subject on which the transport fabric reports closed connections.
pub const DEFAULT_DISCONNECT_SUBJECT: &str = "transport.disconnected";
