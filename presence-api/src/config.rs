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

//! Environment-driven configuration for the presence server.
//!
//! Sweep cadence and the staleness threshold are deployment policy, not
//! protocol constants: the threshold must exceed the client heartbeat
//! interval, which differs between deployments.

use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DISCONNECT_SUBJECT, DEFAULT_NATS_URL, DEFAULT_PRESENCE_PORT, DEFAULT_SUBJECT_PREFIX,
};
use crate::sweeper::SweeperConfig;

#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Port the HTTP seam binds to. Env: `PRESENCE_PORT`.
    pub port: u16,

    /// Messaging fabric endpoint. Env: `NATS_URL`.
    pub nats_url: String,

    /// Prefix for meeting-scoped broadcast subjects.
    /// Env: `PRESENCE_SUBJECT_PREFIX`.
    pub subject_prefix: String,

    /// Subject the transport fabric reports closed connections on.
    /// Env: `TRANSPORT_DISCONNECT_SUBJECT`.
    pub disconnect_subject: String,

    /// Sweep cadence and staleness threshold.
    /// Env: `PRESENCE_SWEEP_INTERVAL_SECS`, `PRESENCE_SESSION_STALE_SECS`.
    pub sweeper: SweeperConfig,
}

impl PresenceConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults in [`crate::constants`] for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = SweeperConfig::default();
        Self {
            port: read_env("PRESENCE_PORT", DEFAULT_PRESENCE_PORT),
            nats_url: std::env::var("NATS_URL").unwrap_or_else(|_| DEFAULT_NATS_URL.to_string()),
            subject_prefix: std::env::var("PRESENCE_SUBJECT_PREFIX")
                .unwrap_or_else(|_| DEFAULT_SUBJECT_PREFIX.to_string()),
            disconnect_subject: std::env::var("TRANSPORT_DISCONNECT_SUBJECT")
                .unwrap_or_else(|_| DEFAULT_DISCONNECT_SUBJECT.to_string()),
            sweeper: SweeperConfig {
                interval: Duration::from_secs(read_env(
                    "PRESENCE_SWEEP_INTERVAL_SECS",
                    defaults.interval.as_secs(),
                )),
                stale_after: Duration::from_secs(read_env(
                    "PRESENCE_SESSION_STALE_SECS",
                    defaults.stale_after.as_secs(),
                )),
            },
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PRESENCE_PORT,
            nats_url: DEFAULT_NATS_URL.to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            disconnect_subject: DEFAULT_DISCONNECT_SUBJECT.to_string(),
            sweeper: SweeperConfig::default(),
        }
    }
}

fn read_env<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
