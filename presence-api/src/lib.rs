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

//! Real-time session presence and media-state coordination for campusmeet
//! live meetings.
//!
//! Tracks which users are currently connected to each meeting, through
//! which transport session, with what media state, despite unreliable
//! transport signals: duplicate joins, silent disconnects, and reconnect
//! races. Meeting lifecycle, chat storage, and authorization live in other
//! services; the messaging fabric is an external collaborator reached
//! through [`events::PresenceEventSink`].
//!
//! State is in-memory and single-process. Presence does not survive a
//! restart - clients re-join on reconnect and the registry rebuilds itself.

pub mod config;
pub mod constants;
pub mod events;
pub mod media_state;
pub mod metrics;
pub mod presence;
pub mod reconciler;
pub mod routes;
pub mod sweeper;

pub use config::PresenceConfig;
pub use events::{ChannelEventSink, NatsEventSink, PresenceEventSink};
pub use media_state::{MediaState, MediaStateRegistry};
pub use presence::{PresenceRegistry, Session, SessionToken};
pub use reconciler::TransportDisconnectReconciler;
pub use routes::PresenceService;
pub use sweeper::{StaleSessionSweeper, SweeperConfig};
