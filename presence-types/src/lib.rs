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

//! Shared API types for the campusmeet presence backend.
//!
//! This crate defines the contract between the presence service and its
//! consumers (the web frontend, the transport fabric, integration tests).
//! It stays framework-agnostic: no actix-web, no transport types.

pub mod events;
pub mod requests;
pub mod responses;
pub mod role;

pub use events::PresenceEvent;
pub use responses::HeartbeatStatus;
pub use role::ParticipantRole;

/// Identifier of a meeting, as assigned by the meeting service.
pub type MeetingId = i64;

/// Identifier of a platform user account.
pub type UserId = i64;
