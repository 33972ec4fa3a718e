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

//! Request types for the presence REST API.
//!
//! These types define the shape of request bodies. They are used by both
//! the server (for deserialization) and clients (for serialization).

use serde::{Deserialize, Serialize};

use crate::role::ParticipantRole;
use crate::UserId;

/// Request body for `POST /api/meeting/{meeting_id}/presence/join`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JoinPresenceRequest {
    pub user_id: UserId,

    /// Display name shown in the meeting UI.
    pub display_name: String,

    pub role: ParticipantRole,
}

/// Request body for `POST /api/meeting/{meeting_id}/presence/bind`.
///
/// Sent once the underlying transport connection is established, carrying
/// the transport layer's own connection identifier.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BindTransportRequest {
    pub user_id: UserId,

    pub transport_connection_id: String,
}

/// Request body for `POST /api/meeting/{meeting_id}/presence/heartbeat`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeartbeatRequest {
    pub user_id: UserId,

    /// Token returned by the most recent join. A heartbeat carrying a token
    /// that has since been superseded is rejected with `SESSION_REPLACED`.
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Request body for `POST /api/meeting/{meeting_id}/presence/leave`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LeavePresenceRequest {
    pub user_id: UserId,
}

/// Request body for `POST /api/meeting/{meeting_id}/presence/media`.
///
/// All media fields are optional: only the fields a client provides are
/// merged into its stored state, so reporting "video off" does not require
/// resending the last-known audio state.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MediaStateRequest {
    pub user_id: UserId,

    #[serde(default)]
    pub audio: Option<bool>,

    #[serde(default)]
    pub video: Option<bool>,

    #[serde(default)]
    pub video_device_lost: Option<bool>,

    #[serde(default)]
    pub display: Option<String>,
}
