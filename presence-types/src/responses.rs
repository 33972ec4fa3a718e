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

//! Response types for the presence REST API.

use serde::{Deserialize, Serialize};

use crate::role::ParticipantRole;
use crate::{MeetingId, UserId};

/// Outcome of a heartbeat, consumable by the client to decide whether to
/// re-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeartbeatStatus {
    /// The heartbeat refreshed the live session.
    Active,
    /// The supplied token belongs to a superseded session; the client should
    /// stop considering itself live.
    SessionReplaced,
    /// No session exists for this (meeting, user) pair.
    NotJoined,
}

/// Response body for `POST /api/meeting/{meeting_id}/presence/join`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JoinPresenceResponse {
    /// Opaque token the client must include in subsequent heartbeats.
    /// Invalidated by any later join for the same (meeting, user) pair.
    pub session_token: String,
}

/// Response body for `POST /api/meeting/{meeting_id}/presence/heartbeat`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeartbeatResponse {
    pub status: HeartbeatStatus,
}

/// One live participant in the roster snapshot.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ParticipantInfo {
    pub user_id: UserId,
    pub display_name: String,
    pub role: ParticipantRole,
}

/// Last-known self-reported media state of one participant.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaStateInfo {
    pub user_id: UserId,
    pub audio: Option<bool>,
    pub video: Option<bool>,
    pub video_device_lost: Option<bool>,
    pub display: Option<String>,
}

/// Response body for `GET /api/meeting/{meeting_id}/presence`.
///
/// Consumed by clients on (re)join to render existing participants and
/// their media state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RosterResponse {
    pub meeting_id: MeetingId,
    pub participants: Vec<ParticipantInfo>,
    pub media: Vec<MediaStateInfo>,
}
