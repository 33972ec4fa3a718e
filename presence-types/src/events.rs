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

//! Broadcast events emitted on the meeting-scoped presence subject.

use serde::{Deserialize, Serialize};

use crate::{MeetingId, UserId};

/// Event published to all connected clients of a meeting when the presence
/// of a participant changes.
///
/// A `LEAVE` is emitted on every eviction path: explicit leave, staleness
/// sweep, and transport disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceEvent {
    Leave {
        meeting_id: MeetingId,
        user_id: UserId,
    },
}

impl PresenceEvent {
    /// The meeting whose subscribers this event is scoped to.
    pub fn meeting_id(&self) -> MeetingId {
        match self {
            PresenceEvent::Leave { meeting_id, .. } => *meeting_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_event_wire_shape() {
        let event = PresenceEvent::Leave {
            meeting_id: 42,
            user_id: 1001,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "LEAVE", "meeting_id": 42, "user_id": 1001})
        );
    }
}
