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

//! MediaStateRegistry - best-effort cache of self-reported audio/video
//! state, decoupled from session identity so mid-meeting toggles need no
//! session validation.
//!
//! State here is cosmetic, not authorization-bearing: an update for a user
//! with no active session is accepted and simply orphaned until the next
//! presence sync filters it out. Entries are deleted whenever the user's
//! presence is removed, never on session token rotation - a reconnect must
//! not erase known mute state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use campusmeet_presence_types::{MeetingId, UserId};
use tracing::debug;

/// Last-known self-reported media state of one user in one meeting.
#[derive(Debug, Clone)]
pub struct MediaState {
    pub user_id: UserId,
    pub audio: Option<bool>,
    pub video: Option<bool>,
    pub video_device_lost: Option<bool>,
    pub display: Option<String>,
}

impl MediaState {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            audio: None,
            video: None,
            video_device_lost: None,
            display: None,
        }
    }
}

#[derive(Default)]
struct MeetingMedia {
    states: Mutex<HashMap<UserId, MediaState>>,
}

pub struct MediaStateRegistry {
    meetings: RwLock<HashMap<MeetingId, Arc<MeetingMedia>>>,
}

impl Default for MediaStateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaStateRegistry {
    pub fn new() -> Self {
        Self {
            meetings: RwLock::new(HashMap::new()),
        }
    }

    /// Merge a self-reported update into the stored state. Only provided
    /// fields overwrite; a blank display is ignored. Creates the entry on
    /// first signal.
    pub fn update(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        audio: Option<bool>,
        video: Option<bool>,
        video_device_lost: Option<bool>,
        display: Option<&str>,
    ) {
        let media = self.bucket_or_create(meeting_id);
        let mut states = media.states.lock().unwrap();
        let state = states
            .entry(user_id)
            .or_insert_with(|| MediaState::new(user_id));
        if let Some(a) = audio {
            state.audio = Some(a);
        }
        if let Some(v) = video {
            state.video = Some(v);
        }
        if let Some(lost) = video_device_lost {
            state.video_device_lost = Some(lost);
        }
        if let Some(d) = display {
            if !d.trim().is_empty() {
                state.display = Some(d.to_string());
            }
        }
    }

    /// Value snapshot of every media state in a meeting, for UI sync.
    pub fn list(&self, meeting_id: MeetingId) -> Vec<MediaState> {
        let meetings = self.meetings.read().unwrap();
        let Some(media) = meetings.get(&meeting_id) else {
            return Vec::new();
        };
        let states = media.states.lock().unwrap();
        states.values().cloned().collect()
    }

    /// Drop a user's media state. Called whenever presence is removed, on
    /// any eviction path. Deletes the meeting bucket once empty.
    pub fn remove(&self, meeting_id: MeetingId, user_id: UserId) {
        let now_empty = {
            let meetings = self.meetings.read().unwrap();
            let Some(media) = meetings.get(&meeting_id) else {
                return;
            };
            let mut states = media.states.lock().unwrap();
            states.remove(&user_id);
            states.is_empty()
        };
        if now_empty {
            let mut meetings = self.meetings.write().unwrap();
            let empty = meetings
                .get(&meeting_id)
                .map(|media| media.states.lock().unwrap().is_empty())
                .unwrap_or(false);
            if empty {
                meetings.remove(&meeting_id);
                debug!("media bucket pruned: meeting={}", meeting_id);
            }
        }
    }

    fn bucket_or_create(&self, meeting_id: MeetingId) -> Arc<MeetingMedia> {
        {
            let meetings = self.meetings.read().unwrap();
            if let Some(media) = meetings.get(&meeting_id) {
                return media.clone();
            }
        }
        let mut meetings = self.meetings.write().unwrap();
        meetings
            .entry(meeting_id)
            .or_insert_with(|| Arc::new(MeetingMedia::default()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_merge_keeps_unprovided_fields() {
        let reg = MediaStateRegistry::new();
        reg.update(1, 100, Some(true), None, None, Some("Alice"));

        let states = reg.list(1);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].audio, Some(true));
        assert_eq!(states[0].video, None);
        assert_eq!(states[0].display.as_deref(), Some("Alice"));

        reg.update(1, 100, None, Some(false), None, None);

        let states = reg.list(1);
        assert_eq!(states[0].audio, Some(true));
        assert_eq!(states[0].video, Some(false));
        assert_eq!(states[0].display.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_blank_display_is_ignored() {
        let reg = MediaStateRegistry::new();
        reg.update(1, 100, None, None, None, Some("Alice"));
        reg.update(1, 100, Some(false), None, None, Some("   "));
        let states = reg.list(1);
        assert_eq!(states[0].display.as_deref(), Some("Alice"));
        assert_eq!(states[0].audio, Some(false));
    }

    #[test]
    fn test_video_device_lost_flag() {
        let reg = MediaStateRegistry::new();
        reg.update(1, 100, None, Some(true), None, None);
        reg.update(1, 100, None, None, Some(true), None);
        let states = reg.list(1);
        assert_eq!(states[0].video, Some(true));
        assert_eq!(states[0].video_device_lost, Some(true));
    }

    #[test]
    fn test_remove_prunes_empty_bucket() {
        let reg = MediaStateRegistry::new();
        reg.update(1, 100, Some(true), None, None, None);
        reg.update(1, 200, Some(false), None, None, None);
        reg.remove(1, 100);
        assert_eq!(reg.list(1).len(), 1);
        reg.remove(1, 200);
        assert!(reg.list(1).is_empty());
        assert!(reg.meetings.read().unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_user_is_noop() {
        let reg = MediaStateRegistry::new();
        reg.remove(1, 100);
        reg.update(1, 100, Some(true), None, None, None);
        reg.remove(1, 999);
        assert_eq!(reg.list(1).len(), 1);
    }
}
