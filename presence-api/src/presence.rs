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
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! PresenceRegistry - single source of truth for who is live in which
//! meeting, through which session.
//!
//! Every join is an authoritative takeover: the last browser tab to
//! (re)join owns the seat, and all later validation (heartbeat, transport
//! disconnect) is in terms of matching the current token or connection id.
//! That is what makes stale-signal suppression correct without any
//! versioning across operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use campusmeet_presence_types::{HeartbeatStatus, MeetingId, ParticipantRole, UserId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::metrics::{PRESENCE_SESSIONS, STALE_SIGNALS_TOTAL};

/// Opaque proof that a client's join is the most recent one for its
/// (meeting, user) pair. Regenerated on every join.
pub type SessionToken = String;

/// One user's live presence in one meeting.
#[derive(Debug, Clone)]
pub struct Session {
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub display_name: String,
    pub role: ParticipantRole,
    pub session_token: SessionToken,
    /// Refreshed by every accepted heartbeat; drives TTL eviction.
    pub last_seen_at: Instant,
    /// None until the transport layer binds its connection id.
    pub transport_connection_id: Option<String>,
}

#[derive(Default)]
struct MeetingRoster {
    sessions: Mutex<HashMap<UserId, Session>>,
}

/// Guard evaluated under the roster lock before a session is removed, so
/// each eviction path is atomic with respect to a concurrent rejoin.
enum EvictGuard<'a> {
    Unconditional,
    TokenMatches(&'a str),
    TransportMatches(&'a str),
}

/// In-memory registry of live sessions, keyed (meeting, user), with a
/// reverse index from transport connection id for O(1) disconnect handling.
///
/// Operations on different meetings never contend: the outer map is
/// read-locked for lookups and each meeting carries its own roster lock.
/// The reverse index is only ever mutated while the owning roster lock is
/// held, so it points at a live bound session or not at all.
pub struct PresenceRegistry {
    meetings: RwLock<HashMap<MeetingId, Arc<MeetingRoster>>>,
    transport_index: Mutex<HashMap<String, (MeetingId, UserId)>>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            meetings: RwLock::new(HashMap::new()),
            transport_index: Mutex::new(HashMap::new()),
        }
    }

    /// Create a fresh session for (meeting, user), replacing any prior one
    /// wholesale. Returns the new session token.
    ///
    /// A replaced session's transport binding is dropped from the reverse
    /// index, so a late disconnect from the old connection finds no entry
    /// and is silently ignored.
    pub fn join_or_replace(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        display_name: &str,
        role: ParticipantRole,
    ) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            meeting_id,
            user_id,
            display_name: display_name.to_string(),
            role,
            session_token: token.clone(),
            last_seen_at: Instant::now(),
            transport_connection_id: None,
        };

        {
            let meetings = self.meetings.read().unwrap();
            if let Some(roster) = meetings.get(&meeting_id) {
                self.insert_session(meeting_id, roster, session);
                return token;
            }
        }

        let mut meetings = self.meetings.write().unwrap();
        let roster = meetings
            .entry(meeting_id)
            .or_insert_with(|| Arc::new(MeetingRoster::default()))
            .clone();
        self.insert_session(meeting_id, &roster, session);
        token
    }

    fn insert_session(&self, meeting_id: MeetingId, roster: &MeetingRoster, session: Session) {
        let user_id = session.user_id;
        let mut sessions = roster.sessions.lock().unwrap();
        if let Some(prev) = sessions.insert(user_id, session) {
            if let Some(conn) = prev.transport_connection_id {
                self.transport_index.lock().unwrap().remove(&conn);
            }
            debug!(
                "session replaced: meeting={} user={}",
                meeting_id, user_id
            );
        } else {
            info!("session joined: meeting={} user={}", meeting_id, user_id);
        }
        PRESENCE_SESSIONS
            .with_label_values(&[&meeting_id.to_string()])
            .set(sessions.len() as f64);
    }

    /// Attach a transport connection id to the current session and index it
    /// for reverse lookup. No-op if no session exists or the id is blank.
    pub fn bind_transport(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        transport_connection_id: &str,
    ) {
        if transport_connection_id.is_empty() {
            return;
        }
        let meetings = self.meetings.read().unwrap();
        let Some(roster) = meetings.get(&meeting_id) else {
            return;
        };
        let mut sessions = roster.sessions.lock().unwrap();
        let Some(session) = sessions.get_mut(&user_id) else {
            debug!(
                "bind for unknown session: meeting={} user={}",
                meeting_id, user_id
            );
            return;
        };
        let mut index = self.transport_index.lock().unwrap();
        if let Some(prev) = session.transport_connection_id.take() {
            index.remove(&prev);
        }
        session.transport_connection_id = Some(transport_connection_id.to_string());
        index.insert(transport_connection_id.to_string(), (meeting_id, user_id));
        debug!(
            "transport bound: meeting={} user={} connection={}",
            meeting_id, user_id, transport_connection_id
        );
    }

    /// Refresh a session's liveness. A token that has since been superseded
    /// is rejected without touching the current session - the zombie tab is
    /// told to stop considering itself live and must not resurrect the seat.
    ///
    /// A heartbeat with no token is accepted whenever a session exists.
    pub fn heartbeat(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        client_token: Option<&str>,
    ) -> HeartbeatStatus {
        let meetings = self.meetings.read().unwrap();
        let Some(roster) = meetings.get(&meeting_id) else {
            return HeartbeatStatus::NotJoined;
        };
        let mut sessions = roster.sessions.lock().unwrap();
        let Some(session) = sessions.get_mut(&user_id) else {
            return HeartbeatStatus::NotJoined;
        };
        if let Some(token) = client_token {
            if token != session.session_token {
                STALE_SIGNALS_TOTAL.with_label_values(&["heartbeat"]).inc();
                debug!(
                    "rejecting heartbeat from superseded session: meeting={} user={}",
                    meeting_id, user_id
                );
                return HeartbeatStatus::SessionReplaced;
            }
        }
        session.last_seen_at = Instant::now();
        HeartbeatStatus::Active
    }

    /// Remove the session for (meeting, user). Idempotent; returns whether
    /// a session was actually removed so callers can decide to broadcast.
    pub fn leave(&self, meeting_id: MeetingId, user_id: UserId) -> bool {
        self.remove_session(meeting_id, user_id, EvictGuard::Unconditional)
            .is_some()
    }

    /// Remove the session only if it still holds `token`. Used by the
    /// sweeper so a session that was rejoined after the stale snapshot was
    /// taken is left untouched.
    pub fn leave_if_token_matches(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        token: &str,
    ) -> bool {
        self.remove_session(meeting_id, user_id, EvictGuard::TokenMatches(token))
            .is_some()
    }

    /// Remove the session only if it is still bound to
    /// `transport_connection_id`. Used by the disconnect reconciler so a
    /// delayed disconnect can never evict a newer legitimate session.
    pub fn leave_if_transport_matches(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        transport_connection_id: &str,
    ) -> bool {
        self.remove_session(
            meeting_id,
            user_id,
            EvictGuard::TransportMatches(transport_connection_id),
        )
        .is_some()
    }

    fn remove_session(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
        guard: EvictGuard<'_>,
    ) -> Option<Session> {
        let (removed, now_empty) = {
            let meetings = self.meetings.read().unwrap();
            let roster = meetings.get(&meeting_id)?;
            let mut sessions = roster.sessions.lock().unwrap();
            let matches = match (&guard, sessions.get(&user_id)) {
                (_, None) => false,
                (EvictGuard::Unconditional, Some(_)) => true,
                (EvictGuard::TokenMatches(token), Some(s)) => s.session_token == *token,
                (EvictGuard::TransportMatches(conn), Some(s)) => {
                    s.transport_connection_id.as_deref() == Some(*conn)
                }
            };
            if !matches {
                return None;
            }
            let session = sessions.remove(&user_id)?;
            if let Some(conn) = &session.transport_connection_id {
                self.transport_index.lock().unwrap().remove(conn);
            }
            PRESENCE_SESSIONS
                .with_label_values(&[&meeting_id.to_string()])
                .set(sessions.len() as f64);
            (session, sessions.is_empty())
        };
        if now_empty {
            self.prune_if_empty(meeting_id);
        }
        info!("session removed: meeting={} user={}", meeting_id, user_id);
        Some(removed)
    }

    /// Drop the per-meeting bucket once its last session is gone, bounding
    /// memory to active meetings. Re-checks emptiness under the write lock
    /// because a join may have landed since the caller released the roster.
    fn prune_if_empty(&self, meeting_id: MeetingId) {
        let mut meetings = self.meetings.write().unwrap();
        let empty = meetings
            .get(&meeting_id)
            .map(|roster| roster.sessions.lock().unwrap().is_empty())
            .unwrap_or(false);
        if empty {
            meetings.remove(&meeting_id);
            debug!("meeting pruned: meeting={}", meeting_id);
        }
    }

    /// O(1) reverse lookup from a transport connection id, used by the
    /// disconnect reconciler.
    pub fn find_by_transport_connection(
        &self,
        transport_connection_id: &str,
    ) -> Option<(MeetingId, UserId)> {
        self.transport_index
            .lock()
            .unwrap()
            .get(transport_connection_id)
            .copied()
    }

    /// Value snapshot of every session in a meeting. Callers iterating for
    /// broadcast never observe torn writes; mutation during iteration is
    /// invisible to the returned copies.
    pub fn list_sessions(&self, meeting_id: MeetingId) -> Vec<Session> {
        let meetings = self.meetings.read().unwrap();
        let Some(roster) = meetings.get(&meeting_id) else {
            return Vec::new();
        };
        let sessions = roster.sessions.lock().unwrap();
        sessions.values().cloned().collect()
    }

    /// Snapshot of one session, if present.
    pub fn get_session(&self, meeting_id: MeetingId, user_id: UserId) -> Option<Session> {
        let meetings = self.meetings.read().unwrap();
        let roster = meetings.get(&meeting_id)?;
        let sessions = roster.sessions.lock().unwrap();
        sessions.get(&user_id).cloned()
    }

    /// Resolve which user a session token belongs to within a meeting.
    pub fn find_user_by_session_token(
        &self,
        meeting_id: MeetingId,
        token: &str,
    ) -> Option<UserId> {
        let meetings = self.meetings.read().unwrap();
        let roster = meetings.get(&meeting_id)?;
        let sessions = roster.sessions.lock().unwrap();
        sessions
            .values()
            .find(|s| s.session_token == token)
            .map(|s| s.user_id)
    }

    /// The meetings currently holding at least one session. The sweeper
    /// iterates this instead of asking the meeting service, deliberately
    /// avoiding a dependency on it.
    pub fn meeting_ids(&self) -> Vec<MeetingId> {
        self.meetings.read().unwrap().keys().copied().collect()
    }

    /// Number of transport bindings currently indexed, for debugging and
    /// consistency checks.
    pub fn transport_binding_count(&self) -> usize {
        self.transport_index.lock().unwrap().len()
    }
}
