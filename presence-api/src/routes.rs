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

//! HTTP seam over the presence registries.
//!
//! Authorization happens upstream, before requests reach these handlers;
//! the registries themselves never fail, so every handler is total.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use campusmeet_presence_types::requests::{
    BindTransportRequest, HeartbeatRequest, JoinPresenceRequest, LeavePresenceRequest,
    MediaStateRequest,
};
use campusmeet_presence_types::responses::{
    HeartbeatResponse, JoinPresenceResponse, MediaStateInfo, ParticipantInfo, RosterResponse,
};
use campusmeet_presence_types::{MeetingId, PresenceEvent, UserId};
use tracing::info;

use crate::events::PresenceEventSink;
use crate::media_state::MediaStateRegistry;
use crate::metrics::{metrics_handler, PRESENCE_EVICTIONS_TOTAL};
use crate::presence::PresenceRegistry;

/// Shared handler state, one instance per server.
#[derive(Clone)]
pub struct PresenceService {
    pub registry: Arc<PresenceRegistry>,
    pub media: Arc<MediaStateRegistry>,
    pub events: Arc<dyn PresenceEventSink>,
}

impl PresenceService {
    pub fn new(
        registry: Arc<PresenceRegistry>,
        media: Arc<MediaStateRegistry>,
        events: Arc<dyn PresenceEventSink>,
    ) -> Self {
        Self {
            registry,
            media,
            events,
        }
    }

    /// Remove presence and media state for a user and broadcast the leave.
    /// Shared by the explicit-leave handler; sweep and disconnect evictions
    /// run their own copies with their own stale guards.
    pub fn leave_and_notify(&self, meeting_id: MeetingId, user_id: UserId) -> bool {
        if !self.registry.leave(meeting_id, user_id) {
            return false;
        }
        self.media.remove(meeting_id, user_id);
        PRESENCE_EVICTIONS_TOTAL.with_label_values(&["leave"]).inc();
        self.events.publish(PresenceEvent::Leave {
            meeting_id,
            user_id,
        });
        true
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.clone()))
            .service(
                web::resource("/api/meeting/{meeting_id}/presence/join")
                    .route(web::post().to(join)),
            )
            .service(
                web::resource("/api/meeting/{meeting_id}/presence/bind")
                    .route(web::post().to(bind)),
            )
            .service(
                web::resource("/api/meeting/{meeting_id}/presence/heartbeat")
                    .route(web::post().to(heartbeat)),
            )
            .service(
                web::resource("/api/meeting/{meeting_id}/presence/leave")
                    .route(web::post().to(leave)),
            )
            .service(
                web::resource("/api/meeting/{meeting_id}/presence/media")
                    .route(web::post().to(media)),
            )
            .service(
                web::resource("/api/meeting/{meeting_id}/presence").route(web::get().to(roster)),
            )
            .service(web::resource("/metrics").route(web::get().to(metrics_handler)));
    }
}

async fn join(
    path: web::Path<MeetingId>,
    body: web::Json<JoinPresenceRequest>,
    service: web::Data<PresenceService>,
) -> HttpResponse {
    let meeting_id = path.into_inner();
    info!(
        "join request: meeting={} user={} role={}",
        meeting_id, body.user_id, body.role
    );
    let session_token =
        service
            .registry
            .join_or_replace(meeting_id, body.user_id, &body.display_name, body.role);
    HttpResponse::Ok().json(JoinPresenceResponse { session_token })
}

async fn bind(
    path: web::Path<MeetingId>,
    body: web::Json<BindTransportRequest>,
    service: web::Data<PresenceService>,
) -> HttpResponse {
    let meeting_id = path.into_inner();
    service
        .registry
        .bind_transport(meeting_id, body.user_id, &body.transport_connection_id);
    HttpResponse::NoContent().finish()
}

async fn heartbeat(
    path: web::Path<MeetingId>,
    body: web::Json<HeartbeatRequest>,
    service: web::Data<PresenceService>,
) -> HttpResponse {
    let meeting_id = path.into_inner();
    let status = service
        .registry
        .heartbeat(meeting_id, body.user_id, body.session_token.as_deref());
    HttpResponse::Ok().json(HeartbeatResponse { status })
}

async fn leave(
    path: web::Path<MeetingId>,
    body: web::Json<LeavePresenceRequest>,
    service: web::Data<PresenceService>,
) -> HttpResponse {
    let meeting_id = path.into_inner();
    service.leave_and_notify(meeting_id, body.user_id);
    HttpResponse::NoContent().finish()
}

async fn media(
    path: web::Path<MeetingId>,
    body: web::Json<MediaStateRequest>,
    service: web::Data<PresenceService>,
) -> HttpResponse {
    let meeting_id = path.into_inner();
    service.media.update(
        meeting_id,
        body.user_id,
        body.audio,
        body.video,
        body.video_device_lost,
        body.display.as_deref(),
    );
    HttpResponse::NoContent().finish()
}

async fn roster(
    path: web::Path<MeetingId>,
    service: web::Data<PresenceService>,
) -> HttpResponse {
    let meeting_id = path.into_inner();
    let participants = service
        .registry
        .list_sessions(meeting_id)
        .into_iter()
        .map(|s| ParticipantInfo {
            user_id: s.user_id,
            display_name: s.display_name,
            role: s.role,
        })
        .collect();
    let media = service
        .media
        .list(meeting_id)
        .into_iter()
        .map(|m| MediaStateInfo {
            user_id: m.user_id,
            audio: m.audio,
            video: m.video,
            video_device_lost: m.video_device_lost,
            display: m.display,
        })
        .collect();
    HttpResponse::Ok().json(RosterResponse {
        meeting_id,
        participants,
        media,
    })
}
