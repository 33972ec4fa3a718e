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

//! Round-trips through the HTTP seam.

use std::sync::Arc;

use actix_web::{test, App};
use campusmeet_presence_types::requests::{
    HeartbeatRequest, JoinPresenceRequest, LeavePresenceRequest, MediaStateRequest,
};
use campusmeet_presence_types::responses::{
    HeartbeatResponse, JoinPresenceResponse, RosterResponse,
};
use campusmeet_presence_types::{HeartbeatStatus, ParticipantRole, PresenceEvent};
use presence_api::events::ChannelEventSink;
use presence_api::media_state::MediaStateRegistry;
use presence_api::presence::PresenceRegistry;
use presence_api::routes::PresenceService;

fn service() -> (
    PresenceService,
    tokio::sync::mpsc::UnboundedReceiver<PresenceEvent>,
) {
    let registry = Arc::new(PresenceRegistry::new());
    let media = Arc::new(MediaStateRegistry::new());
    let (sink, events) = ChannelEventSink::new();
    (
        PresenceService::new(registry, media, Arc::new(sink)),
        events,
    )
}

#[actix_web::test]
async fn test_join_heartbeat_and_roster() {
    let (service, _events) = service();
    let app =
        test::init_service(App::new().configure(|cfg| service.configure(cfg))).await;

    let join: JoinPresenceResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/join")
            .set_json(JoinPresenceRequest {
                user_id: 100,
                display_name: "Alice".to_string(),
                role: ParticipantRole::Host,
            })
            .to_request(),
    )
    .await;
    assert!(!join.session_token.is_empty());

    let heartbeat: HeartbeatResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/heartbeat")
            .set_json(HeartbeatRequest {
                user_id: 100,
                session_token: Some(join.session_token.clone()),
            })
            .to_request(),
    )
    .await;
    assert_eq!(heartbeat.status, HeartbeatStatus::Active);

    let media_resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/media")
            .set_json(MediaStateRequest {
                user_id: 100,
                audio: Some(true),
                video: None,
                video_device_lost: None,
                display: Some("Alice".to_string()),
            })
            .to_request(),
    )
    .await;
    assert!(media_resp.status().is_success());

    let roster: RosterResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/meeting/7/presence")
            .to_request(),
    )
    .await;
    assert_eq!(roster.meeting_id, 7);
    assert_eq!(roster.participants.len(), 1);
    assert_eq!(roster.participants[0].user_id, 100);
    assert_eq!(roster.participants[0].role, ParticipantRole::Host);
    assert_eq!(roster.media.len(), 1);
    assert_eq!(roster.media[0].audio, Some(true));
    assert_eq!(roster.media[0].video, None);
}

#[actix_web::test]
async fn test_stale_heartbeat_reports_session_replaced() {
    let (service, _events) = service();
    let app =
        test::init_service(App::new().configure(|cfg| service.configure(cfg))).await;

    let first: JoinPresenceResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/join")
            .set_json(JoinPresenceRequest {
                user_id: 100,
                display_name: "Alice".to_string(),
                role: ParticipantRole::Participant,
            })
            .to_request(),
    )
    .await;
    let _second: JoinPresenceResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/join")
            .set_json(JoinPresenceRequest {
                user_id: 100,
                display_name: "Alice".to_string(),
                role: ParticipantRole::Participant,
            })
            .to_request(),
    )
    .await;

    let heartbeat: HeartbeatResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/heartbeat")
            .set_json(HeartbeatRequest {
                user_id: 100,
                session_token: Some(first.session_token),
            })
            .to_request(),
    )
    .await;
    assert_eq!(heartbeat.status, HeartbeatStatus::SessionReplaced);
}

#[actix_web::test]
async fn test_leave_broadcasts_once_and_clears_roster() {
    let (service, mut events) = service();
    let app =
        test::init_service(App::new().configure(|cfg| service.configure(cfg))).await;

    let _join: JoinPresenceResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/join")
            .set_json(JoinPresenceRequest {
                user_id: 100,
                display_name: "Alice".to_string(),
                role: ParticipantRole::Participant,
            })
            .to_request(),
    )
    .await;

    for _ in 0..2 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/meeting/7/presence/leave")
                .set_json(LeavePresenceRequest { user_id: 100 })
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
    }

    assert_eq!(
        events.try_recv().unwrap(),
        PresenceEvent::Leave {
            meeting_id: 7,
            user_id: 100
        }
    );
    assert!(events.try_recv().is_err());

    let roster: RosterResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/meeting/7/presence")
            .to_request(),
    )
    .await;
    assert!(roster.participants.is_empty());
}

#[actix_web::test]
async fn test_malformed_body_is_rejected() {
    let (service, _events) = service();
    let app =
        test::init_service(App::new().configure(|cfg| service.configure(cfg))).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/join")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"user_id\":")
            .to_request(),
    )
    .await;
    assert!(resp.status().is_client_error());
}

#[actix_web::test]
async fn test_metrics_endpoint_exposes_presence_metrics() {
    let (service, _events) = service();
    let app =
        test::init_service(App::new().configure(|cfg| service.configure(cfg))).await;

    let _join: JoinPresenceResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri("/api/meeting/7/presence/join")
            .set_json(JoinPresenceRequest {
                user_id: 100,
                display_name: "Alice".to_string(),
                role: ParticipantRole::Participant,
            })
            .to_request(),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/metrics").to_request(),
    )
    .await;
    assert!(resp.status().is_success());
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("campusmeet_presence_sessions"));
}
