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

//! Presence server binary.
//!
//! Wires the registries to their collaborators: the HTTP seam for client
//! signals, the NATS fabric for leave broadcasts and transport disconnect
//! notifications, and the periodic stale-session sweeper.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer};
use futures::StreamExt;
use presence_api::events::NatsEventSink;
use presence_api::media_state::MediaStateRegistry;
use presence_api::presence::PresenceRegistry;
use presence_api::reconciler::TransportDisconnectReconciler;
use presence_api::routes::PresenceService;
use presence_api::sweeper::StaleSessionSweeper;
use presence_api::{PresenceConfig, PresenceEventSink};
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = PresenceConfig::from_env();
    info!("starting presence server on port {}", config.port);

    let nats = async_nats::connect(&config.nats_url).await?;
    info!("connected to NATS at {}", config.nats_url);

    let registry = Arc::new(PresenceRegistry::new());
    let media = Arc::new(MediaStateRegistry::new());
    let events: Arc<dyn PresenceEventSink> = Arc::new(NatsEventSink::new(
        nats.clone(),
        config.subject_prefix.clone(),
    ));

    StaleSessionSweeper::new(
        registry.clone(),
        media.clone(),
        events.clone(),
        config.sweeper,
    )
    .spawn();

    // the transport fabric reports closed connections by id; feed them to
    // the reconciler, which decides whether the signal still applies
    let reconciler =
        TransportDisconnectReconciler::new(registry.clone(), media.clone(), events.clone());
    let mut disconnects = nats.subscribe(config.disconnect_subject.clone()).await?;
    tokio::spawn(async move {
        while let Some(message) = disconnects.next().await {
            match std::str::from_utf8(&message.payload) {
                Ok(connection_id) => {
                    reconciler.handle_disconnect(connection_id.trim());
                }
                Err(e) => warn!("ignoring malformed disconnect notification: {}", e),
            }
        }
        warn!("transport disconnect subscription closed");
    });

    let service = PresenceService::new(registry, media, events);
    let port = config.port;
    HttpServer::new(move || {
        let cors = Cors::permissive();
        let service = service.clone();
        App::new()
            .wrap(cors)
            .configure(|cfg| service.configure(cfg))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;
    Ok(())
}
