//! HTTP and WebSocket routes served by the relay

use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::ServerConfig;
use crate::constants::WS_PATH;
use crate::core::relay::SharedRelay;
use crate::handlers::websocket::handle_ws_client;

/// All routes: `/ws` upgrade, `/health` check and `/stats` snapshot
pub fn routes(
    relay: SharedRelay,
    config: &ServerConfig,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let max_payload = config.max_payload;

    let ws_route = warp::path(WS_PATH)
        .and(warp::ws())
        .and(with_relay(relay.clone()))
        .map(move |ws: warp::ws::Ws, relay: SharedRelay| {
            ws.max_message_size(max_payload)
                .max_frame_size(max_payload)
                .on_upgrade(move |socket| handle_ws_client(socket, relay))
        });

    let health_route = warp::path("health").map(|| "OK");

    let stats_route = warp::path("stats")
        .and(with_relay(relay))
        .map(|relay: SharedRelay| match relay.stats() {
            Ok(stats) => warp::reply::with_status(warp::reply::json(&stats), StatusCode::OK),
            Err(e) => {
                log::error!("Failed to sample relay stats: {}", e);
                warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({ "error": e.to_string() })),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
            }
        });

    ws_route.or(health_route).or(stats_route)
}

// Helper function to include the relay in request handlers
fn with_relay(relay: SharedRelay) -> impl Filter<Extract = (SharedRelay,), Error = Infallible> + Clone {
    warp::any().map(move || relay.clone())
}
