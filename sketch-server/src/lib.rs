use std::sync::Arc;
use warp::Filter;

use crate::coordinator::SessionHandle;
use crate::websocket::ConnectionManager;

pub mod config;
pub mod coordinator;
pub mod ticker;
pub mod websocket;

pub fn create_routes(
    connections: Arc<ConnectionManager>,
    session: SessionHandle,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connections_filter = warp::any().map({
        let connections = connections.clone();
        move || connections.clone()
    });

    let session_filter = warp::any().map({
        let session = session.clone();
        move || session.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connections_filter)
        .and(session_filter)
        .map(|ws: warp::ws::Ws, connections, session| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, connections, session))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .with(cors)
        .with(warp::log("sketch_server"))
}
