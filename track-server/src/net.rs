use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use warp::filters::BoxedFilter;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use crate::error::{ServerError, ServerResult};
use crate::registry::ConnectionId;
use crate::state::{ServerMessage, SharedState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct InputAxes {
    #[serde(default)]
    pub dx: Option<f32>, // steer
    #[serde(default)]
    pub dz: Option<f32>, // throttle
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Input { data: InputAxes },
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> ServerResult<Self> {
        Ok(serde_json::from_str(txt)?)
    }
}

/// Resolves `host:port` to the first matching socket address.
pub async fn resolve(addr: &str) -> ServerResult<SocketAddr> {
    tokio::net::lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| ServerError::Unresolved(addr.to_owned()))
}

/// WebSocket upgrades on any path; every other GET is looked up in
/// `static_dir`, when one is configured.
pub fn routes(
    state: SharedState,
    static_dir: Option<PathBuf>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static {
    let socket = warp::ws()
        .and(warp::addr::remote())
        .and(warp::any().map(move || Arc::clone(&state)))
        .map(|ws: Ws, peer: Option<SocketAddr>, state: SharedState| {
            ws.on_upgrade(move |socket| handle_connection(socket, peer, state))
        });

    let files: BoxedFilter<(warp::fs::File,)> = match static_dir {
        Some(dir) => {
            info!("Serving client files from {}", dir.display());
            warp::fs::dir(dir).boxed()
        }
        None => warp::any()
            .and_then(|| async { Err::<warp::fs::File, Rejection>(warp::reject::not_found()) })
            .boxed(),
    };

    socket.or(files).with(warp::log("track_server::http"))
}

/// Binds `addr` (port 0 picks a free one). Returns the bound address and the
/// future that serves it.
pub fn start_server(
    addr: SocketAddr,
    static_dir: Option<PathBuf>,
    state: SharedState,
) -> ServerResult<(SocketAddr, impl Future<Output = ()> + Send + 'static)> {
    let (bound, server) = warp::serve(routes(state, static_dir)).try_bind_ephemeral(addr)?;
    info!("WebSocket listening on ws://{}", bound);
    Ok((bound, server))
}

async fn handle_connection(socket: WebSocket, peer: Option<SocketAddr>, state: SharedState) {
    let peer = peer.map_or_else(|| "unknown peer".to_owned(), |addr| addr.to_string());
    let (mut write, mut read) = socket.split();

    // -------------------------------
    // 1) Outgoing channel + vehicle, under one lock so the welcome is first
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let conn = {
        let mut guard = state.lock().await;
        let (conn, vehicle_id, color) = guard.sim.on_connect();
        guard.clients.register(conn, tx.clone());
        match serde_json::to_string(&ServerMessage::welcome(vehicle_id, color)) {
            Ok(welcome) => {
                guard.clients.send_to(conn, &welcome);
            }
            Err(e) => error!("Failed to serialize welcome for {}: {}", conn, e),
        }
        info!("Client {} connected as {} ({})", peer, conn, vehicle_id);
        conn
    };

    // -------------------------------
    // 2) Send loop
    // -------------------------------
    let writer_state = Arc::clone(&state);
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = write.send(Message::text(msg)).await {
                error!("WebSocket error for {}: {}", conn, e);
                disconnect(&writer_state, conn).await;
                break;
            }
        }
    });

    // -------------------------------
    // 3) Receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                error!("WebSocket error for {}: {}", conn, e);
                break;
            }
        };
        if msg.is_close() {
            break;
        }
        // binary, ping, pong
        let Ok(text) = msg.to_str() else {
            continue;
        };

        match ClientMessage::from_json(text) {
            Ok(ClientMessage::Input { data }) => {
                let mut guard = state.lock().await;
                if let Err(e) = guard.sim.on_input(conn, data.dx, data.dz) {
                    debug!("Input ignored: {}", e);
                }
            }
            Ok(ClientMessage::Ping) => {
                if let Ok(pong) = serde_json::to_string(&ServerMessage::Pong) {
                    let _ = tx.send(pong);
                }
            }
            Err(e) => warn!("Failed to parse message from {}: {}", conn, e),
        }
    }

    info!("Client {} disconnected", conn);
    disconnect(&state, conn).await;
    writer.abort();
}

/// Close, read error and write error all land here; only the first call per
/// connection despawns and notifies.
pub async fn disconnect(state: &SharedState, conn: ConnectionId) -> Option<ServerMessage> {
    let mut guard = state.lock().await;
    guard.clients.unregister(conn);
    let removed = guard.sim.on_disconnect(conn)?;

    let msg = ServerMessage::removed(removed);
    match serde_json::to_string(&msg) {
        Ok(json) => {
            guard.clients.broadcast(&json);
        }
        Err(e) => error!("{}", ServerError::from(e)),
    }
    Some(msg)
}
