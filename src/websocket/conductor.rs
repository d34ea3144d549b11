use crate::websocket::hub::BusHub;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

/// `{"event": "joinBusRoom", "data": {"bus_id": N}}` is the only event
/// clients send; everything else inbound is ignored.
#[derive(Deserialize)]
struct ClientEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

fn parse_join_request(raw: &str) -> Option<i32> {
    let event: ClientEvent = serde_json::from_str(raw).ok()?;
    if event.event != "joinBusRoom" {
        return None;
    }
    event.data.get("bus_id")?.as_i64().map(|id| id as i32)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<BusHub>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: BusHub) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tracing::info!("WebSocket connected");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // The receive side owns the room membership: join on request, move on
    // re-join, leave on disconnect.
    let mut membership: Option<(i32, u64)> = None;
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                if let Some(bus_id) = parse_join_request(&text) {
                    if let Some((old_bus, old_conn)) = membership.take() {
                        hub.leave(old_bus, old_conn);
                    }
                    let conn_id = hub.join(bus_id, tx.clone());
                    membership = Some((bus_id, conn_id));
                    tracing::info!("Conductor joined room for bus {}", bus_id);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some((bus_id, conn_id)) = membership {
        hub.leave(bus_id, conn_id);
    }
    send_task.abort();

    tracing::info!("WebSocket disconnected");
}
