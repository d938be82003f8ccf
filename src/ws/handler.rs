use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, Stream, StreamExt};

use crate::AppState;
use crate::ws::directory::{ConnectionDirectory, ConnectionHandle};

pub async fn websocket(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| serve_connection(socket, client_id, state.connections))
}

async fn serve_connection(socket: WebSocket, client_id: String, directory: ConnectionDirectory) {
    let (mut sink, stream) = socket.split();
    let (handle, mut outbox) = directory.add(&client_id).await;
    tracing::info!("WebSocket client {} connected", client_id);

    // 写任务：把通道里的消息写入 socket
    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    pump_frames(stream, &handle).await;

    directory.remove(&handle).await;
    drop(handle);
    if let Err(e) = writer.await {
        tracing::warn!("WebSocket writer for {} ended abnormally: {}", client_id, e);
    }
    tracing::info!("WebSocket client {} disconnected", client_id);
}

/// 读循环：只响应 "ping"，其他帧忽略
pub async fn pump_frames<S>(mut stream: S, handle: &ConnectionHandle)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if let Some(reply) = reply_to(text.as_str()) {
                    if !handle.send(Message::Text(reply.into())) {
                        tracing::warn!("Dropping pong to {}: outbox unavailable", handle.client_id);
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket client {} read error: {}", handle.client_id, e);
                break;
            }
        }
    }
}

fn reply_to(text: &str) -> Option<&'static str> {
    (text == "ping").then_some("pong")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn only_literal_ping_gets_a_reply() {
        assert_eq!(reply_to("ping"), Some("pong"));
        assert_eq!(reply_to("PING"), None);
        assert_eq!(reply_to(" ping"), None);
        assert_eq!(reply_to("hello"), None);
    }

    #[tokio::test]
    async fn ping_yields_exactly_one_pong() {
        let directory = ConnectionDirectory::new();
        let (handle, mut outbox) = directory.add("client-1").await;

        let frames = stream::iter(vec![
            Ok::<_, axum::Error>(Message::Text("hello".into())),
            Ok(Message::Text("ping".into())),
            Ok(Message::Binary(vec![1, 2, 3].into())),
        ]);
        pump_frames(frames, &handle).await;

        match outbox.try_recv() {
            Ok(Message::Text(t)) => assert_eq!(t.as_str(), "pong"),
            other => panic!("expected pong, got {:?}", other),
        }
        assert!(outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_frame_stops_reading() {
        let directory = ConnectionDirectory::new();
        let (handle, mut outbox) = directory.add("client-2").await;

        let frames = stream::iter(vec![
            Ok::<_, axum::Error>(Message::Close(None)),
            Ok(Message::Text("ping".into())),
        ]);
        pump_frames(frames, &handle).await;
        assert!(outbox.try_recv().is_err());
    }
}
