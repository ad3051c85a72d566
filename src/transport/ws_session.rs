use crate::protocol::{decode_command, encode_message, ServerMessage};
use crate::runtime::Runtime;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

pub async fn handle_socket(socket: WebSocket, runtime: Runtime) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = runtime.subscribe();
    let initial = ServerMessage::State(Box::new(runtime.view().await));

    let send_task = tokio::spawn(async move {
        let mut pending = Some(initial);
        loop {
            let message = match pending.take() {
                Some(message) => message,
                None => match events.recv().await {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "socket fell behind, dropping frames");
                        continue;
                    }
                    Err(RecvError::Closed) => return,
                },
            };
            let Some(payload) = encode_message(&message) else { continue };
            if sender.send(Message::Text(payload)).await.is_err() {
                return;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => match decode_command(&text) {
                Some(command) => {
                    runtime.dispatch(command).await;
                }
                None => tracing::debug!(%text, "ignoring malformed command"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
}
