use axum::extract::ws::{Message, WebSocket};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use std::sync::Arc;
use tokio::{
    sync::{
        broadcast::error::RecvError,
        mpsc::{UnboundedReceiver, UnboundedSender},
    },
    task::{JoinError, JoinHandle},
};
use tracing::{debug, warn};

use crate::handlers::{AppState, ClientMessage, ServerMessage};

pub struct WebSockets {}

impl WebSockets {
    pub async fn new(ws: WebSocket, state: Arc<AppState>) {
        //Broadcast tx/rx
        let (sender, receiver) = ws.split();
        //Direct tx/rx
        let (ws_sender, ws_receiver) = tokio::sync::mpsc::unbounded_channel::<Message>();

        let sender_task = Self::spawn_sender_task(ws_receiver, sender);
        debug!("Websocket connection established");

        Self::send(&ws_sender, &state.snapshot().await);
        Self::monitor_websocket_connection(receiver, ws_sender, state).await;

        // Every sender clone is gone by now, so this drains and ends
        if let Err(e) = sender_task.await {
            warn!("Websocket sender task failed: {:?}", e);
        }
    }

    fn spawn_sender_task(
        mut ws_receiver: UnboundedReceiver<Message>,
        mut sender: SplitSink<WebSocket, Message>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(msg) = ws_receiver.recv().await {
                if let Err(error) = sender.send(msg).await {
                    debug!("Failed to send message: {:?}", error);
                    break;
                }
            }
        })
    }

    async fn monitor_websocket_connection(
        receiver: SplitStream<WebSocket>,
        ws_sender: UnboundedSender<Message>,
        state: Arc<AppState>,
    ) {
        //Sends match updates to this client
        let mut send_task = tokio::spawn(Self::forward_broadcasts(
            Arc::clone(&state),
            ws_sender.clone(),
        ));

        //Receives messages from the client and replies directly
        let mut recv_task = tokio::spawn(Self::receive_messages(receiver, ws_sender, state));

        let handle_task_completion =
            |task_name: &str, other_task: &mut JoinHandle<()>, result: Result<(), JoinError>| {
                if let Err(e) = result {
                    warn!("{task_name} task encountered an error: {:?}", e);
                }
                other_task.abort();
            };

        tokio::select! {
            result = (&mut send_task) => handle_task_completion("Send", &mut recv_task, result),
            result = (&mut recv_task) => handle_task_completion("Receive", &mut send_task, result),
        };
        debug!("Websocket connection closed");
    }

    async fn receive_messages(
        mut receiver: SplitStream<WebSocket>,
        ws_sender: UnboundedSender<Message>,
        state: Arc<AppState>,
    ) {
        while let Some(Ok(message)) = receiver.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Submit { path }) => Some(state.submit(&path).await),
                Ok(other) => match other.into_opponent_event() {
                    Some(event) => state.opponent_event(event).await,
                    None => None,
                },
                Err(error) => {
                    debug!("Failed to parse client message: {error}");
                    Some(ServerMessage::Error {
                        message: format!("unreadable message: {error}"),
                    })
                }
            };

            if let Some(reply) = reply {
                if !Self::send(&ws_sender, &reply) {
                    break;
                }
            }
        }
    }

    async fn forward_broadcasts(state: Arc<AppState>, ws_sender: UnboundedSender<Message>) {
        let (mut messages, mut timer) = state.subscribe();

        loop {
            let message = tokio::select! {
                message = messages.recv() => message,
                event = timer.recv() => event.map(ServerMessage::timer),
            };

            match message {
                Ok(message) => {
                    if !Self::send(&ws_sender, &message) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Client fell behind, skipped {} updates", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    fn send(ws_sender: &UnboundedSender<Message>, message: &ServerMessage) -> bool {
        ws_sender.send(Message::Text(message.to_json())).is_ok()
    }
}
