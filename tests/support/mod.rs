// Shared fakes for integration tests. Not every test binary uses every helper.
#![allow(dead_code)]

use arena_sync::domain::{Action, ActionSink, GameState, Player, PlayerAction, SendError, SessionAction};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

// Records every request handed to the network port.
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Action>>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Action> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

impl ActionSink for RecordingSink {
    fn send(&self, action: &Action) -> Result<(), SendError> {
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(action.clone());
        Ok(())
    }
}

// A state where `player_id` is signed in and has joined at (x, y).
pub fn signed_in_at(player_id: &str, x: f32, y: f32) -> GameState {
    GameState::new()
        .reduce(&Action::from(SessionAction::SignedIn {
            player_id: player_id.to_string(),
        }))
        .reduce(&PlayerAction::Joined(Player::new(player_id, "Pilot", x, y)).into())
}

// One-connection WebSocket server standing in for the game authority.
pub struct FakeServer {
    pub url: String,
    // Text frames the client sent.
    pub received: mpsc::Receiver<String>,
    // Frames to push to the client; dropping this closes the connection.
    pub replies: mpsc::Sender<String>,
}

pub async fn start_fake_server() -> FakeServer {
    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    let (received_tx, received_rx) = mpsc::channel::<String>(16);
    let (replies_tx, mut replies_rx) = mpsc::channel::<String>(16);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept client");
        let socket = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");
        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                reply = replies_rx.recv() => {
                    let Some(text) = reply else {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    };
                    write.send(Message::Text(text.into())).await.expect("send reply");
                }
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(text.as_str().to_string()).await;
                    }
                    Some(Ok(_)) => {}
                    _ => break,
                },
            }
        }
    });

    FakeServer {
        url: format!("ws://{addr}"),
        received: received_rx,
        replies: replies_tx,
    }
}

pub async fn recv<T>(rx: &mut mpsc::Receiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}
