// Framework bootstrap for the headless arena client.

use crate::domain::ports::ActionSink;
use crate::domain::selectors::{
    bomb_list_selector, get_latency_ms, player_list_selector, shot_list_selector,
};
use crate::domain::{Action, Bomb, GameState, Player, PlayerAction, SessionAction};
use crate::frameworks::config::{self, LogFormat};
use crate::frameworks::transport::{TransportSettings, run_transport};
use crate::interface_adapters::net::OutboundSink;
use crate::use_cases::{
    Authority, DEFAULT_MAX_CASCADE, PipelineSettings, StateAccessor, Store, build_pipeline,
    bus_task,
};

use std::{io::Result, sync::Arc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{Notify, mpsc, watch};
use tracing_subscriber::EnvFilter;

// Loads `.env`, installs the log subscriber and routes panics through it.
fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = match config::log_format() {
        LogFormat::Json => subscriber.json().with_current_span(true).try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
    };
    if let Err(e) = installed {
        // Embedders may already own the global subscriber.
        tracing::debug!(error = %e, "log subscriber already installed");
    }

    std::panic::set_hook(Box::new(|info| {
        let thread = std::thread::current();
        tracing::error!(
            %info,
            thread = thread.name().unwrap_or("unnamed"),
            backtrace = %std::backtrace::Backtrace::capture(),
            "client panicked"
        );
    }));
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub settings: PipelineSettings,
    // No URL means no transport; only the local authority answers.
    pub server_url: Option<String>,
    pub player_id: String,
    pub player_name: String,
    pub max_cascade: usize,
    pub transport: TransportSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            settings: PipelineSettings::default(),
            server_url: None,
            player_id: "p1".to_string(),
            player_name: "Pilot".to_string(),
            max_cascade: DEFAULT_MAX_CASCADE,
            transport: TransportSettings::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            settings: config::pipeline_settings(),
            server_url: config::server_url(),
            player_id: config::player_id(),
            player_name: config::player_name(),
            max_cascade: config::max_cascade(),
            transport: config::transport_settings(),
        }
    }
}

/// Runs the client until `keys` is exhausted or ctrl-c, returning the final state.
///
/// Each line read from `keys` becomes one `KEY_DOWN`; the line `space` stands for
/// the space bar.
pub async fn run<R>(config: ClientConfig, keys: R) -> Result<GameState>
where
    R: AsyncBufRead + Unpin,
{
    // action_tx/rx: the bus. Keys, the transport and local bootstrap all feed it.
    let (action_tx, action_rx) = mpsc::channel::<Action>(config::ACTION_CHANNEL_CAPACITY);
    // outbound_tx/rx: encoded requests waiting for the socket.
    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(config::OUTBOUND_CHANNEL_CAPACITY);
    // state_tx: published after every reduced action.
    let (state_tx, state_rx) = watch::channel(GameState::new());

    let sink: Arc<dyn ActionSink> = Arc::new(OutboundSink::new(outbound_tx));
    let pipeline = build_pipeline(&config.settings, StateAccessor::new(state_rx.clone()), sink);
    tracing::debug!(stages = ?pipeline.stage_names(), "pipeline built");
    let store = Store::new(state_tx, pipeline, config.max_cascade);

    let shutdown = Arc::new(Notify::new());
    let bus = tokio::spawn(bus_task(store, action_rx, shutdown.clone()));
    tokio::spawn(log_state_changes(state_rx));

    match config.server_url.clone() {
        Some(url) => {
            tokio::spawn(run_transport(
                url,
                outbound_rx,
                action_tx.clone(),
                config.transport,
            ));
        }
        None => {
            if config.settings.authority == Authority::Remote {
                tracing::warn!("remote authority without ARENA_SERVER_URL; nothing will answer");
            }
            tokio::spawn(discard_outbound(outbound_rx));
        }
    }

    if config.settings.authority == Authority::Local {
        sign_in_locally(&config, &action_tx).await?;
    }

    let input = tokio::select! {
        result = forward_keys(keys, action_tx.clone()) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(())
        }
    };

    // The bus stops on every exit path, including a failed key reader.
    shutdown.notify_one();
    drop(action_tx);
    let state = bus.await.map_err(std::io::Error::other)?;
    tracing::info!(
        players = state.players.players.len(),
        bombs = state.bombs.bombs.len(),
        shots = state.shots.shots.len(),
        latency_ms = ?get_latency_ms(&state),
        "client stopped"
    );
    match input {
        Ok(()) => Ok(state),
        Err(e) => {
            tracing::error!(error = %e, "key input failed");
            Err(e)
        }
    }
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = ClientConfig::from_env();
    tracing::info!(
        server_url = ?config.server_url,
        authority = ?config.settings.authority,
        player_id = %config.player_id,
        "starting client"
    );

    run(config, BufReader::new(tokio::io::stdin()))
        .await
        .map(|_| ())
}

// Without a server the local authority plays its part of the handshake too.
async fn sign_in_locally(config: &ClientConfig, action_tx: &mpsc::Sender<Action>) -> Result<()> {
    let bootstrap: [Action; 2] = [
        SessionAction::SignedIn {
            player_id: config.player_id.clone(),
        }
        .into(),
        PlayerAction::Joined(Player::new(
            config.player_id.clone(),
            config.player_name.clone(),
            0.0,
            0.0,
        ))
        .into(),
    ];
    for action in bootstrap {
        action_tx
            .send(action)
            .await
            .map_err(|_| std::io::Error::other("action bus closed"))?;
    }
    Ok(())
}

async fn forward_keys<R>(keys: R, action_tx: mpsc::Sender<Action>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = keys.lines();
    while let Some(line) = lines.next_line().await? {
        let key = match line.trim() {
            "" => continue,
            "space" => " ",
            key => key,
        };
        if action_tx.send(Action::key_down(key)).await.is_err() {
            break;
        }
    }
    Ok(())
}

async fn discard_outbound(mut outbound_rx: mpsc::Receiver<String>) {
    while let Some(frame) = outbound_rx.recv().await {
        tracing::trace!(frame = %frame, "no server; request discarded");
    }
}

// Logs each entity list whenever it is rebuilt.
async fn log_state_changes(mut state_rx: watch::Receiver<GameState>) {
    let mut bombs = bomb_list_selector();
    let mut players = player_list_selector();
    let mut shots = shot_list_selector();
    let mut last_bombs: Option<Arc<[Bomb]>> = None;
    let mut last_latency = None;

    while state_rx.changed().await.is_ok() {
        let state = state_rx.borrow_and_update().clone();

        let list = bombs.select(&state);
        if !last_bombs.as_ref().is_some_and(|prev| Arc::ptr_eq(prev, &list)) {
            let ids: Vec<&str> = list.iter().map(|bomb| bomb.id.as_str()).collect();
            tracing::info!(count = list.len(), ?ids, "bombs changed");
            last_bombs = Some(list);
        }

        let latency = get_latency_ms(&state);
        if latency != last_latency {
            tracing::debug!(latency_ms = ?latency, "latency changed");
            last_latency = latency;
        }

        let (player_runs, shot_runs) = (players.recomputations(), shots.recomputations());
        let player_list = players.select(&state);
        let shot_list = shots.select(&state);
        if players.recomputations() != player_runs || shots.recomputations() != shot_runs {
            tracing::debug!(
                players = player_list.len(),
                shots = shot_list.len(),
                "arena changed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

    // A keyboard that fails on every read.
    struct BrokenInput;

    impl AsyncRead for BrokenInput {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<Result<()>> {
            Poll::Ready(Err(std::io::Error::other("keyboard gone")))
        }
    }

    #[tokio::test]
    async fn when_keys_are_read_then_blank_lines_are_skipped_and_space_is_mapped() {
        let (tx, mut rx) = mpsc::channel(8);

        forward_keys(&b"b\n\nspace\n  n  \n"[..], tx)
            .await
            .expect("reads");

        let mut keys = Vec::new();
        while let Some(Action::KeyDown { key }) = rx.recv().await {
            keys.push(key);
        }
        assert_eq!(keys, vec!["b", " ", "n"]);
    }

    #[tokio::test]
    async fn when_key_input_fails_then_run_shuts_down_and_returns_the_error() {
        let keys = BufReader::new((&b"b\n"[..]).chain(BrokenInput));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run(ClientConfig::default(), keys),
        )
        .await
        .expect("run stops after input failure");

        let err = result.expect_err("input error is reported");
        assert_eq!(err.to_string(), "keyboard gone");
    }
}
