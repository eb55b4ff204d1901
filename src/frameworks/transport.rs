// WebSocket transport: moves text frames between the socket and the network adapter.

use crate::domain::Action;
use crate::interface_adapters::net::{InboundDecoder, NetError};
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{Instrument, debug, info, info_span, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
pub enum TransportError {
    Ws(tungstenite::Error),
    Net(NetError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Ws(e) => write!(f, "websocket: {e}"),
            TransportError::Net(e) => write!(f, "{e}"),
        }
    }
}

impl From<tungstenite::Error> for TransportError {
    fn from(e: tungstenite::Error) -> Self {
        TransportError::Ws(e)
    }
}

impl From<NetError> for TransportError {
    fn from(e: NetError) -> Self {
        TransportError::Net(e)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransportSettings {
    pub reconnect_delay: Duration,
    // None turns latency pings off.
    pub ping_interval: Option<Duration>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(1),
            ping_interval: Some(Duration::from_secs(5)),
        }
    }
}

// Why a connection's frame loop ended.
enum Exit {
    // The outbound sink was dropped: the client is shutting down.
    OutboundClosed,
    Disconnected,
}

/// Keeps a connection to `url` open until the client shuts down.
///
/// Every established connection is announced as `CONNECTION_RESTORED` and every
/// loss as `CONNECTION_LOST`. Queued requests wait in `outbound_rx` while offline.
/// While connected, answered pings are reported as `LATENCY_MEASURED`.
pub async fn run_transport(
    url: String,
    mut outbound_rx: mpsc::Receiver<String>,
    bus_tx: mpsc::Sender<Action>,
    settings: TransportSettings,
) {
    let mut decoder = InboundDecoder::new(bus_tx.clone());
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let span = info_span!("conn", %url, attempt);
        let exit = async {
            let socket = match connect_async(url.as_str()).await {
                Ok((socket, _response)) => socket,
                Err(e) => {
                    warn!(error = %e, "connect failed");
                    return None;
                }
            };
            info!("connected");
            if decoder.connection_restored().await.is_err() {
                return Some(Exit::OutboundClosed);
            }

            let exit = match pump(socket, &mut outbound_rx, &mut decoder, settings.ping_interval).await {
                Ok(exit) => exit,
                Err(TransportError::Net(NetError::BusClosed)) => Exit::OutboundClosed,
                Err(e) => {
                    warn!(error = %e, "connection failed");
                    Exit::Disconnected
                }
            };
            if let Exit::Disconnected = exit {
                info!(stats = ?decoder.stats(), "disconnected");
                if decoder.connection_lost().await.is_err() {
                    return Some(Exit::OutboundClosed);
                }
            }
            Some(exit)
        }
        .instrument(span)
        .await;

        if let Some(Exit::OutboundClosed) = exit {
            debug!("transport exiting");
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(settings.reconnect_delay) => {}
            _ = bus_tx.closed() => break,
        }
    }
}

async fn pump(
    socket: Socket,
    outbound_rx: &mut mpsc::Receiver<String>,
    decoder: &mut InboundDecoder,
    ping_interval: Option<Duration>,
) -> Result<Exit, TransportError> {
    let (mut write, mut read) = socket.split();
    let mut ping = ping_interval.map(|every| {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    // At most one ping in flight.
    let mut ping_sent: Option<Instant> = None;

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                let Some(text) = frame else {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(Exit::OutboundClosed);
                };
                write.send(Message::Text(text.into())).await?;
            }
            _ = next_ping(&mut ping) => {
                if ping_sent.is_none() {
                    ping_sent = Some(Instant::now());
                    write.send(Message::Ping(Default::default())).await?;
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => decoder.deliver(text.as_str()).await?,
                    Some(Ok(Message::Pong(_))) => {
                        if let Some(sent) = ping_sent.take() {
                            decoder.latency_measured(sent.elapsed()).await?;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(Exit::Disconnected),
                    // Server pings are answered by tungstenite; binary frames are not part of the protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        }
    }
}

async fn next_ping(ping: &mut Option<Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
