// Network adapter: outbound sink for client requests, inbound decoder for server facts.
// The socket itself lives in `frameworks::transport`; this module only sees text frames.

use crate::domain::ports::{ActionSink, SendError};
use crate::domain::{Action, ConnectionEvent, Origin};
use crate::interface_adapters::protocol::{self, DecodeError};
use crate::use_cases::pipeline::LogThrottle;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

#[derive(Debug)]
pub enum NetError {
    // The bus receiver is gone; nothing more can be delivered.
    BusClosed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::BusClosed => f.write_str("action bus closed"),
        }
    }
}

impl From<mpsc::error::SendError<Action>> for NetError {
    fn from(_: mpsc::error::SendError<Action>) -> Self {
        NetError::BusClosed
    }
}

/// Encodes client requests into the outbound frame queue drained by the transport.
///
/// `send` never blocks: a full queue drops the request.
#[derive(Clone)]
pub struct OutboundSink {
    tx: mpsc::Sender<String>,
}

impl OutboundSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl ActionSink for OutboundSink {
    fn send(&self, action: &Action) -> Result<(), SendError> {
        if !action.is_transmittable() {
            return Err(SendError::NotTransmittable(action.kind()));
        }
        if action.origin() != Origin::Client {
            return Err(SendError::NotClientOrigin(action.kind()));
        }

        let text = protocol::encode(action)?;
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboundStats {
    pub delivered: u64,
    pub dropped: u64,
}

/// Turns inbound text frames into bus actions, in receipt order.
pub struct InboundDecoder {
    bus_tx: mpsc::Sender<Action>,
    stats: InboundStats,
    drop_log: LogThrottle,
}

impl InboundDecoder {
    pub fn new(bus_tx: mpsc::Sender<Action>) -> Self {
        Self {
            bus_tx,
            stats: InboundStats::default(),
            drop_log: LogThrottle::default(),
        }
    }

    pub fn stats(&self) -> InboundStats {
        self.stats
    }

    /// Decodes one frame and forwards it. Bad frames are counted and dropped;
    /// only a closed bus is an error.
    pub async fn deliver(&mut self, text: &str) -> Result<(), NetError> {
        let action = match protocol::decode(text) {
            Ok(action) if action.origin() == Origin::Server => action,
            Ok(action) => {
                // Another client's intent must never be applied locally.
                self.drop_frame(&format!("{} is a client request", action.kind()));
                return Ok(());
            }
            Err(e) => {
                if let DecodeError::UnknownType(kind) = &e {
                    debug!(kind = %kind, "unknown action type");
                }
                self.drop_frame(&e.to_string());
                return Ok(());
            }
        };

        trace!(kind = action.kind(), "inbound action");
        self.bus_tx.send(action).await?;
        self.stats.delivered += 1;
        Ok(())
    }

    pub async fn connection_restored(&mut self) -> Result<(), NetError> {
        self.bus_tx.send(ConnectionEvent::Restored.into()).await?;
        Ok(())
    }

    pub async fn connection_lost(&mut self) -> Result<(), NetError> {
        self.bus_tx.send(ConnectionEvent::Lost.into()).await?;
        Ok(())
    }

    pub async fn latency_measured(&mut self, rtt: Duration) -> Result<(), NetError> {
        let rtt_ms = u64::try_from(rtt.as_millis()).unwrap_or(u64::MAX);
        self.bus_tx
            .send(ConnectionEvent::LatencyMeasured { rtt_ms }.into())
            .await?;
        Ok(())
    }

    fn drop_frame(&mut self, reason: &str) {
        self.stats.dropped += 1;
        if let Some(suppressed) = self.drop_log.ready() {
            warn!(
                dropped = self.stats.dropped,
                suppressed,
                reason,
                "dropping inbound frame"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bomb, BombAction};
    use pretty_assertions::assert_eq;

    fn set_requested() -> Action {
        BombAction::SetRequested {
            player_id: "p1".to_string(),
        }
        .into()
    }

    #[test]
    fn when_request_is_sent_then_encoded_frame_is_queued() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = OutboundSink::new(tx);

        sink.send(&set_requested()).expect("queued");

        let frame = rx.try_recv().expect("frame");
        assert_eq!(protocol::decode(&frame).ok(), Some(set_requested()));
    }

    #[test]
    fn when_client_local_or_server_action_is_sent_then_it_is_refused() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = OutboundSink::new(tx);

        assert!(matches!(
            sink.send(&BombAction::SetKeyPressed.into()),
            Err(SendError::NotTransmittable(_))
        ));
        assert!(matches!(
            sink.send(&BombAction::Set(Bomb::new("p1", "p1", 0.0, 0.0)).into()),
            Err(SendError::NotClientOrigin(_))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn when_outbound_queue_is_full_then_send_reports_full() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = OutboundSink::new(tx);

        sink.send(&set_requested()).expect("first fits");

        assert!(matches!(sink.send(&set_requested()), Err(SendError::Full)));
    }

    #[tokio::test]
    async fn when_frames_arrive_then_only_valid_server_facts_reach_the_bus() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut decoder = InboundDecoder::new(tx);

        let frames = [
            r#"{"type":"BOMB_SET","data":{"id":"p1","playerId":"p1","x":1,"y":1},"origin":"server"}"#,
            r#"{"type":"BOMB_SET_REQUESTED","data":{"playerId":"p2"},"origin":"client"}"#,
            r#"{"type":"BOMB_EXPLODED","data":{},"origin":"server"}"#,
            r#"not json"#,
            r#"{"type":"BOMB_DETONATED","data":{"id":"p1"},"origin":"server"}"#,
        ];
        for frame in frames {
            decoder.deliver(frame).await.expect("bus open");
        }

        assert_eq!(
            decoder.stats(),
            InboundStats {
                delivered: 2,
                dropped: 3
            }
        );
        assert_eq!(
            rx.recv().await,
            Some(Action::from(BombAction::Set(Bomb::new("p1", "p1", 1.0, 1.0))))
        );
        assert_eq!(
            rx.recv().await,
            Some(Action::from(BombAction::Detonated {
                id: "p1".to_string()
            }))
        );
    }

    #[tokio::test]
    async fn when_bus_is_closed_then_delivery_fails() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut decoder = InboundDecoder::new(tx);

        let result = decoder.connection_lost().await;

        assert!(matches!(result, Err(NetError::BusClosed)));
    }

    #[tokio::test]
    async fn when_latency_is_measured_then_event_carries_whole_milliseconds() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut decoder = InboundDecoder::new(tx);

        decoder
            .latency_measured(Duration::from_micros(42_900))
            .await
            .expect("bus open");

        assert_eq!(
            rx.recv().await,
            Some(Action::from(ConnectionEvent::LatencyMeasured { rtt_ms: 42 }))
        );
    }
}
