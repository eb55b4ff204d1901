// Session and connection slices: who this client is and whether the transport is up.

use crate::domain::action::{Action, Origin, PlayerId, tags};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SignedIn { player_id: PlayerId },
    SignedOut,
}

impl SessionAction {
    pub fn origin(&self) -> Origin {
        Origin::Server
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SessionAction::SignedIn { .. } => tags::SIGNED_IN,
            SessionAction::SignedOut => tags::SIGNED_OUT,
        }
    }
}

/// Transport events surfaced onto the bus by the network adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Lost,
    Restored,
    // Round trip of the last answered ping.
    LatencyMeasured { rtt_ms: u64 },
}

impl ConnectionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionEvent::Lost => tags::CONNECTION_LOST,
            ConnectionEvent::Restored => tags::CONNECTION_RESTORED,
            ConnectionEvent::LatencyMeasured { .. } => tags::LATENCY_MEASURED,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionState {
    pub online: bool,
    // Number of times the transport dropped since start.
    pub lost_count: u64,
    // None until the first pong on the current connection.
    pub latency_ms: Option<u64>,
}

pub fn reduce(state: &SessionState, action: &Action) -> SessionState {
    match action {
        Action::Session(SessionAction::SignedIn { player_id }) => SessionState {
            current_player_id: Some(player_id.clone()),
        },
        Action::Session(SessionAction::SignedOut) => SessionState {
            current_player_id: None,
        },
        _ => state.clone(),
    }
}

pub fn reduce_connection(state: &ConnectionState, action: &Action) -> ConnectionState {
    match action {
        // Repeated loss notifications for the same outage count once.
        Action::Connection(ConnectionEvent::Lost) if state.online => ConnectionState {
            online: false,
            lost_count: state.lost_count + 1,
            latency_ms: None,
        },
        Action::Connection(ConnectionEvent::Restored) => ConnectionState {
            online: true,
            lost_count: state.lost_count,
            latency_ms: None,
        },
        Action::Connection(ConnectionEvent::LatencyMeasured { rtt_ms }) if state.online => {
            ConnectionState {
                latency_ms: Some(*rtt_ms),
                ..state.clone()
            }
        }
        _ => state.clone(),
    }
}
